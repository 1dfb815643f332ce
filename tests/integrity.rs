use rtcm3::integrity::{
    AreaPoint, AreaShape, Degradation, QualityIndicator, ServiceArea, TestHeader, Validity,
    VisibilityMap,
};
use rtcm3::prelude::*;

fn reference() -> Epoch {
    Epoch::from_time_of_week(2310, 200_000 * 1_000_000_000, TimeScale::GPST)
}

fn area(epoch: Epoch, degradation: Option<Degradation>) -> ServiceArea {
    ServiceArea {
        epoch,
        iod: 1,
        provider_id: 44,
        area_id: 3,
        validity: Validity {
            period: 4,
            update_interval: 100,
        },
        continuation: false,
        sequence: 0,
        degradation,
        shape: AreaShape::Polygon(vec![(45.0, 5.0), (46.0, 5.0), (46.0, 6.5)]),
    }
}

fn roundtrip(codec: &mut Codec, msg_type: u16, update: IntegrityUpdate) -> Message {
    let frame = codec
        .encode_one(&Message::new(msg_type, Record::Integrity(update)))
        .unwrap();
    let (consumed, msg) = codec.decode_one(&frame).unwrap();
    assert_eq!(consumed, frame.len());
    msg.unwrap()
}

#[test]
fn service_areas_and_aliases() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    for (msg_type, extended, kind) in [
        (2007, false, IntegrityKind::PrimaryArea),
        (6, false, IntegrityKind::PrimaryArea),
        (2008, true, IntegrityKind::ExtendedArea),
    ] {
        let degradation = extended.then_some(Degradation {
            integrity_risk: 0,
            time_to_detect: 1,
            time: 2,
            spatial: 3,
        });
        let update = IntegrityUpdate {
            test: None,
            record: IntegrityRecord::ServiceArea(area(reference(), degradation)),
        };
        let msg = roundtrip(&mut codec, msg_type, update);
        let record = &msg.record.as_integrity().unwrap().record;
        assert_eq!(record.kind(), kind);
        assert_eq!(record.provider_id(), 44);
        assert!(codec.integrity().get(44, kind).is_some());
    }

    // primary area records can not be sent as extended areas
    let update = IntegrityUpdate {
        test: None,
        record: IntegrityRecord::ServiceArea(area(reference(), None)),
    };
    assert!(matches!(
        codec.encode_one(&Message::new(2008, Record::Integrity(update))),
        Err(Error::RecordMismatch(2008))
    ));
}

#[test]
fn stale_records_are_not_cached() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    let later = reference() + Duration::from_seconds(30.0);
    for (epoch, network_id) in [(later, 1), (reference(), 2)] {
        let update = IntegrityUpdate {
            test: None,
            record: IntegrityRecord::Quality(QualityIndicator {
                epoch,
                provider_id: 7,
                validity: Validity::default(),
                network_id,
                indicators: vec![(0, 1.5)],
            }),
        };
        let msg = roundtrip(&mut codec, 2051, update);
        // stale records are still returned
        assert_eq!(msg.record.epoch(), Some(epoch));
    }
    match codec.integrity().get(7, IntegrityKind::Quality) {
        Some(IntegrityRecord::Quality(quality)) => {
            assert_eq!(quality.epoch, later);
            assert_eq!(quality.network_id, 1);
        },
        record => panic!("unexpected record {:?}", record),
    }
    assert_eq!(codec.integrity().len(), 1);
}

#[test]
fn test_container() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    let map = VisibilityMap {
        epoch: reference(),
        continuation: false,
        sequence: 1,
        points: vec![(
            AreaPoint {
                latitude_deg: 35.0,
                longitude_deg: 139.0,
                height_m: 40,
            },
            vec![(0, 10), (90, 25), (300, 5)],
        )],
    };
    let update = IntegrityUpdate {
        test: Some(TestHeader {
            working_group: 1,
            subtype: 9,
            revision: 0,
        }),
        record: IntegrityRecord::VisibilityMap(map),
    };
    let msg = roundtrip(&mut codec, 54, update);
    assert_eq!(msg.kind(), MessageKind::IntegrityTest);
    let update = msg.record.as_integrity().unwrap();
    assert_eq!(update.test.map(|t| t.subtype), Some(9));
    match &update.record {
        IntegrityRecord::VisibilityMap(map) => {
            assert_eq!(map.points[0].1, vec![(0, 10), (90, 25), (300, 5)]);
            assert_eq!(map.points[0].0.height_m, 40);
        },
        record => panic!("unexpected record {:?}", record),
    }

    // unknown test subtype
    let payload = {
        let mut w = BitWriter::new();
        w.write_u64(12, 54).unwrap();
        w.write_u64(4, 1).unwrap();
        w.write_u64(8, 3).unwrap();
        w.write_u64(4, 0).unwrap();
        w.into_bytes()
    };
    let (_, msg) = codec.decode_one(&encode_frame(&payload).unwrap()).unwrap();
    assert!(matches!(msg, Err(Error::InvalidSubtype(3))));
}
