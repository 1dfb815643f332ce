use rtcm3::ephemeris::GlonassEphemeris;
use rtcm3::prelude::*;

/// 1019 payload with PRN=5, IODE=10, week=512
fn gps_payload() -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_u64(12, 1019).unwrap();
    for (width, value) in [
        (6, 5),
        (10, 512),
        (4, 0),
        (2, 1),
        (14, -35),
        (8, 10),
        (16, 2700),
        (8, 0),
        (16, -12),
        (22, 123456),
        (10, 10),
        (16, -1520),
        (16, 12000),
        (32, -1_123_456_789),
        (16, -2000),
        (32, 54_000_000),
        (16, 3100),
        (32, 2_702_000_000),
        (16, 2700),
        (16, 22),
        (32, 987_654_321),
        (16, -7),
        (32, 650_000_000),
        (16, 8000),
        (32, -400_000_000),
        (24, -22000),
        (8, -11),
        (6, 0),
        (1, 0),
        (1, 0),
    ] {
        if value < 0 {
            w.write_i64(width, value).unwrap();
        } else {
            w.write_u64(width, value as u64).unwrap();
        }
    }
    w.into_bytes()
}

#[test]
fn gps_week_disambiguation() {
    let payload = gps_payload();
    assert_eq!(payload.len(), 61);
    let frame = encode_frame(&payload).unwrap();

    for (reference_week, expected_week) in [(2300, 2560), (1800, 1536), (3300, 3584)] {
        let reference = Epoch::from_time_of_week(reference_week, 0, TimeScale::GPST);
        let mut codec = Codec::new(Config::default().with_reference(reference));
        let (consumed, msg) = codec.decode_one(&frame).unwrap();
        assert_eq!(consumed, frame.len());

        let msg = msg.unwrap();
        assert_eq!(msg.kind(), MessageKind::Ephemeris(Constellation::GPS));
        let eph = msg.record.as_ephemeris().unwrap();
        assert_eq!(eph.sv(), SV::new(Constellation::GPS, 5));
        assert_eq!(eph.iode(), 10);
        match eph {
            Ephemeris::Gps(gps) => assert_eq!(gps.week, expected_week),
            eph => panic!("unexpected ephemeris {:?}", eph),
        }

        // ephemerides do not move the reference
        assert_eq!(codec.reference(), reference);

        // raw fields are re-quantized identically
        assert_eq!(codec.encode_one(&msg).unwrap(), frame);
    }
}

#[test]
fn glonass_channels_are_learned() {
    let reference = Epoch::from_time_of_week(2300, 300_000 * 1_000_000_000, TimeScale::GPST);
    let eph = GlonassEphemeris {
        sv: SV::new(Constellation::Glonass, 21),
        frequency_channel: 4,
        almanac_health: true,
        almanac_health_available: true,
        p1: 0,
        tk_s: 3600.0 * 2.0 + 30.0,
        bn_msb: false,
        p2: false,
        tb: 10,
        position_m: [10_000_000.0, -5_000_000.0, 21_000_000.0],
        velocity_m_s: [100.0, 2_500.0, -300.0],
        acceleration_m_s2: [0.0, 0.0, 0.0],
        p3: false,
        gamma_n: 0.0,
        p: 0,
        ln3: false,
        tau_n_s: 0.0,
        delta_tau_n_s: 0.0,
        en: 0,
        p4: false,
        ft: 2,
        nt: 100,
        m: 1,
        additional_data: false,
        na: 0,
        tau_c_s: 0.0,
        n4: 7,
        tau_gps_s: 0.0,
        ln5: false,
        toe: reference,
    };
    let mut codec = Codec::new(Config::default().with_reference(reference));
    let sv = eph.sv;
    assert_eq!(codec.frequency_channel(sv), None);

    let frame = codec
        .encode_one(&Message::new(1020, Record::Ephemeris(Ephemeris::Glonass(eph))))
        .unwrap();
    let (_, msg) = codec.decode_one(&frame).unwrap();
    let msg = msg.unwrap();
    assert_eq!(msg.record.as_ephemeris().unwrap().constellation(), Constellation::Glonass);
    assert_eq!(codec.frequency_channel(sv), Some(4));

    codec.reset();
    assert_eq!(codec.frequency_channel(sv), None);
}

#[test]
fn mismatched_message_type() {
    let reference = Epoch::from_time_of_week(2300, 0, TimeScale::GPST);
    let mut codec = Codec::new(Config::default().with_reference(reference));
    let (_, msg) = codec.decode_one(&encode_frame(&gps_payload()).unwrap()).unwrap();
    let mut msg = msg.unwrap();
    msg.message_type = 1044;
    assert!(matches!(
        codec.encode_one(&msg),
        Err(Error::RecordMismatch(1044))
    ));
}
