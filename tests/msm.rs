use rtcm3::observation::{Cell, MsmSatellite};
use rtcm3::prelude::*;
use rtcm3::signal::frequency;

const SPEED_OF_LIGHT: f64 = 299_792_458.0;
const RANGE_MS: f64 = SPEED_OF_LIGHT * 1.0E-3;

fn reference() -> Epoch {
    Epoch::from_time_of_week(2300, 345_600 * 1_000_000_000, TimeScale::GPST)
}

fn block(
    constellation: Constellation,
    variant: MsmVariant,
    epoch: Epoch,
    prn: u8,
    lock: u16,
) -> ObservationBlock {
    let rough_ms = 70.0 + 100.0 / 1024.0;
    let fine_ms = 512.0 * 2.0_f64.powi(-29);
    ObservationBlock {
        constellation,
        variant,
        station_id: 12,
        epoch,
        multiple_message: false,
        iods: 0,
        clock_steering: 0,
        external_clock: 0,
        smoothing: false,
        smoothing_interval: 0,
        satellites: vec![MsmSatellite {
            sv: SV::new(constellation, prn),
            rough_range_ms: Some(rough_ms),
            extended_info: variant.has_range_rate().then_some(0),
            rough_range_rate_m_s: variant.has_range_rate().then_some(-300.0),
            frequency_channel: None,
        }],
        signals: vec![SignalCode::new(1, 'C')],
        cells: vec![vec![Some(Cell {
            pseudorange_m: Some((rough_ms + fine_ms) * RANGE_MS),
            phase_range_m: Some((rough_ms - fine_ms) * RANGE_MS),
            lock_indicator: Some(lock),
            cnr_dbhz: Some(45.0),
            fine_range_rate_m_s: variant.has_range_rate().then_some(0.5),
            ..Default::default()
        })]],
    }
}

#[test]
fn rough_and_fine_ranges() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    let block = block(Constellation::GPS, MsmVariant::Msm7, reference(), 3, 50);
    let frame = codec
        .encode_one(&Message::new(1077, Record::Observation(block)))
        .unwrap();
    let (_, msg) = codec.decode_one(&frame).unwrap();
    let msg = msg.unwrap();
    let decoded = msg.record.as_observation().unwrap();

    assert_eq!(decoded.epoch, reference());
    assert_eq!(decoded.nsat(), 1);
    assert_eq!(decoded.ncell(), 1);

    let l1c = SignalCode::new(1, 'C');
    let cell = decoded.cell(SV::new(Constellation::GPS, 3), l1c).unwrap();
    let rough_m = (70.0 + 100.0 / 1024.0) * RANGE_MS;
    let fine_m = 512.0 * 2.0_f64.powi(-29) * RANGE_MS;
    assert!((cell.pseudorange_m.unwrap() - (rough_m + fine_m)).abs() < 1.0E-6);
    assert!((cell.phase_range_m.unwrap() - (rough_m - fine_m)).abs() < 1.0E-6);

    let f = frequency(Constellation::GPS, l1c, None).unwrap();
    let cycles = (rough_m - fine_m) * f / SPEED_OF_LIGHT;
    assert!((cell.phase_cycles.unwrap() - cycles).abs() < 1.0E-3);
    let doppler = -(-300.0 + 0.5) * f / SPEED_OF_LIGHT;
    assert!((cell.doppler_hz.unwrap() - doppler).abs() < 1.0E-6);
    assert_eq!(cell.cnr_dbhz, Some(45.0));
    assert_eq!(cell.lli, LliFlags::OK_OR_UNKNOWN);
}

#[test]
fn lock_time_reset_flags_loss_of_lock() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    let sv = SV::new(Constellation::GPS, 3);
    let l1c = SignalCode::new(1, 'C');

    for (k, (lock, expected)) in [
        (50, LliFlags::OK_OR_UNKNOWN),
        (2, LliFlags::LOCK_LOSS),
        (3, LliFlags::OK_OR_UNKNOWN),
    ]
    .into_iter()
    .enumerate()
    {
        let t = reference() + Duration::from_seconds(k as f64);
        let block = block(Constellation::GPS, MsmVariant::Msm7, t, 3, lock);
        let frame = codec
            .encode_one(&Message::new(1077, Record::Observation(block)))
            .unwrap();
        let (_, msg) = codec.decode_one(&frame).unwrap();
        let msg = msg.unwrap();
        let cell = msg.record.as_observation().unwrap().cell(sv, l1c).unwrap();
        assert_eq!(cell.lli, expected, "epoch #{}", k);
        assert_eq!(codec.lock_times().get(sv, l1c), Some(lock));
        assert_eq!(codec.reference(), t);
    }
}

#[test]
fn glonass_phase_requires_channel() {
    let mut codec = Codec::new(Config::default().with_reference(reference()));
    let block = block(Constellation::Glonass, MsmVariant::Msm4, reference(), 7, 5);
    let frame = codec
        .encode_one(&Message::new(1084, Record::Observation(block)))
        .unwrap();
    let (_, msg) = codec.decode_one(&frame).unwrap();
    let msg = msg.unwrap();
    let decoded = msg.record.as_observation().unwrap();
    assert_eq!(decoded.epoch, reference());
    let cell = decoded
        .cell(SV::new(Constellation::Glonass, 7), SignalCode::new(1, 'C'))
        .unwrap();
    assert!(cell.pseudorange_m.is_some());
    assert!(cell.phase_range_m.is_some());
    assert!(cell.phase_cycles.is_none());
}

#[test]
fn too_many_cells() {
    let codec = Codec::new(Config::default().with_reference(reference()));
    let mut block = block(Constellation::GPS, MsmVariant::Msm4, reference(), 1, 0);
    let template = block.satellites[0].clone();
    block.satellites = (1..=17)
        .map(|prn| MsmSatellite {
            sv: SV::new(Constellation::GPS, prn),
            ..template.clone()
        })
        .collect();
    block.signals = vec![
        SignalCode::new(1, 'C'),
        SignalCode::new(2, 'W'),
        SignalCode::new(2, 'L'),
        SignalCode::new(5, 'Q'),
    ];
    block.cells = vec![vec![None; 4]; 17];
    assert!(matches!(
        codec.encode_one(&Message::new(1074, Record::Observation(block))),
        Err(Error::TooManyCells(68))
    ));
}
