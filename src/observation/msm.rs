//! MSM1..MSM7 bit layouts
use super::{Cell, LliFlags, MsmSatellite, ObservationBlock};
use crate::{
    bits::{invalid_signed, BitReader, BitWriter},
    constants::{P2_10, P2_24, P2_29, P2_31, RANGE_MS},
    mask::{decode_mask, read_mask, write_mask},
    signal::{msm_signal, msm_slot},
    sv::{sv_from_svid, svid_from_sv},
    time::{glonass_dow_tod, resolve_glonass, resolve_tow, week_tow},
    Error,
};
use gnss_rs::prelude::Constellation;
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// MSM variant: selects which data blocks are transmitted
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MsmVariant {
    /// Compact pseudo ranges
    Msm1,
    /// Compact phase ranges
    Msm2,
    /// Compact pseudo and phase ranges
    Msm3,
    /// Full pseudo and phase ranges, CNR
    Msm4,
    /// MSM4 + range rates
    Msm5,
    /// Extended resolution MSM4
    Msm6,
    /// Extended resolution MSM5
    Msm7,
}

/// Data blocks present in one [MsmVariant]
struct Layout {
    /// Integer milliseconds in the rough range
    rough_integer: bool,
    /// Extended info and rough range rate
    range_rate: bool,
    /// Fine pseudo range (width, resolution [ms])
    pseudorange: Option<(u32, f64)>,
    /// Fine phase range (width, resolution [ms])
    phase: Option<(u32, f64)>,
    /// Lock time indicator width, half cycle indicator follows
    lock: Option<u32>,
    /// CNR (width, resolution [dB-Hz])
    cnr: Option<(u32, f64)>,
}

const LAYOUTS: [Layout; 7] = [
    Layout {
        rough_integer: false,
        range_rate: false,
        pseudorange: Some((15, P2_24)),
        phase: None,
        lock: None,
        cnr: None,
    },
    Layout {
        rough_integer: false,
        range_rate: false,
        pseudorange: None,
        phase: Some((22, P2_29)),
        lock: Some(4),
        cnr: None,
    },
    Layout {
        rough_integer: false,
        range_rate: false,
        pseudorange: Some((15, P2_24)),
        phase: Some((22, P2_29)),
        lock: Some(4),
        cnr: None,
    },
    Layout {
        rough_integer: true,
        range_rate: false,
        pseudorange: Some((15, P2_24)),
        phase: Some((22, P2_29)),
        lock: Some(4),
        cnr: Some((6, 1.0)),
    },
    Layout {
        rough_integer: true,
        range_rate: true,
        pseudorange: Some((15, P2_24)),
        phase: Some((22, P2_29)),
        lock: Some(4),
        cnr: Some((6, 1.0)),
    },
    Layout {
        rough_integer: true,
        range_rate: false,
        pseudorange: Some((20, P2_29)),
        phase: Some((24, P2_31)),
        lock: Some(10),
        cnr: Some((10, 0.0625)),
    },
    Layout {
        rough_integer: true,
        range_rate: true,
        pseudorange: Some((20, P2_29)),
        phase: Some((24, P2_31)),
        lock: Some(10),
        cnr: Some((10, 0.0625)),
    },
];

const ROUGH_RATE_WIDTH: u32 = 14;
const FINE_RATE_WIDTH: u32 = 15;
const FINE_RATE_SCALE: f64 = 1.0E-4;

/// Message type of MSM1, minus one
fn base_type(constellation: Constellation) -> Option<u16> {
    match constellation {
        Constellation::GPS => Some(1070),
        Constellation::Glonass => Some(1080),
        Constellation::Galileo => Some(1090),
        Constellation::QZSS => Some(1110),
        Constellation::BeiDou => Some(1120),
        Constellation::IRNSS => Some(1130),
        c if c.is_sbas() => Some(1100),
        _ => None,
    }
}

/// Time scale of the MSM epoch field (Glonass excepted)
fn timescale(constellation: Constellation) -> TimeScale {
    match constellation {
        Constellation::Galileo => TimeScale::GST,
        Constellation::BeiDou => TimeScale::BDT,
        _ => TimeScale::GPST,
    }
}

impl MsmVariant {
    /// Identifies the [Constellation] and [MsmVariant] of `msg_type`.
    pub fn from_message_type(msg_type: u16) -> Option<(Constellation, Self)> {
        let constellation = match msg_type {
            1071..=1077 => Constellation::GPS,
            1081..=1087 => Constellation::Glonass,
            1091..=1097 => Constellation::Galileo,
            1101..=1107 => Constellation::SBAS,
            1111..=1117 => Constellation::QZSS,
            1121..=1127 => Constellation::BeiDou,
            1131..=1137 => Constellation::IRNSS,
            _ => return None,
        };
        let variant = Self::from_number((msg_type % 10) as u8)?;
        Some((constellation, variant))
    }

    /// Builds a [MsmVariant] from its number (1..=7)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Msm1),
            2 => Some(Self::Msm2),
            3 => Some(Self::Msm3),
            4 => Some(Self::Msm4),
            5 => Some(Self::Msm5),
            6 => Some(Self::Msm6),
            7 => Some(Self::Msm7),
            _ => None,
        }
    }

    /// Variant number (1..=7)
    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    /// Message type of this variant, for given [Constellation]
    pub fn message_type(&self, constellation: Constellation) -> Option<u16> {
        base_type(constellation).map(|base| base + self.number() as u16)
    }

    fn layout(&self) -> &'static Layout {
        &LAYOUTS[*self as usize]
    }

    /// True if this variant transmits range rates
    pub fn has_range_rate(&self) -> bool {
        self.layout().range_rate
    }
}

fn decode_epoch(r: &mut BitReader, constellation: Constellation, reference: Epoch) -> Result<Epoch, Error> {
    if constellation == Constellation::Glonass {
        let dow = r.read_u8(3)?;
        let tod_ms = r.read_u32(27)?;
        Ok(resolve_glonass(reference, dow, tod_ms as f64 * 1.0E-3))
    } else {
        let tow_ms = r.read_u32(30)?;
        Ok(resolve_tow(reference, tow_ms as f64 * 1.0E-3, timescale(constellation)))
    }
}

fn encode_epoch(w: &mut BitWriter, constellation: Constellation, t: Epoch) -> Result<(), Error> {
    if constellation == Constellation::Glonass {
        let (dow, tod) = glonass_dow_tod(t);
        w.write_u64(3, dow as u64)?;
        w.write_u64(27, (tod * 1.0E3).round() as u64)
    } else {
        let (_, tow) = week_tow(t, timescale(constellation));
        w.write_u64(30, (tow * 1.0E3).round() as u64)
    }
}

/// Decodes an MSM body (following the message type).
/// Phases and Doppler are expressed in cycles and Hz later on,
/// once Glonass channels are resolved.
pub(crate) fn decode(
    r: &mut BitReader,
    constellation: Constellation,
    variant: MsmVariant,
    reference: Epoch,
) -> Result<ObservationBlock, Error> {
    let layout = variant.layout();
    let station_id = r.read_u16(12)?;
    let epoch = decode_epoch(r, constellation, reference)?;
    let multiple_message = r.read_bool()?;
    let iods = r.read_u8(3)?;
    r.skip(7)?;
    let clock_steering = r.read_u8(2)?;
    let external_clock = r.read_u8(2)?;
    let smoothing = r.read_bool()?;
    let smoothing_interval = r.read_u8(3)?;

    let svids = read_mask(r, 64, 1)?;
    let slots = read_mask(r, 32, 1)?;
    let (nsat, nsig) = (svids.len(), slots.len());
    if nsat * nsig > 64 {
        return Err(Error::TooManyCells(nsat * nsig));
    }

    let svs = svids
        .iter()
        .map(|svid| sv_from_svid(constellation, *svid as u8))
        .collect::<Result<Vec<_>, _>>()?;
    let signals = slots
        .iter()
        .map(|slot| msm_signal(constellation, *slot as u8))
        .collect::<Result<Vec<_>, _>>()?;

    // cell mask, then (sat, sig) positions in transmission order
    let mut present = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let bits = r.read_u64(nsig as u32)?;
        present.push(decode_mask(bits, nsig as u32, 0).0);
    }
    let positions: Vec<(usize, usize)> = present
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().map(move |j| (i, *j as usize)))
        .collect();
    let ncell = positions.len();

    // satellite data
    let mut rough_ms = vec![None; nsat];
    let mut extended_info = vec![None; nsat];
    let mut rough_rate = vec![None; nsat];
    if layout.rough_integer {
        for rough in rough_ms.iter_mut() {
            let ms = r.read_u8(8)?;
            if ms != 0xff {
                *rough = Some(ms as f64);
            }
        }
        if layout.range_rate {
            for info in extended_info.iter_mut() {
                *info = Some(r.read_u8(4)?);
            }
        }
        for rough in rough_ms.iter_mut() {
            let modulo = r.read_u16(10)? as f64 * P2_10;
            if let Some(ms) = rough {
                *ms += modulo;
            }
        }
        if layout.range_rate {
            for rate in rough_rate.iter_mut() {
                *rate = r.read_scaled_opt(ROUGH_RATE_WIDTH, 1.0)?;
            }
        }
    } else {
        for rough in rough_ms.iter_mut() {
            let modulo = r.read_u16(10)?;
            if modulo != 0x3ff {
                *rough = Some(modulo as f64 * P2_10);
            }
        }
    }

    // signal data
    let mut cells: Vec<Vec<Option<Cell>>> = vec![vec![None; nsig]; nsat];
    for (i, j) in positions.iter() {
        cells[*i][*j] = Some(Cell::default());
    }
    let mut fine_pr = vec![None; ncell];
    let mut fine_cp = vec![None; ncell];
    if let Some((width, scale)) = layout.pseudorange {
        for value in fine_pr.iter_mut() {
            *value = r.read_scaled_opt(width, scale * RANGE_MS)?;
        }
    }
    if let Some((width, scale)) = layout.phase {
        for value in fine_cp.iter_mut() {
            *value = r.read_scaled_opt(width, scale * RANGE_MS)?;
        }
    }
    let mut locks = vec![None; ncell];
    let mut halves = vec![false; ncell];
    if let Some(width) = layout.lock {
        for lock in locks.iter_mut() {
            *lock = Some(r.read_u16(width)?);
        }
        for half in halves.iter_mut() {
            *half = r.read_bool()?;
        }
    }
    let mut cnrs = vec![None; ncell];
    if let Some((width, scale)) = layout.cnr {
        for cnr in cnrs.iter_mut() {
            let raw = r.read_u16(width)?;
            if raw != 0 {
                *cnr = Some(raw as f64 * scale);
            }
        }
    }
    let mut fine_rates = vec![None; ncell];
    if layout.range_rate {
        for rate in fine_rates.iter_mut() {
            *rate = r.read_scaled_opt(FINE_RATE_WIDTH, FINE_RATE_SCALE)?;
        }
    }

    for (k, (i, j)) in positions.iter().enumerate() {
        let rough_m = rough_ms[*i].map(|ms| ms * RANGE_MS);
        if let Some(cell) = cells[*i][*j].as_mut() {
            cell.pseudorange_m = rough_m.and_then(|rough| fine_pr[k].map(|fine| rough + fine));
            cell.phase_range_m = rough_m.and_then(|rough| fine_cp[k].map(|fine| rough + fine));
            cell.lock_indicator = locks[k];
            cell.half_cycle = halves[k];
            cell.cnr_dbhz = cnrs[k];
            cell.fine_range_rate_m_s = fine_rates[k];
            cell.lli = LliFlags::OK_OR_UNKNOWN;
        }
    }

    let satellites = svs
        .into_iter()
        .enumerate()
        .map(|(i, sv)| MsmSatellite {
            sv,
            rough_range_ms: rough_ms[i],
            extended_info: extended_info[i],
            rough_range_rate_m_s: rough_rate[i],
            frequency_channel: match (constellation, extended_info[i]) {
                (Constellation::Glonass, Some(ex)) if ex <= 13 => Some(ex as i8 - 7),
                _ => None,
            },
        })
        .collect();

    Ok(ObservationBlock {
        constellation,
        variant,
        station_id,
        epoch,
        multiple_message,
        iods,
        clock_steering,
        external_clock,
        smoothing,
        smoothing_interval,
        satellites,
        signals,
        cells,
    })
}

/// Rough range as transmitted: integer milliseconds and 2^-10 ms modulo
#[derive(Debug, Copy, Clone, PartialEq)]
struct RoughRange {
    integer: u64,
    modulo: u64,
}

impl RoughRange {
    /// Rounds `ms` to the 2^-10 ms grid, carrying into the integer milliseconds.
    /// Without integer field, the rough range must lie within [0, 1[ ms.
    fn quantize(ms: f64, rough_integer: bool) -> Result<Self, Error> {
        let steps = (ms / P2_10).round();
        if !steps.is_finite() || steps < 0.0 {
            return Err(Error::FieldOverflow(10));
        }
        let steps = steps as u64;
        let (integer, modulo) = (steps >> 10, steps & 0x3ff);
        if rough_integer {
            if integer >= 0xff {
                return Err(Error::FieldOverflow(8));
            }
        } else if integer > 0 || modulo == 0x3ff {
            return Err(Error::FieldOverflow(10));
        }
        Ok(Self { integer, modulo })
    }

    /// Transmitted rough range [ms]
    fn ms(&self) -> f64 {
        self.integer as f64 + self.modulo as f64 * P2_10
    }
}

/// Fine field of `value` [m] relative to the `rough` range [m]
fn fine_raw(value: Option<f64>, rough: Option<f64>, width: u32, scale: f64) -> Result<i64, Error> {
    match (value, rough) {
        (Some(value), Some(rough)) => {
            let raw = ((value - rough) / (scale * RANGE_MS)).round();
            let max = (1i64 << (width - 1)) - 1;
            if !raw.is_finite() || raw.abs() > max as f64 {
                Err(Error::FieldOverflow(width))
            } else {
                Ok(raw as i64)
            }
        },
        _ => Ok(invalid_signed(width)),
    }
}

/// Encodes an MSM body (following the message type).
pub(crate) fn encode(block: &ObservationBlock, w: &mut BitWriter) -> Result<(), Error> {
    let layout = block.variant.layout();
    let (nsat, nsig) = (block.nsat(), block.nsig());
    if nsat * nsig > 64 {
        return Err(Error::TooManyCells(nsat * nsig));
    }
    if block.cells.len() != nsat || block.cells.iter().any(|row| row.len() != nsig) {
        return Err(Error::TooManyCells(block.cells.iter().map(|row| row.len()).sum()));
    }

    w.write_u64(12, block.station_id as u64)?;
    encode_epoch(w, block.constellation, block.epoch)?;
    w.write_bool(block.multiple_message)?;
    w.write_u64(3, block.iods as u64)?;
    w.skip(7);
    w.write_u64(2, block.clock_steering as u64)?;
    w.write_u64(2, block.external_clock as u64)?;
    w.write_bool(block.smoothing)?;
    w.write_u64(3, block.smoothing_interval as u64)?;

    let svids = block
        .satellites
        .iter()
        .map(|sat| svid_from_sv(sat.sv).map(|svid| svid as u32))
        .collect::<Result<Vec<_>, _>>()?;
    let slots = block
        .signals
        .iter()
        .map(|code| msm_slot(block.constellation, *code).map(|slot| slot as u32))
        .collect::<Result<Vec<_>, _>>()?;
    write_mask(w, &svids, 64, 1)?;
    write_mask(w, &slots, 32, 1)?;

    for row in block.cells.iter() {
        let present: Vec<u32> = row
            .iter()
            .enumerate()
            .filter_map(|(j, cell)| cell.as_ref().map(|_| j as u32))
            .collect();
        write_mask(w, &present, nsig as u32, 0)?;
    }

    let cells: Vec<(usize, &Cell)> = block
        .cells
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().filter_map(move |c| c.as_ref().map(|c| (i, c))))
        .collect();
    let rough = block
        .satellites
        .iter()
        .map(|sat| {
            sat.rough_range_ms
                .map(|ms| RoughRange::quantize(ms, layout.rough_integer))
                .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;
    // fine ranges are relative to the transmitted rough range
    let rough_m: Vec<Option<f64>> = rough
        .iter()
        .map(|rough| rough.map(|rough| rough.ms() * RANGE_MS))
        .collect();

    if layout.rough_integer {
        for rough in rough.iter() {
            w.write_u64(8, rough.map(|rough| rough.integer).unwrap_or(0xff))?;
        }
        if layout.range_rate {
            for sat in block.satellites.iter() {
                w.write_u64(4, sat.extended_info.unwrap_or(0) as u64)?;
            }
        }
        for rough in rough.iter() {
            w.write_u64(10, rough.map(|rough| rough.modulo).unwrap_or(0))?;
        }
        if layout.range_rate {
            for sat in block.satellites.iter() {
                w.write_scaled_opt(ROUGH_RATE_WIDTH, sat.rough_range_rate_m_s, 1.0)?;
            }
        }
    } else {
        for rough in rough.iter() {
            w.write_u64(10, rough.map(|rough| rough.modulo).unwrap_or(0x3ff))?;
        }
    }

    if let Some((width, scale)) = layout.pseudorange {
        for (i, cell) in cells.iter() {
            w.write_i64(width, fine_raw(cell.pseudorange_m, rough_m[*i], width, scale)?)?;
        }
    }
    if let Some((width, scale)) = layout.phase {
        for (i, cell) in cells.iter() {
            w.write_i64(width, fine_raw(cell.phase_range_m, rough_m[*i], width, scale)?)?;
        }
    }
    if let Some(width) = layout.lock {
        for (_, cell) in cells.iter() {
            w.write_u64(width, cell.lock_indicator.unwrap_or(0) as u64)?;
        }
        for (_, cell) in cells.iter() {
            w.write_bool(cell.half_cycle)?;
        }
    }
    if let Some((width, scale)) = layout.cnr {
        for (_, cell) in cells.iter() {
            match cell.cnr_dbhz {
                Some(cnr) => w.write_uscaled(width, cnr, scale)?,
                None => w.write_u64(width, 0)?,
            }
        }
    }
    if layout.range_rate {
        for (_, cell) in cells.iter() {
            w.write_scaled_opt(FINE_RATE_WIDTH, cell.fine_range_rate_m_s, FINE_RATE_SCALE)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::SignalCode;
    use crate::time::from_week_tow;
    use gnss_rs::prelude::SV;

    fn reference() -> Epoch {
        from_week_tow(2300, 345_600.0, TimeScale::GPST)
    }

    #[test]
    fn message_types() {
        for (msg_type, constellation, variant) in [
            (1074, Constellation::GPS, MsmVariant::Msm4),
            (1087, Constellation::Glonass, MsmVariant::Msm7),
            (1091, Constellation::Galileo, MsmVariant::Msm1),
            (1105, Constellation::SBAS, MsmVariant::Msm5),
            (1116, Constellation::QZSS, MsmVariant::Msm6),
            (1122, Constellation::BeiDou, MsmVariant::Msm2),
        ] {
            assert_eq!(
                MsmVariant::from_message_type(msg_type),
                Some((constellation, variant))
            );
            assert_eq!(variant.message_type(constellation), Some(msg_type));
        }
        assert_eq!(MsmVariant::from_message_type(1070), None);
        assert_eq!(MsmVariant::from_message_type(1078), None);
    }

    #[test]
    fn rough_and_fine_range() {
        // GPS MSM4, one satellite (PRN 3), one signal (1C)
        let mut w = BitWriter::new();
        w.write_u64(12, 0).unwrap();
        w.write_u64(30, 345_600_000).unwrap();
        w.write_u64(1, 0).unwrap();
        w.write_u64(3, 0).unwrap();
        w.skip(7);
        w.write_u64(8, 0).unwrap();
        w.write_u64(64, 1 << 61).unwrap();
        w.write_u64(32, 1 << 30).unwrap();
        w.write_u64(1, 1).unwrap();
        // rough range: 100 ms + 512/1024 ms
        w.write_u64(8, 100).unwrap();
        w.write_u64(10, 512).unwrap();
        // fine pseudo range, phase
        w.write_i64(15, 0).unwrap();
        w.write_i64(22, -(1 << 21)).unwrap();
        // lock, half cycle, cnr
        w.write_u64(4, 5).unwrap();
        w.write_u64(1, 0).unwrap();
        w.write_u64(6, 42).unwrap();
        let buf = w.into_bytes();

        let mut r = BitReader::new(&buf);
        let block = decode(&mut r, Constellation::GPS, MsmVariant::Msm4, reference()).unwrap();
        assert_eq!(block.nsat(), 1);
        assert_eq!(block.nsig(), 1);
        assert_eq!(block.satellites[0].sv, SV::new(Constellation::GPS, 3));
        assert_eq!(block.signals[0], SignalCode::new(1, 'C'));
        assert!((block.epoch - reference()).to_seconds().abs() < 1.0E-6);

        let cell = block.cell(SV::new(Constellation::GPS, 3), SignalCode::new(1, 'C')).unwrap();
        let expected = 100.0 * RANGE_MS + 512.0 * RANGE_MS * P2_10;
        assert!((cell.pseudorange_m.unwrap() - expected).abs() < 1.0E-6);
        assert!(cell.phase_range_m.is_none());
        assert_eq!(cell.lock_indicator, Some(5));
        assert_eq!(cell.cnr_dbhz, Some(42.0));

        let mut w = BitWriter::new();
        encode(&block, &mut w).unwrap();
        assert_eq!(w.into_bytes(), buf);
    }

    #[test]
    fn rough_range_not_available() {
        let block = ObservationBlock {
            constellation: Constellation::Galileo,
            variant: MsmVariant::Msm7,
            station_id: 12,
            epoch: reference(),
            multiple_message: true,
            iods: 0,
            clock_steering: 0,
            external_clock: 0,
            smoothing: false,
            smoothing_interval: 0,
            satellites: vec![
                MsmSatellite {
                    sv: SV::new(Constellation::Galileo, 1),
                    rough_range_ms: None,
                    extended_info: Some(0),
                    rough_range_rate_m_s: None,
                    frequency_channel: None,
                },
                MsmSatellite {
                    sv: SV::new(Constellation::Galileo, 30),
                    rough_range_ms: Some(80.5),
                    extended_info: Some(0),
                    rough_range_rate_m_s: Some(-120.0),
                    frequency_channel: None,
                },
            ],
            signals: vec![SignalCode::new(1, 'C'), SignalCode::new(5, 'Q')],
            cells: vec![
                vec![
                    Some(Cell {
                        pseudorange_m: Some(24_000_000.0),
                        lock_indicator: Some(100),
                        ..Default::default()
                    }),
                    None,
                ],
                vec![
                    Some(Cell {
                        pseudorange_m: Some(80.5 * RANGE_MS + 12.5),
                        phase_range_m: Some(80.5 * RANGE_MS - 3.25),
                        lock_indicator: Some(600),
                        half_cycle: true,
                        cnr_dbhz: Some(45.25),
                        fine_range_rate_m_s: Some(0.5),
                        ..Default::default()
                    }),
                    Some(Cell {
                        pseudorange_m: Some(80.5 * RANGE_MS + 14.0),
                        phase_range_m: None,
                        lock_indicator: Some(600),
                        cnr_dbhz: Some(40.0),
                        fine_range_rate_m_s: None,
                        ..Default::default()
                    }),
                ],
            ],
        };
        assert_eq!(block.ncell(), 3);

        let mut w = BitWriter::new();
        encode(&block, &mut w).unwrap();
        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        let decoded = decode(&mut r, Constellation::Galileo, MsmVariant::Msm7, reference()).unwrap();

        assert!((decoded.epoch - reference()).to_seconds().abs() < 1.0E-6);
        assert!(decoded.multiple_message);
        // rough range not available: every field of that satellite is lost
        let first = decoded.cells[0][0].as_ref().unwrap();
        assert!(first.pseudorange_m.is_none());
        assert!(decoded.cells[0][1].is_none());

        let cell = decoded.cells[1][0].as_ref().unwrap();
        assert!((cell.pseudorange_m.unwrap() - (80.5 * RANGE_MS + 12.5)).abs() < 1.0E-3);
        assert!((cell.phase_range_m.unwrap() - (80.5 * RANGE_MS - 3.25)).abs() < 1.0E-3);
        assert!(cell.half_cycle);
        assert_eq!(cell.cnr_dbhz, Some(45.25));
        assert_eq!(decoded.satellites[1].rough_range_rate_m_s, Some(-120.0));
        assert!((cell.fine_range_rate_m_s.unwrap() - 0.5).abs() < 1.0E-9);

        let cell = decoded.cells[1][1].as_ref().unwrap();
        assert!(cell.phase_range_m.is_none());
        assert!(cell.fine_range_rate_m_s.is_none());
    }

    #[test]
    fn glonass_channels_and_doppler() {
        let mut block = ObservationBlock {
            constellation: Constellation::Glonass,
            variant: MsmVariant::Msm5,
            station_id: 0,
            epoch: reference(),
            multiple_message: false,
            iods: 0,
            clock_steering: 0,
            external_clock: 0,
            smoothing: false,
            smoothing_interval: 0,
            satellites: vec![
                MsmSatellite {
                    sv: SV::new(Constellation::Glonass, 4),
                    rough_range_ms: Some(70.0),
                    extended_info: Some(6),
                    rough_range_rate_m_s: Some(100.0),
                    frequency_channel: None,
                },
                MsmSatellite {
                    sv: SV::new(Constellation::Glonass, 5),
                    rough_range_ms: Some(71.0),
                    extended_info: Some(15),
                    rough_range_rate_m_s: Some(100.0),
                    frequency_channel: None,
                },
            ],
            signals: vec![SignalCode::new(1, 'C')],
            cells: vec![
                vec![Some(Cell {
                    pseudorange_m: Some(70.0 * RANGE_MS),
                    phase_range_m: Some(70.0 * RANGE_MS),
                    lock_indicator: Some(1),
                    fine_range_rate_m_s: Some(0.0),
                    ..Default::default()
                })],
                vec![Some(Cell {
                    pseudorange_m: Some(71.0 * RANGE_MS),
                    phase_range_m: Some(71.0 * RANGE_MS),
                    lock_indicator: Some(1),
                    fine_range_rate_m_s: Some(0.0),
                    ..Default::default()
                })],
            ],
        };
        let mut w = BitWriter::new();
        encode(&block, &mut w).unwrap();
        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        block = decode(&mut r, Constellation::Glonass, MsmVariant::Msm5, reference()).unwrap();
        assert!((block.epoch - reference()).to_seconds().abs() < 1.0E-6);
        assert_eq!(block.satellites[0].frequency_channel, Some(-1));
        assert_eq!(block.satellites[1].frequency_channel, None);

        block.resolve_carriers(|_| None);
        let f = 1602.0E6 - 562.5E3;
        let cell = block.cells[0][0].as_ref().unwrap();
        assert!((cell.phase_cycles.unwrap() - 70.0 * RANGE_MS * f / crate::constants::SPEED_OF_LIGHT).abs() < 1.0E-3);
        assert!((cell.doppler_hz.unwrap() + 100.0 * f / crate::constants::SPEED_OF_LIGHT).abs() < 1.0E-6);
        assert!(block.cells[1][0].as_ref().unwrap().phase_cycles.is_none());

        block.resolve_carriers(|sv| if sv.prn == 5 { Some(3) } else { None });
        assert_eq!(block.satellites[1].frequency_channel, Some(3));
        assert!(block.cells[1][0].as_ref().unwrap().phase_cycles.is_some());
    }

    #[test]
    fn too_many_cells() {
        let mut w = BitWriter::new();
        w.write_u64(12, 0).unwrap();
        w.write_u64(30, 0).unwrap();
        w.write_u64(4, 0).unwrap();
        w.skip(7);
        w.write_u64(8, 0).unwrap();
        w.write_u64(64, 0xffff_0000_0000_0000).unwrap();
        w.write_u64(32, 0xf000_0010).unwrap();
        w.skip(64);
        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        assert!(matches!(
            decode(&mut r, Constellation::GPS, MsmVariant::Msm7, reference()),
            Err(Error::TooManyCells(80))
        ));
    }

    fn gps_block(variant: MsmVariant, rough_ms: Option<f64>, cell: Cell) -> ObservationBlock {
        let rate = variant.layout().range_rate;
        ObservationBlock {
            constellation: Constellation::GPS,
            variant,
            station_id: 0,
            epoch: reference(),
            multiple_message: false,
            iods: 0,
            clock_steering: 0,
            external_clock: 0,
            smoothing: false,
            smoothing_interval: 0,
            satellites: vec![MsmSatellite {
                sv: SV::new(Constellation::GPS, 3),
                rough_range_ms: rough_ms,
                extended_info: rate.then_some(0),
                rough_range_rate_m_s: None,
                frequency_channel: None,
            }],
            signals: vec![SignalCode::new(1, 'C')],
            cells: vec![vec![Some(cell)]],
        }
    }

    fn roundtrip(block: &ObservationBlock) -> ObservationBlock {
        let mut w = BitWriter::new();
        encode(block, &mut w).unwrap();
        let buf = w.into_bytes();
        decode(&mut BitReader::new(&buf), block.constellation, block.variant, reference()).unwrap()
    }

    #[test]
    fn off_grid_rough_range() {
        for (rough_ms, transmitted_ms) in [
            (70.0 + 100.4 * P2_10, 70.0 + 100.0 * P2_10),
            (70.0 + 100.6 * P2_10, 70.0 + 101.0 * P2_10),
            // carried into the integer milliseconds
            (70.0 + 1023.7 * P2_10, 71.0),
        ] {
            let pseudorange = rough_ms * RANGE_MS + 10.0;
            let phase = rough_ms * RANGE_MS - 5.0;
            let block = gps_block(
                MsmVariant::Msm4,
                Some(rough_ms),
                Cell {
                    pseudorange_m: Some(pseudorange),
                    phase_range_m: Some(phase),
                    lock_indicator: Some(3),
                    ..Default::default()
                },
            );
            let decoded = roundtrip(&block);
            let rough = decoded.satellites[0].rough_range_ms.unwrap();
            assert!((rough - transmitted_ms).abs() < 1.0E-12, "rough {}", rough_ms);
            let cell = decoded.cells[0][0].as_ref().unwrap();
            // within fine range resolution
            assert!((cell.pseudorange_m.unwrap() - pseudorange).abs() < 0.02);
            assert!((cell.phase_range_m.unwrap() - phase).abs() < 1.0E-3);
        }
    }

    #[test]
    fn rough_range_limits() {
        // 0xff integer milliseconds is reserved
        let mut w = BitWriter::new();
        let block = gps_block(MsmVariant::Msm4, Some(255.0), Cell::default());
        assert!(matches!(encode(&block, &mut w), Err(Error::FieldOverflow(8))));
        let block = gps_block(MsmVariant::Msm4, Some(254.0 + 1023.0 * P2_10), Cell::default());
        assert!(roundtrip(&block).satellites[0].rough_range_ms.is_some());

        // no integer milliseconds: [0, 1[ ms, 0x3ff being reserved
        for (rough_ms, valid) in [
            (0.0, true),
            (1022.0 * P2_10, true),
            (1023.0 * P2_10, false),
            (1.2, false),
        ] {
            let mut w = BitWriter::new();
            let block = gps_block(MsmVariant::Msm1, Some(rough_ms), Cell::default());
            let result = encode(&block, &mut w);
            if valid {
                assert!(result.is_ok(), "rough {}", rough_ms);
            } else {
                assert!(matches!(result, Err(Error::FieldOverflow(10))), "rough {}", rough_ms);
            }
        }
    }

    #[test]
    fn not_available_sentinels() {
        // header, satellite and signal masks, one cell
        const BODY: usize = 61 + 64 + 32 + 1;
        let missing = Cell {
            lock_indicator: Some(0),
            ..Default::default()
        };

        let block = gps_block(MsmVariant::Msm4, Some(70.5), missing.clone());
        let mut w = BitWriter::new();
        encode(&block, &mut w).unwrap();
        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        r.skip(BODY).unwrap();
        assert_eq!(r.read_u8(8).unwrap(), 70);
        assert_eq!(r.read_u16(10).unwrap(), 512);
        assert_eq!(r.read_i64(15).unwrap(), -(1 << 14));
        assert_eq!(r.read_i64(22).unwrap(), -(1 << 21));
        r.skip(4 + 1).unwrap();
        assert_eq!(r.read_u8(6).unwrap(), 0);

        let block = gps_block(MsmVariant::Msm4, None, missing.clone());
        let mut w = BitWriter::new();
        encode(&block, &mut w).unwrap();
        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        r.skip(BODY).unwrap();
        assert_eq!(r.read_u8(8).unwrap(), 0xff);

        for variant in [
            MsmVariant::Msm1,
            MsmVariant::Msm2,
            MsmVariant::Msm3,
            MsmVariant::Msm4,
            MsmVariant::Msm5,
            MsmVariant::Msm6,
            MsmVariant::Msm7,
        ] {
            for rough_ms in [None, Some(0.5)] {
                let decoded = roundtrip(&gps_block(variant, rough_ms, missing.clone()));
                assert_eq!(decoded.satellites[0].rough_range_ms, rough_ms, "{:?}", variant);
                let cell = decoded.cells[0][0].as_ref().unwrap();
                assert!(cell.pseudorange_m.is_none(), "{:?}", variant);
                assert!(cell.phase_range_m.is_none(), "{:?}", variant);
                assert!(cell.cnr_dbhz.is_none(), "{:?}", variant);
                assert!(cell.fine_range_rate_m_s.is_none(), "{:?}", variant);
            }
        }
    }

    #[test]
    fn fine_range_extremes() {
        for (variant, pr_width, pr_scale, cp_width, cp_scale) in [
            (MsmVariant::Msm3, 15, P2_24, 22, P2_29),
            (MsmVariant::Msm4, 15, P2_24, 22, P2_29),
            (MsmVariant::Msm7, 20, P2_29, 24, P2_31),
        ] {
            let rough_ms = if variant == MsmVariant::Msm3 { 0.5 } else { 70.5 };
            let rough_m = rough_ms * RANGE_MS;
            let pr_max = ((1i64 << (pr_width - 1)) - 1) as f64 * pr_scale * RANGE_MS;
            let cp_max = ((1i64 << (cp_width - 1)) - 1) as f64 * cp_scale * RANGE_MS;
            for sign in [1.0, -1.0] {
                let block = gps_block(
                    variant,
                    Some(rough_ms),
                    Cell {
                        pseudorange_m: Some(rough_m + sign * pr_max),
                        phase_range_m: Some(rough_m + sign * cp_max),
                        lock_indicator: Some(0),
                        ..Default::default()
                    },
                );
                let decoded = roundtrip(&block);
                let cell = decoded.cells[0][0].as_ref().unwrap();
                assert!((cell.pseudorange_m.unwrap() - (rough_m + sign * pr_max)).abs() < 1.0E-6);
                assert!((cell.phase_range_m.unwrap() - (rough_m + sign * cp_max)).abs() < 1.0E-6);
            }
            // one step beyond the fine range
            let block = gps_block(
                variant,
                Some(rough_ms),
                Cell {
                    pseudorange_m: Some(rough_m + pr_max + pr_scale * RANGE_MS),
                    lock_indicator: Some(0),
                    ..Default::default()
                },
            );
            let mut w = BitWriter::new();
            let result = encode(&block, &mut w);
            assert!(matches!(result, Err(Error::FieldOverflow(width)) if width == pr_width));
        }
    }
}
