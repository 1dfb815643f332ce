//! Tracking signal codes and the compact slot numbering used by
//! MSM and SSR messages. MSM cell slots and SSR bias slots follow two
//! different numberings and must never be conflated.
use crate::{constants::SPEED_OF_LIGHT, Error};
use gnss_rs::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signal code: frequency band and tracking attribute, as in "1C" or "5Q".
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalCode {
    /// Frequency band number
    pub band: u8,
    /// Tracking mode / channel attribute
    pub attribute: char,
}

impl SignalCode {
    pub const fn new(band: u8, attribute: char) -> Self {
        Self { band, attribute }
    }
}

impl std::fmt::Display for SignalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.band, self.attribute)
    }
}

const fn s(band: u8, attribute: char) -> SignalCode {
    SignalCode::new(band, attribute)
}

type SlotTable = &'static [(u8, SignalCode)];

const MSM_GPS: SlotTable = &[
    (2, s(1, 'C')),
    (3, s(1, 'P')),
    (4, s(1, 'W')),
    (8, s(2, 'C')),
    (9, s(2, 'P')),
    (10, s(2, 'W')),
    (15, s(2, 'S')),
    (16, s(2, 'L')),
    (17, s(2, 'X')),
    (22, s(5, 'I')),
    (23, s(5, 'Q')),
    (24, s(5, 'X')),
    (30, s(1, 'S')),
    (31, s(1, 'L')),
    (32, s(1, 'X')),
];

const MSM_GLO: SlotTable = &[
    (2, s(1, 'C')),
    (3, s(1, 'P')),
    (8, s(2, 'C')),
    (9, s(2, 'P')),
    (10, s(4, 'A')),
    (11, s(4, 'B')),
    (12, s(4, 'X')),
    (13, s(6, 'A')),
    (14, s(6, 'X')),
    (15, s(3, 'I')),
    (16, s(3, 'Q')),
    (17, s(3, 'X')),
];

const MSM_GAL: SlotTable = &[
    (2, s(1, 'C')),
    (3, s(1, 'A')),
    (4, s(1, 'B')),
    (5, s(1, 'X')),
    (6, s(1, 'Z')),
    (8, s(6, 'C')),
    (9, s(6, 'A')),
    (10, s(6, 'B')),
    (11, s(6, 'X')),
    (12, s(6, 'Z')),
    (14, s(7, 'I')),
    (15, s(7, 'Q')),
    (16, s(7, 'X')),
    (18, s(8, 'I')),
    (19, s(8, 'Q')),
    (20, s(8, 'X')),
    (22, s(5, 'I')),
    (23, s(5, 'Q')),
    (24, s(5, 'X')),
];

const MSM_BDS: SlotTable = &[
    (2, s(2, 'I')),
    (3, s(2, 'Q')),
    (4, s(2, 'X')),
    (8, s(6, 'I')),
    (9, s(6, 'Q')),
    (10, s(6, 'X')),
    (14, s(7, 'I')),
    (15, s(7, 'Q')),
    (16, s(7, 'X')),
    (22, s(5, 'D')),
    (23, s(5, 'P')),
    (24, s(5, 'X')),
    (25, s(7, 'D')),
    (30, s(1, 'D')),
    (31, s(1, 'P')),
    (32, s(1, 'X')),
];

const MSM_QZS: SlotTable = &[
    (2, s(1, 'C')),
    (3, s(1, 'E')),
    (9, s(6, 'S')),
    (10, s(6, 'L')),
    (11, s(6, 'X')),
    (15, s(2, 'S')),
    (16, s(2, 'L')),
    (17, s(2, 'X')),
    (22, s(5, 'I')),
    (23, s(5, 'Q')),
    (24, s(5, 'X')),
    (30, s(1, 'S')),
    (31, s(1, 'L')),
    (32, s(1, 'X')),
];

const MSM_SBS: SlotTable = &[
    (2, s(1, 'C')),
    (22, s(5, 'I')),
    (23, s(5, 'Q')),
    (24, s(5, 'X')),
];

const MSM_IRN: SlotTable = &[(8, s(9, 'A')), (22, s(5, 'A'))];

const SSR_GPS: SlotTable = &[
    (0, s(1, 'C')),
    (1, s(1, 'P')),
    (2, s(1, 'W')),
    (5, s(2, 'C')),
    (6, s(2, 'D')),
    (7, s(2, 'S')),
    (8, s(2, 'L')),
    (9, s(2, 'X')),
    (10, s(2, 'P')),
    (11, s(2, 'W')),
    (14, s(5, 'I')),
    (15, s(5, 'Q')),
    (16, s(5, 'X')),
    (17, s(1, 'S')),
    (18, s(1, 'L')),
    (19, s(1, 'X')),
];

const SSR_GLO: SlotTable = &[
    (0, s(1, 'C')),
    (1, s(1, 'P')),
    (2, s(2, 'C')),
    (3, s(2, 'P')),
    (4, s(4, 'A')),
    (5, s(4, 'B')),
    (6, s(6, 'A')),
    (7, s(6, 'B')),
    (10, s(3, 'I')),
    (11, s(3, 'Q')),
];

const SSR_GAL: SlotTable = &[
    (0, s(1, 'A')),
    (1, s(1, 'B')),
    (2, s(1, 'C')),
    (3, s(1, 'X')),
    (4, s(1, 'Z')),
    (5, s(5, 'I')),
    (6, s(5, 'Q')),
    (7, s(5, 'X')),
    (8, s(7, 'I')),
    (9, s(7, 'Q')),
    (10, s(7, 'X')),
    (11, s(8, 'I')),
    (12, s(8, 'Q')),
    (13, s(8, 'X')),
    (14, s(6, 'A')),
    (15, s(6, 'B')),
    (16, s(6, 'C')),
    (17, s(6, 'X')),
    (18, s(6, 'Z')),
];

const SSR_BDS: SlotTable = &[
    (0, s(2, 'I')),
    (1, s(2, 'Q')),
    (2, s(2, 'X')),
    (3, s(6, 'I')),
    (4, s(6, 'Q')),
    (5, s(6, 'X')),
    (6, s(7, 'I')),
    (7, s(7, 'Q')),
    (8, s(7, 'X')),
    (9, s(1, 'D')),
    (10, s(1, 'P')),
    (11, s(1, 'X')),
    (12, s(5, 'D')),
    (13, s(5, 'P')),
    (14, s(5, 'X')),
    (15, s(1, 'A')),
];

const SSR_QZS: SlotTable = &[
    (0, s(1, 'C')),
    (1, s(1, 'S')),
    (2, s(1, 'L')),
    (3, s(2, 'S')),
    (4, s(2, 'L')),
    (5, s(2, 'X')),
    (6, s(5, 'I')),
    (7, s(5, 'Q')),
    (8, s(5, 'X')),
    (9, s(6, 'S')),
    (10, s(6, 'L')),
    (11, s(6, 'X')),
    (12, s(1, 'X')),
    (17, s(6, 'E')),
    (19, s(1, 'E')),
];

const SSR_SBS: SlotTable = &[
    (0, s(1, 'C')),
    (1, s(5, 'I')),
    (2, s(5, 'Q')),
    (3, s(5, 'X')),
];

fn msm_table(constellation: Constellation) -> Option<SlotTable> {
    match constellation {
        Constellation::GPS => Some(MSM_GPS),
        Constellation::Glonass => Some(MSM_GLO),
        Constellation::Galileo => Some(MSM_GAL),
        Constellation::BeiDou => Some(MSM_BDS),
        Constellation::QZSS => Some(MSM_QZS),
        Constellation::IRNSS => Some(MSM_IRN),
        c if c.is_sbas() => Some(MSM_SBS),
        _ => None,
    }
}

fn ssr_table(constellation: Constellation) -> Option<SlotTable> {
    match constellation {
        Constellation::GPS => Some(SSR_GPS),
        Constellation::Glonass => Some(SSR_GLO),
        Constellation::Galileo => Some(SSR_GAL),
        Constellation::BeiDou => Some(SSR_BDS),
        Constellation::QZSS => Some(SSR_QZS),
        c if c.is_sbas() => Some(SSR_SBS),
        _ => None,
    }
}

fn lookup(table: Option<SlotTable>, slot: u8) -> Result<SignalCode, Error> {
    table
        .and_then(|t| t.iter().find(|(k, _)| *k == slot))
        .map(|(_, code)| *code)
        .ok_or(Error::InvalidSignalCode)
}

fn reverse(table: Option<SlotTable>, code: SignalCode) -> Result<u8, Error> {
    table
        .and_then(|t| t.iter().find(|(_, c)| *c == code))
        .map(|(k, _)| *k)
        .ok_or(Error::InvalidSignalCode)
}

/// [SignalCode] of MSM signal mask slot `slot` (1..=32).
pub fn msm_signal(constellation: Constellation, slot: u8) -> Result<SignalCode, Error> {
    lookup(msm_table(constellation), slot)
}

/// MSM signal mask slot of [SignalCode].
pub fn msm_slot(constellation: Constellation, code: SignalCode) -> Result<u8, Error> {
    reverse(msm_table(constellation), code)
}

/// [SignalCode] of SSR bias slot `slot` (0..=31).
pub fn ssr_signal(constellation: Constellation, slot: u8) -> Result<SignalCode, Error> {
    lookup(ssr_table(constellation), slot)
}

/// SSR bias slot of [SignalCode].
pub fn ssr_slot(constellation: Constellation, code: SignalCode) -> Result<u8, Error> {
    reverse(ssr_table(constellation), code)
}

/// Number of SSR signal slots defined for this [Constellation].
pub fn ssr_table_len(constellation: Constellation) -> usize {
    ssr_table(constellation).map(|t| t.len()).unwrap_or(0)
}

/// Carrier frequency [Hz] of `code`. Glonass FDMA bands require
/// the frequency channel number `fcn`.
pub fn frequency(constellation: Constellation, code: SignalCode, fcn: Option<i8>) -> Option<f64> {
    match constellation {
        Constellation::GPS | Constellation::QZSS => match code.band {
            1 => Some(1575.42E6),
            2 => Some(1227.60E6),
            5 => Some(1176.45E6),
            6 if constellation == Constellation::QZSS => Some(1278.75E6),
            _ => None,
        },
        Constellation::Glonass => match code.band {
            1 => fcn.map(|k| 1602.0E6 + k as f64 * 562.5E3),
            2 => fcn.map(|k| 1246.0E6 + k as f64 * 437.5E3),
            3 => Some(1202.025E6),
            4 => Some(1600.995E6),
            6 => Some(1248.06E6),
            _ => None,
        },
        Constellation::Galileo => match code.band {
            1 => Some(1575.42E6),
            5 => Some(1176.45E6),
            6 => Some(1278.75E6),
            7 => Some(1207.14E6),
            8 => Some(1191.795E6),
            _ => None,
        },
        Constellation::BeiDou => match code.band {
            1 => Some(1575.42E6),
            2 => Some(1561.098E6),
            5 => Some(1176.45E6),
            6 => Some(1268.52E6),
            7 => Some(1207.14E6),
            8 => Some(1191.795E6),
            _ => None,
        },
        Constellation::IRNSS => match code.band {
            5 => Some(1176.45E6),
            9 => Some(2492.028E6),
            _ => None,
        },
        c if c.is_sbas() => match code.band {
            1 => Some(1575.42E6),
            5 => Some(1176.45E6),
            _ => None,
        },
        _ => None,
    }
}

/// Carrier wavelength [m] of `code`.
pub fn wavelength(constellation: Constellation, code: SignalCode, fcn: Option<i8>) -> Option<f64> {
    frequency(constellation, code, fcn).map(|f| SPEED_OF_LIGHT / f)
}
