//! Record: Message content
use crate::{
    ephemeris::Ephemeris, integrity::IntegrityUpdate, observation::ObservationBlock,
    ssr::CorrectionUpdate, station::StationRecord,
};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Record {
    /// Broadcast [Ephemeris]
    Ephemeris(Ephemeris),
    /// MSM [ObservationBlock]
    Observation(ObservationBlock),
    /// SSR [CorrectionUpdate]
    Correction(CorrectionUpdate),
    /// [IntegrityUpdate]
    Integrity(IntegrityUpdate),
    /// Station and auxiliary information
    Station(StationRecord),
    /// Undecoded payload, starting with the message type
    Unhandled(Vec<u8>),
}

impl From<Ephemeris> for Record {
    fn from(eph: Ephemeris) -> Self {
        Self::Ephemeris(eph)
    }
}

impl From<ObservationBlock> for Record {
    fn from(block: ObservationBlock) -> Self {
        Self::Observation(block)
    }
}

impl From<CorrectionUpdate> for Record {
    fn from(update: CorrectionUpdate) -> Self {
        Self::Correction(update)
    }
}

impl From<IntegrityUpdate> for Record {
    fn from(update: IntegrityUpdate) -> Self {
        Self::Integrity(update)
    }
}

impl From<StationRecord> for Record {
    fn from(record: StationRecord) -> Self {
        Self::Station(record)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::Unhandled(Vec::new())
    }
}

impl Record {
    /// [Ephemeris] unwrapping attempt
    pub fn as_ephemeris(&self) -> Option<&Ephemeris> {
        match self {
            Self::Ephemeris(eph) => Some(eph),
            _ => None,
        }
    }
    /// [ObservationBlock] unwrapping attempt
    pub fn as_observation(&self) -> Option<&ObservationBlock> {
        match self {
            Self::Observation(block) => Some(block),
            _ => None,
        }
    }
    /// [CorrectionUpdate] unwrapping attempt
    pub fn as_correction(&self) -> Option<&CorrectionUpdate> {
        match self {
            Self::Correction(update) => Some(update),
            _ => None,
        }
    }
    /// [IntegrityUpdate] unwrapping attempt
    pub fn as_integrity(&self) -> Option<&IntegrityUpdate> {
        match self {
            Self::Integrity(update) => Some(update),
            _ => None,
        }
    }
    /// [StationRecord] unwrapping attempt
    pub fn as_station(&self) -> Option<&StationRecord> {
        match self {
            Self::Station(record) => Some(record),
            _ => None,
        }
    }

    /// Epoch of this record. Ephemerides report their reference epoch.
    pub fn epoch(&self) -> Option<Epoch> {
        match self {
            Self::Ephemeris(eph) => Some(eph.toe()),
            Self::Observation(block) => Some(block.epoch),
            Self::Correction(update) => update.correction.epoch(),
            Self::Integrity(update) => Some(update.record.epoch()),
            Self::Station(record) => record.epoch(),
            Self::Unhandled(_) => None,
        }
    }
}
