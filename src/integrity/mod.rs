//! Augmentation integrity messages
use crate::{
    bits::{BitReader, BitWriter},
    mask::{read_mask, write_mask},
    sv::{sv_from_svid, svid_from_sv},
    time::{gps_tow, resolve_tow},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod area;
mod maps;
mod monitoring;
mod overbounding;
mod status;
pub mod tables;

pub use area::{AreaShape, Degradation, ServiceArea};
pub use maps::{
    AreaPoint, GmmComponent, MultipathMap, MultipathParameters, SignalMultipath, VisibilityMap,
};
pub use monitoring::{
    MonitoredSatellite, QualityIndicator, SignalLevel, SignalMonitoring, SsrIntegrity,
};
pub use overbounding::{
    Overbounding, OverboundingSystem, SatelliteOverbounding, SatelliteSis, SisLocal,
};
pub use status::{MinimumIntegrity, SatelliteStatus, SystemStatus};
pub use tables::SolutionType;

/// Test container message type
pub const TEST_CONTAINER: u16 = 54;

/// Integrity message kinds
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntegrityKind {
    /// Minimum integrity (2000)
    Minimum,
    /// Service levels and overbounding parameters (2005)
    Overbounding,
    /// Signal in space and local error parameters (2006)
    SisLocal,
    /// Primary service area (2007)
    PrimaryArea,
    /// Extended service area (2008)
    ExtendedArea,
    /// Quality indicator (2051)
    Quality,
    /// CNR and AGC monitoring (2091)
    SignalMonitoring,
    /// Satellite visibility map (2071)
    VisibilityMap,
    /// Multipath map (2072)
    MultipathMap,
    /// SSR integrity (2011)
    Ssr,
}

impl IntegrityKind {
    /// Identifies an integrity message type, or one of its aliases.
    /// The test container is identified by its subtype instead.
    pub fn from_message_type(msg_type: u16) -> Option<Self> {
        match msg_type {
            2000 | 3 => Some(Self::Minimum),
            2005 | 4 => Some(Self::Overbounding),
            2006 | 5 => Some(Self::SisLocal),
            2007 | 6 => Some(Self::PrimaryArea),
            2008 => Some(Self::ExtendedArea),
            2051 | 7 => Some(Self::Quality),
            2091 | 8 => Some(Self::SignalMonitoring),
            2071 => Some(Self::VisibilityMap),
            2072 => Some(Self::MultipathMap),
            2011 | 11 | 12 | 13 => Some(Self::Ssr),
            _ => None,
        }
    }

    fn from_test_subtype(subtype: u8) -> Result<Self, Error> {
        match subtype {
            9 => Ok(Self::VisibilityMap),
            10 => Ok(Self::MultipathMap),
            _ => Err(Error::InvalidSubtype(subtype)),
        }
    }
}

/// Test container header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TestHeader {
    pub working_group: u8,
    pub subtype: u8,
    pub revision: u8,
}

/// Decoded integrity message
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntegrityRecord {
    Minimum(MinimumIntegrity),
    Overbounding(Overbounding),
    SisLocal(SisLocal),
    /// Primary (2007) or extended (2008) service area
    ServiceArea(ServiceArea),
    Quality(QualityIndicator),
    SignalMonitoring(SignalMonitoring),
    VisibilityMap(VisibilityMap),
    MultipathMap(MultipathMap),
    Ssr(SsrIntegrity),
}

impl IntegrityRecord {
    pub fn kind(&self) -> IntegrityKind {
        match self {
            Self::Minimum(_) => IntegrityKind::Minimum,
            Self::Overbounding(_) => IntegrityKind::Overbounding,
            Self::SisLocal(_) => IntegrityKind::SisLocal,
            Self::ServiceArea(area) => {
                if area.degradation.is_some() {
                    IntegrityKind::ExtendedArea
                } else {
                    IntegrityKind::PrimaryArea
                }
            },
            Self::Quality(_) => IntegrityKind::Quality,
            Self::SignalMonitoring(_) => IntegrityKind::SignalMonitoring,
            Self::VisibilityMap(_) => IntegrityKind::VisibilityMap,
            Self::MultipathMap(_) => IntegrityKind::MultipathMap,
            Self::Ssr(_) => IntegrityKind::Ssr,
        }
    }

    pub fn epoch(&self) -> Epoch {
        match self {
            Self::Minimum(r) => r.epoch,
            Self::Overbounding(r) => r.epoch,
            Self::SisLocal(r) => r.epoch,
            Self::ServiceArea(r) => r.epoch,
            Self::Quality(r) => r.epoch,
            Self::SignalMonitoring(r) => r.epoch,
            Self::VisibilityMap(r) => r.epoch,
            Self::MultipathMap(r) => r.epoch,
            Self::Ssr(r) => r.epoch,
        }
    }

    /// Augmentation provider. Maps carry none and report 0.
    pub fn provider_id(&self) -> u16 {
        match self {
            Self::Minimum(r) => r.provider_id,
            Self::Overbounding(r) => r.provider_id,
            Self::SisLocal(r) => r.provider_id,
            Self::ServiceArea(r) => r.provider_id,
            Self::Quality(r) => r.provider_id,
            Self::SignalMonitoring(r) => r.provider_id,
            Self::VisibilityMap(_) | Self::MultipathMap(_) => 0,
            Self::Ssr(r) => r.provider_id,
        }
    }
}

/// Integrity message content, with its optional test container header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegrityUpdate {
    pub test: Option<TestHeader>,
    pub record: IntegrityRecord,
}

/// Validity period and update rate interval
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Validity {
    /// Validity period index
    pub period: u8,
    /// Update rate interval [0.1 s]
    pub update_interval: u16,
}

impl Validity {
    /// Validity period [s]
    pub fn period_s(&self) -> Option<f64> {
        tables::lookup(&tables::VALIDITY_PERIOD, self.period)
    }

    /// Update rate interval [s]
    pub fn update_interval_s(&self) -> f64 {
        self.update_interval as f64 * 0.1
    }

    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        Ok(Self {
            period: r.read_u8(4)?,
            update_interval: r.read_u16(16)?,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(4, self.period as u64)?;
        w.write_u64(16, self.update_interval as u64)
    }
}

/// Per constellation satellite set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteSet<T> {
    pub constellation: Constellation,
    /// Issue of the satellite mask
    pub iod_mask: u8,
    pub satellites: Vec<(SV, T)>,
}

/// Constellation of an integrity system index
pub(crate) fn constellation(index: u32) -> Result<Constellation, Error> {
    match index {
        0 => Ok(Constellation::GPS),
        1 => Ok(Constellation::Glonass),
        2 => Ok(Constellation::Galileo),
        3 => Ok(Constellation::BeiDou),
        4 => Ok(Constellation::QZSS),
        5 => Ok(Constellation::IRNSS),
        _ => Err(Error::InvalidPrn(Constellation::Mixed, index as u8)),
    }
}

/// Integrity system index of a [Constellation]
pub(crate) fn system_index(constellation: Constellation) -> Result<u32, Error> {
    match constellation {
        Constellation::GPS => Ok(0),
        Constellation::Glonass => Ok(1),
        Constellation::Galileo => Ok(2),
        Constellation::BeiDou => Ok(3),
        Constellation::QZSS => Ok(4),
        Constellation::IRNSS => Ok(5),
        c => Err(Error::InvalidPrn(c, 0)),
    }
}

/// GPS time of week, in ms
fn read_epoch(r: &mut BitReader, reference: Epoch) -> Result<Epoch, Error> {
    let tow_ms = r.read_u64(30)?;
    Ok(resolve_tow(reference, tow_ms as f64 * 1.0E-3, TimeScale::GPST))
}

fn write_epoch(w: &mut BitWriter, epoch: Epoch) -> Result<(), Error> {
    let tow_ms = (gps_tow(epoch) * 1.0E3).round() as u64;
    w.write_u64(30, tow_ms)
}

fn read_systems(r: &mut BitReader) -> Result<Vec<Constellation>, Error> {
    read_mask(r, 16, 0)?
        .into_iter()
        .map(constellation)
        .collect()
}

/// Writes the constellation mask of `items`, returning them in wire order
fn write_systems<'a, T>(
    w: &mut BitWriter,
    items: &'a [T],
    constellation: impl Fn(&T) -> Constellation,
) -> Result<Vec<&'a T>, Error> {
    let mut indexed = items
        .iter()
        .map(|item| Ok((system_index(constellation(item))?, item)))
        .collect::<Result<Vec<_>, Error>>()?;
    indexed.sort_by_key(|(index, _)| *index);
    let indices = indexed.iter().map(|(index, _)| *index).collect::<Vec<_>>();
    write_mask(w, &indices, 16, 0)?;
    Ok(indexed.into_iter().map(|(_, item)| item).collect())
}

fn read_satellites(r: &mut BitReader, constellation: Constellation) -> Result<Vec<SV>, Error> {
    read_mask(r, 64, 1)?
        .into_iter()
        .map(|svid| sv_from_svid(constellation, svid as u8))
        .collect()
}

/// Writes the satellite mask of `satellites`, returning them in wire order
fn write_satellites<'a, T>(
    w: &mut BitWriter,
    satellites: &'a [(SV, T)],
) -> Result<Vec<&'a (SV, T)>, Error> {
    let mut sorted = satellites.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|(sv, _)| sv.prn);
    let svids = sorted
        .iter()
        .map(|(sv, _)| svid_from_sv(*sv).map(|svid| svid as u32))
        .collect::<Result<Vec<_>, Error>>()?;
    write_mask(w, &svids, 64, 1)?;
    Ok(sorted)
}

impl<T> SatelliteSet<T> {
    /// Decodes every constellation set: satellite mask, mask IOD,
    /// then one `decode_sat` per satellite.
    fn decode_all(
        r: &mut BitReader,
        systems: &[Constellation],
        mut decode_sat: impl FnMut(&mut BitReader) -> Result<T, Error>,
    ) -> Result<Vec<Self>, Error> {
        let mut sets = Vec::with_capacity(systems.len());
        for constellation in systems {
            let svs = read_satellites(r, *constellation)?;
            let iod_mask = r.read_u8(2)?;
            let mut satellites = Vec::with_capacity(svs.len());
            for sv in svs {
                satellites.push((sv, decode_sat(r)?));
            }
            sets.push(Self {
                constellation: *constellation,
                iod_mask,
                satellites,
            });
        }
        Ok(sets)
    }

    fn encode(
        &self,
        w: &mut BitWriter,
        mut encode_sat: impl FnMut(&mut BitWriter, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let satellites = write_satellites(w, &self.satellites)?;
        w.write_u64(2, self.iod_mask as u64)?;
        for (_, sat) in satellites {
            encode_sat(w, sat)?;
        }
        Ok(())
    }
}

/// Decodes the integrity message `msg_type`
pub(crate) fn decode(
    msg_type: u16,
    r: &mut BitReader,
    reference: Epoch,
) -> Result<IntegrityUpdate, Error> {
    let (kind, test) = if msg_type == TEST_CONTAINER {
        let test = TestHeader {
            working_group: r.read_u8(4)?,
            subtype: r.read_u8(8)?,
            revision: r.read_u8(4)?,
        };
        (IntegrityKind::from_test_subtype(test.subtype)?, Some(test))
    } else {
        let kind =
            IntegrityKind::from_message_type(msg_type).ok_or(Error::UnsupportedMessage(msg_type))?;
        (kind, None)
    };

    let record = match kind {
        IntegrityKind::Minimum => IntegrityRecord::Minimum(MinimumIntegrity::decode(r, reference)?),
        IntegrityKind::Overbounding => {
            IntegrityRecord::Overbounding(Overbounding::decode(r, reference)?)
        },
        IntegrityKind::SisLocal => IntegrityRecord::SisLocal(SisLocal::decode(r, reference)?),
        IntegrityKind::PrimaryArea => {
            IntegrityRecord::ServiceArea(ServiceArea::decode(r, reference, false)?)
        },
        IntegrityKind::ExtendedArea => {
            IntegrityRecord::ServiceArea(ServiceArea::decode(r, reference, true)?)
        },
        IntegrityKind::Quality => IntegrityRecord::Quality(QualityIndicator::decode(r, reference)?),
        IntegrityKind::SignalMonitoring => {
            IntegrityRecord::SignalMonitoring(SignalMonitoring::decode(r, reference)?)
        },
        IntegrityKind::VisibilityMap => {
            IntegrityRecord::VisibilityMap(VisibilityMap::decode(r, reference)?)
        },
        IntegrityKind::MultipathMap => {
            IntegrityRecord::MultipathMap(MultipathMap::decode(r, reference)?)
        },
        IntegrityKind::Ssr => IntegrityRecord::Ssr(SsrIntegrity::decode(r, reference)?),
    };
    Ok(IntegrityUpdate { test, record })
}

/// Encodes `update` as message `msg_type`
pub(crate) fn encode(
    msg_type: u16,
    update: &IntegrityUpdate,
    w: &mut BitWriter,
) -> Result<(), Error> {
    let kind = if msg_type == TEST_CONTAINER {
        let test = update.test.ok_or(Error::RecordMismatch(msg_type))?;
        w.write_u64(4, test.working_group as u64)?;
        w.write_u64(8, test.subtype as u64)?;
        w.write_u64(4, test.revision as u64)?;
        IntegrityKind::from_test_subtype(test.subtype)?
    } else {
        IntegrityKind::from_message_type(msg_type).ok_or(Error::UnsupportedMessage(msg_type))?
    };
    if kind != update.record.kind() {
        return Err(Error::RecordMismatch(msg_type));
    }
    match &update.record {
        IntegrityRecord::Minimum(r) => r.encode(w),
        IntegrityRecord::Overbounding(r) => r.encode(w),
        IntegrityRecord::SisLocal(r) => r.encode(w),
        IntegrityRecord::ServiceArea(r) => r.encode(w),
        IntegrityRecord::Quality(r) => r.encode(w),
        IntegrityRecord::SignalMonitoring(r) => r.encode(w),
        IntegrityRecord::VisibilityMap(r) => r.encode(w),
        IntegrityRecord::MultipathMap(r) => r.encode(w),
        IntegrityRecord::Ssr(r) => r.encode(w),
    }
}

/// Latest integrity record of each kind, per augmentation provider
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegrityState {
    records: BTreeMap<(u16, IntegrityKind), IntegrityRecord>,
}

impl IntegrityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches `record`, unless older than the cached record of its kind.
    /// Returns false when dropped.
    pub fn apply(&mut self, record: &IntegrityRecord) -> bool {
        let key = (record.provider_id(), record.kind());
        if let Some(cached) = self.records.get(&key) {
            if record.epoch() < cached.epoch() {
                #[cfg(feature = "log")]
                debug!(
                    "{:?}: dropping stale {:?} integrity record",
                    record.epoch(),
                    key.1
                );
                return false;
            }
        }
        self.records.insert(key, record.clone());
        true
    }

    pub fn get(&self, provider_id: u16, kind: IntegrityKind) -> Option<&IntegrityRecord> {
        self.records.get(&(provider_id, kind))
    }

    pub fn records(&self) -> impl Iterator<Item = &IntegrityRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
