//! State Space Representation (SSR) corrections.
//!
//! Three numberings coexist on the wire: RTCM, the experimental "test" range
//! and IGS SSR (4076, multiplexed by subtype). They share one codec per
//! [CorrectionKind] and only differ where the layout differs.
use crate::{
    bits::{BitReader, BitWriter},
    signal::SignalCode,
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod antenna;
mod atmosphere;
mod bias;
mod grid;
mod header;
mod metadata;
mod orbit;
mod state;
mod ura;
mod vtec;

pub use antenna::{AntennaCorrections, FrequencyCorrection, NadirRange, SatelliteAntenna};
pub use atmosphere::{
    Ionosphere, StecCorrection, StecResiduals, TropoPolynomial, TropoResiduals, Troposphere,
};
pub use bias::{CodeBias, PhaseBias, PhaseBiasFlags, SatPhaseBias};
pub use grid::{GridDefinition, GridKind, GridMask, GridPoint};
pub use header::SsrHeader;
pub use metadata::{Metadata, MetadataEntry};
pub use orbit::{ClockCorrection, OrbitCorrection};
pub use state::{CorrectionState, KindState, NetworkState, SetStatus, Snapshot};
pub use ura::{decode_ura, quantize_ura};
pub use vtec::{Vtec, VtecLayer};

/// IGS SSR message type
pub const IGS_SSR: u16 = 4076;

/// IGS SSR subtype of the VTEC message
const IGS_VTEC_SUBTYPE: u8 = 201;

/// SSR numbering scheme
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SsrFlavor {
    /// RTCM 10403 numbering
    Rtcm,
    /// Experimental (test) numbering, mostly compact SSR
    Test,
    /// IGS SSR, message 4076
    Igs,
}

/// Correction carried by one SSR message
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CorrectionKind {
    Orbit,
    Clock,
    CodeBias,
    /// Orbit and clock, in a single message
    Combined,
    Ura,
    HighRateClock,
    PhaseBias,
    /// Widelane indicators completing the last phase bias message
    PhaseBiasExtension,
    /// Global ionosphere, spherical harmonics
    Vtec,
    /// Gridded troposphere
    Troposphere,
    /// Gridded slant ionosphere (STEC)
    Ionosphere,
    /// Grid definition
    Grid,
    Metadata,
    SatelliteAntenna,
}

/// Kinds cycled by the RTCM (+0..+5) and test (41..46, 62..79) numberings
const CYCLED_KINDS: [CorrectionKind; 6] = [
    CorrectionKind::Orbit,
    CorrectionKind::Clock,
    CorrectionKind::CodeBias,
    CorrectionKind::Combined,
    CorrectionKind::Ura,
    CorrectionKind::HighRateClock,
];

/// RTCM base types
const RTCM_BASES: [(Constellation, u16); 6] = [
    (Constellation::GPS, 1057),
    (Constellation::Glonass, 1063),
    (Constellation::Galileo, 1240),
    (Constellation::QZSS, 1246),
    (Constellation::SBAS, 1252),
    (Constellation::BeiDou, 1258),
];

/// RTCM phase bias types, from 1265
const RTCM_PHASE_BIAS: [Constellation; 6] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::Galileo,
    Constellation::QZSS,
    Constellation::SBAS,
    Constellation::BeiDou,
];

/// Constellations covered by the test ranges (80..100)
const TEST_SYSTEMS: [Constellation; 5] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::Galileo,
    Constellation::BeiDou,
    Constellation::QZSS,
];

/// Constellations cycled by test types 62..79
const TEST_CYCLED: [Constellation; 3] = [
    Constellation::Galileo,
    Constellation::BeiDou,
    Constellation::QZSS,
];

/// IGS subtype kinds, from `subtype % 10 == 1`
const IGS_KINDS: [CorrectionKind; 7] = [
    CorrectionKind::Orbit,
    CorrectionKind::Clock,
    CorrectionKind::Combined,
    CorrectionKind::HighRateClock,
    CorrectionKind::CodeBias,
    CorrectionKind::PhaseBias,
    CorrectionKind::Ura,
];

/// IGS subtype constellations, from `subtype / 10`
const IGS_SYSTEMS: [(u8, Constellation); 6] = [
    (2, Constellation::GPS),
    (4, Constellation::Glonass),
    (6, Constellation::Galileo),
    (8, Constellation::QZSS),
    (10, Constellation::BeiDou),
    (12, Constellation::SBAS),
];

/// Describes one SSR message: numbering, constellation and content.
/// `constellation` is None for kinds that are not satellite specific.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SsrMessage {
    pub flavor: SsrFlavor,
    pub constellation: Option<Constellation>,
    pub kind: CorrectionKind,
}

impl SsrMessage {
    pub const fn new(
        flavor: SsrFlavor,
        constellation: Option<Constellation>,
        kind: CorrectionKind,
    ) -> Self {
        Self {
            flavor,
            constellation,
            kind,
        }
    }

    /// Identifies an RTCM or test SSR message type.
    /// IGS SSR (4076) requires the subtype, see [Self::from_igs_subtype].
    pub fn from_message_type(msg_type: u16) -> Option<Self> {
        use CorrectionKind::*;
        for (constellation, base) in RTCM_BASES {
            if msg_type >= base && msg_type < base + 6 {
                let kind = CYCLED_KINDS[(msg_type - base) as usize];
                return Some(Self::new(SsrFlavor::Rtcm, Some(constellation), kind));
            }
        }
        let test = |c: Option<Constellation>, kind| Some(Self::new(SsrFlavor::Test, c, kind));
        match msg_type {
            1264 => Some(Self::new(SsrFlavor::Rtcm, None, Vtec)),
            1265..=1270 => {
                let constellation = RTCM_PHASE_BIAS[(msg_type - 1265) as usize];
                Some(Self::new(SsrFlavor::Rtcm, Some(constellation), PhaseBias))
            },
            41..=46 => test(
                Some(Constellation::Glonass),
                CYCLED_KINDS[(msg_type - 41) as usize],
            ),
            60 => test(None, Metadata),
            61 => test(None, Grid),
            62..=79 => {
                let rel = (msg_type - 62) as usize;
                test(Some(TEST_CYCLED[rel % 3]), CYCLED_KINDS[rel / 3])
            },
            80..=84 => test(
                Some(TEST_SYSTEMS[(msg_type - 80) as usize]),
                SatelliteAntenna,
            ),
            85..=89 => test(Some(TEST_SYSTEMS[(msg_type - 85) as usize]), PhaseBias),
            90..=94 => test(
                Some(TEST_SYSTEMS[(msg_type - 90) as usize]),
                PhaseBiasExtension,
            ),
            95 => test(None, Troposphere),
            96..=100 => test(Some(TEST_SYSTEMS[(msg_type - 96) as usize]), Ionosphere),
            _ => None,
        }
    }

    /// Identifies an IGS SSR subtype
    pub fn from_igs_subtype(subtype: u8) -> Result<Self, Error> {
        if subtype == IGS_VTEC_SUBTYPE {
            return Ok(Self::new(SsrFlavor::Igs, None, CorrectionKind::Vtec));
        }
        let (_, constellation) = IGS_SYSTEMS
            .iter()
            .find(|(code, _)| *code == subtype / 10)
            .ok_or(Error::InvalidSubtype(subtype))?;
        let kind = match subtype % 10 {
            k @ 1..=7 => IGS_KINDS[(k - 1) as usize],
            _ => return Err(Error::InvalidSubtype(subtype)),
        };
        Ok(Self::new(SsrFlavor::Igs, Some(*constellation), kind))
    }

    /// IGS SSR subtype of this message, None for other flavors
    pub fn igs_subtype(&self) -> Option<u8> {
        if self.flavor != SsrFlavor::Igs {
            return None;
        }
        if self.kind == CorrectionKind::Vtec {
            return Some(IGS_VTEC_SUBTYPE);
        }
        let (code, _) = IGS_SYSTEMS
            .iter()
            .find(|(_, c)| Some(*c) == self.constellation)?;
        let kind = IGS_KINDS.iter().position(|k| *k == self.kind)? as u8;
        Some(code * 10 + kind + 1)
    }

    /// RTCM message type. None if this combination has no number.
    pub fn message_type(&self) -> Option<u16> {
        use CorrectionKind::*;
        let cycled = CYCLED_KINDS.iter().position(|k| *k == self.kind);
        match self.flavor {
            SsrFlavor::Igs => self.igs_subtype().map(|_| IGS_SSR),
            SsrFlavor::Rtcm => match (self.kind, self.constellation) {
                (Vtec, None) => Some(1264),
                (PhaseBias, Some(c)) => RTCM_PHASE_BIAS
                    .iter()
                    .position(|sys| *sys == c)
                    .map(|i| 1265 + i as u16),
                (_, Some(c)) => {
                    let (_, base) = RTCM_BASES.iter().find(|(sys, _)| *sys == c)?;
                    cycled.map(|k| base + k as u16)
                },
                _ => None,
            },
            SsrFlavor::Test => {
                let system = |c: Constellation| TEST_SYSTEMS.iter().position(|sys| *sys == c);
                match (self.kind, self.constellation) {
                    (Metadata, None) => Some(60),
                    (Grid, None) => Some(61),
                    (Troposphere, None) => Some(95),
                    (SatelliteAntenna, Some(c)) => system(c).map(|i| 80 + i as u16),
                    (PhaseBias, Some(c)) => system(c).map(|i| 85 + i as u16),
                    (PhaseBiasExtension, Some(c)) => system(c).map(|i| 90 + i as u16),
                    (Ionosphere, Some(c)) => system(c).map(|i| 96 + i as u16),
                    (_, Some(Constellation::Glonass)) => cycled.map(|k| 41 + k as u16),
                    (_, Some(c)) => {
                        let sys = TEST_CYCLED.iter().position(|sys| *sys == c)?;
                        cycled.map(|k| 62 + (k * 3 + sys) as u16)
                    },
                    _ => None,
                }
            },
        }
    }

    /// Constellation of satellite specific messages. Kinds that
    /// are not satellite specific default to GPS, which only matters
    /// for the epoch width.
    pub(crate) fn system(&self) -> Constellation {
        self.constellation.unwrap_or(Constellation::GPS)
    }
}

/// Decoded SSR content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Correction {
    Orbit {
        header: SsrHeader,
        satellites: Vec<(SV, OrbitCorrection)>,
    },
    Clock {
        header: SsrHeader,
        satellites: Vec<(SV, ClockCorrection)>,
    },
    Combined {
        header: SsrHeader,
        satellites: Vec<(SV, OrbitCorrection, ClockCorrection)>,
    },
    /// High rate clock corrections [m]
    HighRateClock {
        header: SsrHeader,
        satellites: Vec<(SV, f64)>,
    },
    /// User range accuracy [m], None when undefined
    Ura {
        header: SsrHeader,
        satellites: Vec<(SV, Option<f64>)>,
    },
    CodeBias {
        header: SsrHeader,
        satellites: Vec<(SV, Vec<CodeBias>)>,
    },
    PhaseBias {
        header: SsrHeader,
        flags: PhaseBiasFlags,
        satellites: Vec<(SV, SatPhaseBias)>,
    },
    /// Widelane indicators, in the order of the cached phase biases
    PhaseBiasExtension {
        header: SsrHeader,
        property_id: u8,
        indicators: Vec<(SV, SignalCode, u8)>,
    },
    Vtec {
        header: SsrHeader,
        vtec: Vtec,
    },
    Troposphere {
        header: SsrHeader,
        troposphere: Troposphere,
    },
    Ionosphere {
        header: SsrHeader,
        ionosphere: Ionosphere,
    },
    Grid(GridDefinition),
    Metadata(Metadata),
    SatelliteAntenna(SatelliteAntenna),
}

impl Correction {
    pub fn kind(&self) -> CorrectionKind {
        match self {
            Self::Orbit { .. } => CorrectionKind::Orbit,
            Self::Clock { .. } => CorrectionKind::Clock,
            Self::Combined { .. } => CorrectionKind::Combined,
            Self::HighRateClock { .. } => CorrectionKind::HighRateClock,
            Self::Ura { .. } => CorrectionKind::Ura,
            Self::CodeBias { .. } => CorrectionKind::CodeBias,
            Self::PhaseBias { .. } => CorrectionKind::PhaseBias,
            Self::PhaseBiasExtension { .. } => CorrectionKind::PhaseBiasExtension,
            Self::Vtec { .. } => CorrectionKind::Vtec,
            Self::Troposphere { .. } => CorrectionKind::Troposphere,
            Self::Ionosphere { .. } => CorrectionKind::Ionosphere,
            Self::Grid(_) => CorrectionKind::Grid,
            Self::Metadata(_) => CorrectionKind::Metadata,
            Self::SatelliteAntenna(_) => CorrectionKind::SatelliteAntenna,
        }
    }

    /// Common header, for epoch tagged kinds
    pub fn header(&self) -> Option<&SsrHeader> {
        match self {
            Self::Orbit { header, .. }
            | Self::Clock { header, .. }
            | Self::Combined { header, .. }
            | Self::HighRateClock { header, .. }
            | Self::Ura { header, .. }
            | Self::CodeBias { header, .. }
            | Self::PhaseBias { header, .. }
            | Self::PhaseBiasExtension { header, .. }
            | Self::Vtec { header, .. }
            | Self::Troposphere { header, .. }
            | Self::Ionosphere { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Correction [Epoch], for epoch tagged kinds
    pub fn epoch(&self) -> Option<Epoch> {
        self.header().map(|h| h.epoch)
    }

    /// Network this correction applies to: gridded corrections are
    /// keyed by grid id, everything else belongs to network 0.
    pub fn network_id(&self) -> u16 {
        match self {
            Self::Troposphere { troposphere, .. } => troposphere.grid_id,
            Self::Ionosphere { ionosphere, .. } => ionosphere.grid_id,
            Self::Grid(grid) => grid.grid_id,
            _ => 0,
        }
    }
}

/// One decoded SSR message
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectionUpdate {
    pub message: SsrMessage,
    /// IGS SSR version field
    pub igs_version: Option<u8>,
    pub correction: Correction,
}

impl CorrectionUpdate {
    pub fn message_type(&self) -> Option<u16> {
        self.message.message_type()
    }
}

/// Decodes the SSR message body that follows the 12 bit message type.
/// `state` is only read, to resolve the phase bias extension layout.
pub(crate) fn decode(
    msg_type: u16,
    r: &mut BitReader,
    reference: Epoch,
    state: &CorrectionState,
) -> Result<CorrectionUpdate, Error> {
    let (message, igs_version) = if msg_type == IGS_SSR {
        let version = r.read_u8(3)?;
        let subtype = r.read_u8(8)?;
        (SsrMessage::from_igs_subtype(subtype)?, Some(version))
    } else {
        let message =
            SsrMessage::from_message_type(msg_type).ok_or(Error::UnsupportedMessage(msg_type))?;
        (message, None)
    };

    let correction = match message.kind {
        CorrectionKind::Grid => Correction::Grid(GridDefinition::decode(r)?),
        CorrectionKind::Metadata => Correction::Metadata(Metadata::decode(r)?),
        CorrectionKind::SatelliteAntenna => {
            Correction::SatelliteAntenna(SatelliteAntenna::decode(r, message.system())?)
        },
        kind => {
            let header = SsrHeader::decode(r, &message, reference)?;
            match kind {
                CorrectionKind::Orbit => Correction::Orbit {
                    satellites: orbit::decode_orbits(r, &message)?,
                    header,
                },
                CorrectionKind::Clock => Correction::Clock {
                    satellites: orbit::decode_clocks(r, &message)?,
                    header,
                },
                CorrectionKind::Combined => Correction::Combined {
                    satellites: orbit::decode_combined(r, &message)?,
                    header,
                },
                CorrectionKind::HighRateClock => Correction::HighRateClock {
                    satellites: orbit::decode_high_rate(r, &message)?,
                    header,
                },
                CorrectionKind::Ura => Correction::Ura {
                    satellites: ura::decode_satellites(r, &message)?,
                    header,
                },
                CorrectionKind::CodeBias => Correction::CodeBias {
                    satellites: bias::decode_code_biases(r, &message)?,
                    header,
                },
                CorrectionKind::PhaseBias => {
                    let (flags, satellites) = bias::decode_phase_biases(r, &message)?;
                    Correction::PhaseBias {
                        header,
                        flags,
                        satellites,
                    }
                },
                CorrectionKind::PhaseBiasExtension => {
                    let property_id = r.read_u8(4)?;
                    let cached = state.phase_bias_signals(message.system());
                    #[cfg(feature = "log")]
                    if cached.is_empty() {
                        warn!("phase bias extension received before its phase bias message");
                    }
                    let mut indicators = Vec::with_capacity(cached.len());
                    for (sv, code) in cached {
                        indicators.push((sv, code, r.read_u8(2)?));
                    }
                    Correction::PhaseBiasExtension {
                        header,
                        property_id,
                        indicators,
                    }
                },
                CorrectionKind::Vtec => Correction::Vtec {
                    vtec: Vtec::decode(r)?,
                    header,
                },
                CorrectionKind::Troposphere => Correction::Troposphere {
                    troposphere: Troposphere::decode(r)?,
                    header,
                },
                CorrectionKind::Ionosphere => Correction::Ionosphere {
                    ionosphere: Ionosphere::decode(r, message.system())?,
                    header,
                },
                _ => return Err(Error::UnsupportedMessage(msg_type)),
            }
        },
    };

    Ok(CorrectionUpdate {
        message,
        igs_version,
        correction,
    })
}

/// Encodes `update`, following the 12 bit message type
pub(crate) fn encode(update: &CorrectionUpdate, w: &mut BitWriter) -> Result<(), Error> {
    let message = &update.message;
    let msg_type = message.message_type().unwrap_or(0);
    if message.kind != update.correction.kind() {
        return Err(Error::RecordMismatch(msg_type));
    }
    if let Some(subtype) = message.igs_subtype() {
        w.write_u64(3, update.igs_version.unwrap_or(1) as u64)?;
        w.write_u64(8, subtype as u64)?;
    }
    if let Some(header) = update.correction.header() {
        header.encode(w, message)?;
    }
    match &update.correction {
        Correction::Orbit { satellites, .. } => orbit::encode_orbits(w, message, satellites),
        Correction::Clock { satellites, .. } => orbit::encode_clocks(w, message, satellites),
        Correction::Combined { satellites, .. } => {
            orbit::encode_combined(w, message, satellites)
        },
        Correction::HighRateClock { satellites, .. } => {
            orbit::encode_high_rate(w, message, satellites)
        },
        Correction::Ura { satellites, .. } => ura::encode_satellites(w, message, satellites),
        Correction::CodeBias { satellites, .. } => {
            bias::encode_code_biases(w, message, satellites)
        },
        Correction::PhaseBias {
            flags, satellites, ..
        } => bias::encode_phase_biases(w, message, flags, satellites),
        Correction::PhaseBiasExtension {
            property_id,
            indicators,
            ..
        } => {
            w.write_u64(4, *property_id as u64)?;
            for (_, _, wl) in indicators {
                w.write_u64(2, *wl as u64)?;
            }
            Ok(())
        },
        Correction::Vtec { vtec, .. } => vtec.encode(w),
        Correction::Troposphere { troposphere, .. } => troposphere.encode(w),
        Correction::Ionosphere { ionosphere, .. } => ionosphere.encode(w),
        Correction::Grid(grid) => grid.encode(w),
        Correction::Metadata(metadata) => metadata.encode(w),
        Correction::SatelliteAntenna(antenna) => antenna.encode(w),
    }
}

/// Reads an SSR satellite id
pub(crate) fn read_sv(r: &mut BitReader, message: &SsrMessage) -> Result<SV, Error> {
    let constellation = message.system();
    let svid = r.read_u8(svid_width(message))?;
    crate::sv::sv_from_svid(constellation, svid)
}

pub(crate) fn write_sv(w: &mut BitWriter, message: &SsrMessage, sv: SV) -> Result<(), Error> {
    let svid = crate::sv::svid_from_sv(sv)?;
    w.write_u64(svid_width(message), svid as u64)
}

fn svid_width(message: &SsrMessage) -> u32 {
    match (message.flavor, message.system()) {
        (SsrFlavor::Igs, _) => 6,
        (_, Constellation::Glonass) => 5,
        (_, Constellation::QZSS) => 4,
        _ => 6,
    }
}

/// Reads the satellite count that closes most headers
pub(crate) fn read_count(r: &mut BitReader) -> Result<usize, Error> {
    Ok(r.read_u8(6)? as usize)
}

pub(crate) fn write_count(w: &mut BitWriter, count: usize) -> Result<(), Error> {
    w.write_u64(6, count as u64)
}
