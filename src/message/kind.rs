//! Message type classification
use crate::{
    integrity::{IntegrityKind, TEST_CONTAINER},
    observation::MsmVariant,
    ssr::{SsrMessage, IGS_SSR},
};
use gnss_rs::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [MessageKind] classifies a message type into the message family
/// that will decode it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageKind {
    /// Multi signal observations
    Msm(Constellation, MsmVariant),
    /// Broadcast ephemeris
    Ephemeris(Constellation),
    /// SSR correction, RTCM or test numbering
    Ssr(SsrMessage),
    /// IGS SSR, subtype is carried in the payload
    IgsSsr,
    /// Integrity message
    Integrity(IntegrityKind),
    /// Integrity test container, subtype is carried in the payload
    IntegrityTest,
    /// Reference station position
    StationPosition,
    /// Antenna and receiver descriptor
    AntennaDescriptor,
    /// Glonass code-phase biases
    GlonassBias,
    /// Free text
    Text,
    /// Network RTK residuals
    NetworkRtk(Constellation),
    /// No decoder for this message type
    #[default]
    Unknown,
}

impl From<u16> for MessageKind {
    fn from(msg_type: u16) -> Self {
        if let Some((constellation, variant)) = MsmVariant::from_message_type(msg_type) {
            return Self::Msm(constellation, variant);
        }
        if msg_type == IGS_SSR {
            return Self::IgsSsr;
        }
        if msg_type == TEST_CONTAINER {
            return Self::IntegrityTest;
        }
        if let Some(message) = SsrMessage::from_message_type(msg_type) {
            return Self::Ssr(message);
        }
        if let Some(kind) = IntegrityKind::from_message_type(msg_type) {
            return Self::Integrity(kind);
        }
        match msg_type {
            1019 => Self::Ephemeris(Constellation::GPS),
            1020 => Self::Ephemeris(Constellation::Glonass),
            1041 => Self::Ephemeris(Constellation::IRNSS),
            1042 => Self::Ephemeris(Constellation::BeiDou),
            1043 => Self::Ephemeris(Constellation::SBAS),
            1044 => Self::Ephemeris(Constellation::QZSS),
            1045 | 1046 => Self::Ephemeris(Constellation::Galileo),
            1005 | 1006 | 1032 => Self::StationPosition,
            1007 | 1008 | 1033 => Self::AntennaDescriptor,
            1230 => Self::GlonassBias,
            1029 => Self::Text,
            1030 => Self::NetworkRtk(Constellation::GPS),
            1031 => Self::NetworkRtk(Constellation::Glonass),
            1303 => Self::NetworkRtk(Constellation::BeiDou),
            1304 => Self::NetworkRtk(Constellation::Galileo),
            1305 => Self::NetworkRtk(Constellation::QZSS),
            _ => Self::Unknown,
        }
    }
}

impl MessageKind {
    /// True if this message type carries SSR corrections
    pub fn is_ssr(&self) -> bool {
        matches!(self, Self::Ssr(_) | Self::IgsSsr)
    }

    /// True if this message type carries integrity information
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::IntegrityTest)
    }

    /// True for station descriptors and auxiliary messages
    pub fn is_station(&self) -> bool {
        matches!(
            self,
            Self::StationPosition
                | Self::AntennaDescriptor
                | Self::GlonassBias
                | Self::Text
                | Self::NetworkRtk(_)
        )
    }
}
