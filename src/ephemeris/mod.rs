//! Broadcast ephemerides
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod beidou;
mod galileo;
mod glonass;
mod gps;
mod navic;
mod qzss;
mod sbas;

pub use beidou::BdsEphemeris;
pub use galileo::{GalileoEphemeris, GalileoNav};
pub use glonass::GlonassEphemeris;
pub use gps::GpsEphemeris;
pub use navic::NavicEphemeris;
pub use sbas::SbasEphemeris;

/// Keplerian orbital elements and harmonic perturbations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Kepler {
    /// Square root of semi-major axis [m^1/2]
    pub sqrt_a: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination at reference time [rad]
    pub i0_rad: f64,
    /// Longitude of ascending node at weekly epoch [rad]
    pub omega_0_rad: f64,
    /// Argument of perigee [rad]
    pub omega_rad: f64,
    /// Mean anomaly at reference time [rad]
    pub m0_rad: f64,
    /// Mean motion difference [rad/s]
    pub delta_n_rad_s: f64,
    /// Rate of inclination [rad/s]
    pub i_dot_rad_s: f64,
    /// Rate of right ascension [rad/s]
    pub omega_dot_rad_s: f64,
    /// cuc perturbation [rad]
    pub cuc: f64,
    /// cus perturbation [rad]
    pub cus: f64,
    /// crc perturbation [m]
    pub crc: f64,
    /// crs perturbation [m]
    pub crs: f64,
    /// cic perturbation [rad]
    pub cic: f64,
    /// cis perturbation [rad]
    pub cis: f64,
}

/// Onboard clock polynomial
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockPolynomial {
    /// Clock offset /bias [s]
    pub bias_s: f64,
    /// Clock drift [s/s]
    pub drift_s_s: f64,
    /// Clock drift rate [s/s²]
    pub drift_rate_s_s2: f64,
}

/// Decoded broadcast [Ephemeris], one variant per constellation.
/// Each record is built fresh from one message and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Ephemeris {
    /// GPS LNAV (1019)
    Gps(GpsEphemeris),
    /// QZSS LNAV (1044)
    Qzss(GpsEphemeris),
    /// Glonass (1020)
    Glonass(GlonassEphemeris),
    /// Galileo F/NAV (1045) or I/NAV (1046)
    Galileo(GalileoEphemeris),
    /// BeiDou D1/D2 (1042)
    BeiDou(BdsEphemeris),
    /// NavIC (1041)
    NavIC(NavicEphemeris),
    /// SBAS (1043)
    Sbas(SbasEphemeris),
}

impl Ephemeris {
    /// Decodes the [Ephemeris] message body (following the message type).
    pub(crate) fn decode(
        msg_type: u16,
        r: &mut BitReader,
        reference: Epoch,
    ) -> Result<Self, Error> {
        match msg_type {
            1019 => Ok(Self::Gps(GpsEphemeris::decode(r, reference)?)),
            1044 => Ok(Self::Qzss(qzss::decode(r, reference)?)),
            1020 => Ok(Self::Glonass(GlonassEphemeris::decode(r, reference)?)),
            1045 => Ok(Self::Galileo(GalileoEphemeris::decode(
                r,
                GalileoNav::FNav,
                reference,
            )?)),
            1046 => Ok(Self::Galileo(GalileoEphemeris::decode(
                r,
                GalileoNav::INav,
                reference,
            )?)),
            1042 => Ok(Self::BeiDou(BdsEphemeris::decode(r, reference)?)),
            1041 => Ok(Self::NavIC(NavicEphemeris::decode(r, reference)?)),
            1043 => Ok(Self::Sbas(SbasEphemeris::decode(r, reference)?)),
            _ => Err(Error::RecordMismatch(msg_type)),
        }
    }

    /// Encodes the message body (following the message type).
    pub(crate) fn encode(&self, msg_type: u16, w: &mut BitWriter) -> Result<(), Error> {
        if msg_type != self.message_type() {
            return Err(Error::RecordMismatch(msg_type));
        }
        match self {
            Self::Gps(eph) => eph.encode(w),
            Self::Qzss(eph) => qzss::encode(eph, w),
            Self::Glonass(eph) => eph.encode(w),
            Self::Galileo(eph) => eph.encode(w),
            Self::BeiDou(eph) => eph.encode(w),
            Self::NavIC(eph) => eph.encode(w),
            Self::Sbas(eph) => eph.encode(w),
        }
    }

    /// RTCM message type of this [Ephemeris]
    pub fn message_type(&self) -> u16 {
        match self {
            Self::Gps(_) => 1019,
            Self::Qzss(_) => 1044,
            Self::Glonass(_) => 1020,
            Self::Galileo(eph) => match eph.nav {
                GalileoNav::FNav => 1045,
                GalileoNav::INav => 1046,
            },
            Self::BeiDou(_) => 1042,
            Self::NavIC(_) => 1041,
            Self::Sbas(_) => 1043,
        }
    }

    /// Satellite described by this [Ephemeris]
    pub fn sv(&self) -> SV {
        match self {
            Self::Gps(eph) | Self::Qzss(eph) => eph.sv,
            Self::Glonass(eph) => eph.sv,
            Self::Galileo(eph) => eph.sv,
            Self::BeiDou(eph) => eph.sv,
            Self::NavIC(eph) => eph.sv,
            Self::Sbas(eph) => eph.sv,
        }
    }

    /// Issue of data of this [Ephemeris]
    pub fn iode(&self) -> u16 {
        match self {
            Self::Gps(eph) | Self::Qzss(eph) => eph.iode as u16,
            Self::Glonass(eph) => eph.iode() as u16,
            Self::Galileo(eph) => eph.iodnav,
            Self::BeiDou(eph) => eph.aode as u16,
            Self::NavIC(eph) => eph.iodec as u16,
            Self::Sbas(eph) => eph.iodn as u16,
        }
    }

    /// Reference [Epoch] of the orbit
    pub fn toe(&self) -> Epoch {
        match self {
            Self::Gps(eph) | Self::Qzss(eph) => eph.toe(),
            Self::Glonass(eph) => eph.toe,
            Self::Galileo(eph) => eph.toe(),
            Self::BeiDou(eph) => eph.toe(),
            Self::NavIC(eph) => eph.toe(),
            Self::Sbas(eph) => eph.t0,
        }
    }

    pub fn constellation(&self) -> Constellation {
        self.sv().constellation
    }
}
