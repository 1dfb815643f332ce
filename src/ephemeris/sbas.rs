//! SBAS geostationary ephemeris (1043)
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_31, P2_40},
    sv::{sv_from_svid, svid_from_sv},
    time::{gps_tow, resolve_tow},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SbasEphemeris {
    pub sv: SV,
    /// Issue of data, navigation
    pub iodn: u8,
    /// Reference [Epoch], resolved from the time of day
    pub t0: Epoch,
    pub ura_index: u8,
    /// ECEF position [m]
    pub position_m: [f64; 3],
    /// ECEF velocity [m/s]
    pub velocity_m_s: [f64; 3],
    /// ECEF acceleration [m/s²]
    pub acceleration_m_s2: [f64; 3],
    /// Clock offset [s]
    pub af0_s: f64,
    /// Clock drift [s/s]
    pub af1_s_s: f64,
}

const POSITION_SCALE: [f64; 3] = [0.08, 0.08, 0.4];
const POSITION_WIDTH: [u32; 3] = [30, 30, 25];
const VELOCITY_SCALE: [f64; 3] = [0.000625, 0.000625, 0.004];
const VELOCITY_WIDTH: [u32; 3] = [17, 17, 18];
const ACCELERATION_SCALE: [f64; 3] = [1.25E-5, 1.25E-5, 6.25E-5];

impl SbasEphemeris {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let svid = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::SBAS, svid)?;
        let iodn = r.read_u8(8)?;
        let tod = r.read_uscaled(13, 16.0)?;
        let ura_index = r.read_u8(4)?;
        let mut position_m = [0.0; 3];
        let mut velocity_m_s = [0.0; 3];
        let mut acceleration_m_s2 = [0.0; 3];
        for axis in 0..3 {
            position_m[axis] = r.read_scaled(POSITION_WIDTH[axis], POSITION_SCALE[axis])?;
        }
        for axis in 0..3 {
            velocity_m_s[axis] = r.read_scaled(VELOCITY_WIDTH[axis], VELOCITY_SCALE[axis])?;
        }
        for axis in 0..3 {
            acceleration_m_s2[axis] = r.read_scaled(10, ACCELERATION_SCALE[axis])?;
        }
        let af0_s = r.read_scaled(12, P2_31)?;
        let af1_s_s = r.read_scaled(8, P2_40)?;

        // time of day, applied to the reference day
        let ref_tow = gps_tow(reference);
        let day_start = (ref_tow / 86400.0).floor() * 86400.0;
        let t0 = resolve_tow(reference, day_start + tod, TimeScale::GPST);

        Ok(Self {
            sv,
            iodn,
            t0,
            ura_index,
            position_m,
            velocity_m_s,
            acceleration_m_s2,
            af0_s,
            af1_s_s,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        w.write_u64(8, self.iodn as u64)?;
        let tod = gps_tow(self.t0).rem_euclid(86400.0);
        w.write_uscaled(13, tod, 16.0)?;
        w.write_u64(4, self.ura_index as u64)?;
        for axis in 0..3 {
            w.write_scaled(POSITION_WIDTH[axis], self.position_m[axis], POSITION_SCALE[axis])?;
        }
        for axis in 0..3 {
            w.write_scaled(VELOCITY_WIDTH[axis], self.velocity_m_s[axis], VELOCITY_SCALE[axis])?;
        }
        for axis in 0..3 {
            w.write_scaled(10, self.acceleration_m_s2[axis], ACCELERATION_SCALE[axis])?;
        }
        w.write_scaled(12, self.af0_s, P2_31)?;
        w.write_scaled(8, self.af1_s_s, P2_40)
    }
}
