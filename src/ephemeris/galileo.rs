//! Galileo F/NAV (1045) and I/NAV (1046) ephemerides
use super::{ClockPolynomial, Kepler};
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_19, P2_29, P2_31, P2_32, P2_33, P2_34, P2_43, P2_46, P2_5, P2_59, SC2RAD},
    sv::{sv_from_svid, svid_from_sv},
    time::{adjust_week, from_week_tow},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Galileo navigation message the ephemeris was extracted from
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GalileoNav {
    /// E5a F/NAV
    #[default]
    FNav,
    /// E1-B / E5b I/NAV
    INav,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GalileoEphemeris {
    pub sv: SV,
    pub nav: GalileoNav,
    /// Full GST week counter
    pub week: u32,
    pub iodnav: u16,
    /// SISA index
    pub sisa: u8,
    /// Clock reference time of week [s]
    pub toc_s: f64,
    /// Orbit reference time of week [s]
    pub toe_s: f64,
    pub clock: ClockPolynomial,
    pub kepler: Kepler,
    /// E1/E5a broadcast group delay [s]
    pub bgd_e5a_s: f64,
    /// E1/E5b broadcast group delay [s], I/NAV only
    pub bgd_e5b_s: Option<f64>,
    /// E5a (F/NAV) or E5b (I/NAV) signal health status
    pub health: u8,
    /// E5a (F/NAV) or E5b (I/NAV) data validity
    pub data_validity: bool,
    /// E1-B signal health status, I/NAV only
    pub e1b_health: u8,
    /// E1-B data validity, I/NAV only
    pub e1b_data_validity: bool,
}

impl GalileoEphemeris {
    pub(crate) fn decode(r: &mut BitReader, nav: GalileoNav, reference: Epoch) -> Result<Self, Error> {
        let prn = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::Galileo, prn)?;
        let week = adjust_week(r.read_u32(12)?, 4096, reference, TimeScale::GST);
        let iodnav = r.read_u16(10)?;
        let sisa = r.read_u8(8)?;
        let i_dot_rad_s = r.read_scaled(14, P2_43 * SC2RAD)?;
        let toc_s = r.read_uscaled(14, 60.0)?;
        let drift_rate_s_s2 = r.read_scaled(6, P2_59)?;
        let drift_s_s = r.read_scaled(21, P2_46)?;
        let bias_s = r.read_scaled(31, P2_34)?;
        let crs = r.read_scaled(16, P2_5)?;
        let delta_n_rad_s = r.read_scaled(16, P2_43 * SC2RAD)?;
        let m0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cuc = r.read_scaled(16, P2_29)?;
        let e = r.read_uscaled(32, P2_33)?;
        let cus = r.read_scaled(16, P2_29)?;
        let sqrt_a = r.read_uscaled(32, P2_19)?;
        let toe_s = r.read_uscaled(14, 60.0)?;
        let cic = r.read_scaled(16, P2_29)?;
        let omega_0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cis = r.read_scaled(16, P2_29)?;
        let i0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let crc = r.read_scaled(16, P2_5)?;
        let omega_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let omega_dot_rad_s = r.read_scaled(24, P2_43 * SC2RAD)?;
        let bgd_e5a_s = r.read_scaled(10, P2_32)?;

        let (bgd_e5b_s, health, data_validity, e1b_health, e1b_data_validity) = match nav {
            GalileoNav::FNav => {
                let health = r.read_u8(2)?;
                let validity = r.read_bool()?;
                r.skip(7)?;
                (None, health, validity, 0, false)
            },
            GalileoNav::INav => {
                let bgd = r.read_scaled(10, P2_32)?;
                let health = r.read_u8(2)?;
                let validity = r.read_bool()?;
                let e1b_health = r.read_u8(2)?;
                let e1b_validity = r.read_bool()?;
                r.skip(2)?;
                (Some(bgd), health, validity, e1b_health, e1b_validity)
            },
        };

        Ok(Self {
            sv,
            nav,
            week,
            iodnav,
            sisa,
            toc_s,
            toe_s,
            clock: ClockPolynomial {
                bias_s,
                drift_s_s,
                drift_rate_s_s2,
            },
            kepler: Kepler {
                sqrt_a,
                e,
                i0_rad,
                omega_0_rad,
                omega_rad,
                m0_rad,
                delta_n_rad_s,
                i_dot_rad_s,
                omega_dot_rad_s,
                cuc,
                cus,
                crc,
                crs,
                cic,
                cis,
            },
            bgd_e5a_s,
            bgd_e5b_s,
            health,
            data_validity,
            e1b_health,
            e1b_data_validity,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let k = &self.kepler;
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        w.write_u64(12, (self.week % 4096) as u64)?;
        w.write_u64(10, self.iodnav as u64)?;
        w.write_u64(8, self.sisa as u64)?;
        w.write_scaled(14, k.i_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_uscaled(14, self.toc_s, 60.0)?;
        w.write_scaled(6, self.clock.drift_rate_s_s2, P2_59)?;
        w.write_scaled(21, self.clock.drift_s_s, P2_46)?;
        w.write_scaled(31, self.clock.bias_s, P2_34)?;
        w.write_scaled(16, k.crs, P2_5)?;
        w.write_scaled(16, k.delta_n_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(32, k.m0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.cuc, P2_29)?;
        w.write_uscaled(32, k.e, P2_33)?;
        w.write_scaled(16, k.cus, P2_29)?;
        w.write_uscaled(32, k.sqrt_a, P2_19)?;
        w.write_uscaled(14, self.toe_s, 60.0)?;
        w.write_scaled(16, k.cic, P2_29)?;
        w.write_scaled(32, k.omega_0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.cis, P2_29)?;
        w.write_scaled(32, k.i0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.crc, P2_5)?;
        w.write_scaled(32, k.omega_rad, P2_31 * SC2RAD)?;
        w.write_scaled(24, k.omega_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(10, self.bgd_e5a_s, P2_32)?;
        match self.nav {
            GalileoNav::FNav => {
                w.write_u64(2, self.health as u64)?;
                w.write_bool(self.data_validity)?;
                w.skip(7);
            },
            GalileoNav::INav => {
                w.write_scaled(10, self.bgd_e5b_s.unwrap_or_default(), P2_32)?;
                w.write_u64(2, self.health as u64)?;
                w.write_bool(self.data_validity)?;
                w.write_u64(2, self.e1b_health as u64)?;
                w.write_bool(self.e1b_data_validity)?;
                w.skip(2);
            },
        }
        Ok(())
    }

    /// Orbit reference [Epoch]
    pub fn toe(&self) -> Epoch {
        from_week_tow(self.week, self.toe_s, TimeScale::GST)
    }

    /// Clock reference [Epoch]
    pub fn toc(&self) -> Epoch {
        from_week_tow(self.week, self.toc_s, TimeScale::GST)
    }
}
