//! BeiDou D1/D2 ephemeris (1042)
use super::{ClockPolynomial, Kepler};
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_19, P2_31, P2_33, P2_43, P2_50, P2_6, P2_66, SC2RAD},
    sv::{sv_from_svid, svid_from_sv},
    time::{adjust_week, from_week_tow},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BdsEphemeris {
    pub sv: SV,
    /// Full BDT week counter
    pub week: u32,
    /// URA index
    pub ura_index: u8,
    /// Age of data, ephemeris
    pub aode: u8,
    /// Age of data, clock
    pub aodc: u8,
    /// Clock reference time of week [s] (BDT)
    pub toc_s: f64,
    /// Orbit reference time of week [s] (BDT)
    pub toe_s: f64,
    pub clock: ClockPolynomial,
    pub kepler: Kepler,
    /// B1I group delay [s]
    pub tgd1_s: f64,
    /// B2I group delay [s]
    pub tgd2_s: f64,
    /// Autonomous satellite health flag
    pub unhealthy: bool,
}

impl BdsEphemeris {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let prn = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::BeiDou, prn)?;
        let week = adjust_week(r.read_u32(13)?, 8192, reference, TimeScale::BDT);
        let ura_index = r.read_u8(4)?;
        let i_dot_rad_s = r.read_scaled(14, P2_43 * SC2RAD)?;
        let aode = r.read_u8(5)?;
        let toc_s = r.read_uscaled(17, 8.0)?;
        let drift_rate_s_s2 = r.read_scaled(11, P2_66)?;
        let drift_s_s = r.read_scaled(22, P2_50)?;
        let bias_s = r.read_scaled(24, P2_33)?;
        let aodc = r.read_u8(5)?;
        let crs = r.read_scaled(18, P2_6)?;
        let delta_n_rad_s = r.read_scaled(16, P2_43 * SC2RAD)?;
        let m0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cuc = r.read_scaled(18, P2_31)?;
        let e = r.read_uscaled(32, P2_33)?;
        let cus = r.read_scaled(18, P2_31)?;
        let sqrt_a = r.read_uscaled(32, P2_19)?;
        let toe_s = r.read_uscaled(17, 8.0)?;
        let cic = r.read_scaled(18, P2_31)?;
        let omega_0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cis = r.read_scaled(18, P2_31)?;
        let i0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let crc = r.read_scaled(18, P2_6)?;
        let omega_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let omega_dot_rad_s = r.read_scaled(24, P2_43 * SC2RAD)?;
        let tgd1_s = r.read_scaled(10, 1.0E-10)?;
        let tgd2_s = r.read_scaled(10, 1.0E-10)?;
        let unhealthy = r.read_bool()?;
        Ok(Self {
            sv,
            week,
            ura_index,
            aode,
            aodc,
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
            tgd1_s,
            tgd2_s,
            unhealthy,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let k = &self.kepler;
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        w.write_u64(13, (self.week % 8192) as u64)?;
        w.write_u64(4, self.ura_index as u64)?;
        w.write_scaled(14, k.i_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_u64(5, self.aode as u64)?;
        w.write_uscaled(17, self.toc_s, 8.0)?;
        w.write_scaled(11, self.clock.drift_rate_s_s2, P2_66)?;
        w.write_scaled(22, self.clock.drift_s_s, P2_50)?;
        w.write_scaled(24, self.clock.bias_s, P2_33)?;
        w.write_u64(5, self.aodc as u64)?;
        w.write_scaled(18, k.crs, P2_6)?;
        w.write_scaled(16, k.delta_n_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(32, k.m0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(18, k.cuc, P2_31)?;
        w.write_uscaled(32, k.e, P2_33)?;
        w.write_scaled(18, k.cus, P2_31)?;
        w.write_uscaled(32, k.sqrt_a, P2_19)?;
        w.write_uscaled(17, self.toe_s, 8.0)?;
        w.write_scaled(18, k.cic, P2_31)?;
        w.write_scaled(32, k.omega_0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(18, k.cis, P2_31)?;
        w.write_scaled(32, k.i0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(18, k.crc, P2_6)?;
        w.write_scaled(32, k.omega_rad, P2_31 * SC2RAD)?;
        w.write_scaled(24, k.omega_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(10, self.tgd1_s, 1.0E-10)?;
        w.write_scaled(10, self.tgd2_s, 1.0E-10)?;
        w.write_bool(self.unhealthy)
    }

    /// Orbit reference [Epoch]
    pub fn toe(&self) -> Epoch {
        from_week_tow(self.week, self.toe_s, TimeScale::BDT)
    }

    /// Clock reference [Epoch]
    pub fn toc(&self) -> Epoch {
        from_week_tow(self.week, self.toc_s, TimeScale::BDT)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::week_tow;

    #[test]
    fn bds_d1() {
        let reference = from_week_tow(2300, 0.0, TimeScale::GPST);
        let (bdt_week, _) = week_tow(reference, TimeScale::BDT);
        let eph = BdsEphemeris {
            sv: SV::new(Constellation::BeiDou, 59),
            week: bdt_week,
            aode: 1,
            aodc: 1,
            toc_s: 8.0 * 1000.0,
            toe_s: 8.0 * 1000.0,
            clock: ClockPolynomial {
                bias_s: -100.0 * P2_33,
                drift_s_s: 5.0 * P2_50,
                drift_rate_s_s2: -3.0 * P2_66,
            },
            tgd1_s: 2.1E-9,
            tgd2_s: -1.0E-9,
            unhealthy: true,
            ..Default::default()
        };

        let mut w = BitWriter::new();
        eph.encode(&mut w).unwrap();
        assert_eq!(w.position(), 511 - 12);

        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        let decoded = BdsEphemeris::decode(&mut r, reference).unwrap();
        assert_eq!(decoded.sv, eph.sv);
        assert_eq!(decoded.week, bdt_week);
        assert_eq!(decoded.clock.drift_rate_s_s2, -3.0 * P2_66);
        assert!((decoded.tgd1_s - 2.1E-9).abs() < 1.0E-12);
        assert!(decoded.unhealthy);
        assert_eq!(decoded.toe(), eph.toe());
    }

    #[test]
    fn extreme_values() {
        use crate::ephemeris::test::{assert_extremes, Field::*};
        assert_extremes(
            1042,
            &[
                Fixed(6, 7), U(13), U(4), S(14), U(5), U(17), S(11), S(22), S(24), U(5),
                S(18), S(16), S(32), S(18), U(32), S(18), U(32), U(17), S(18), S(32),
                S(18), S(32), S(18), S(32), S(24), S(10), S(10), U(1),
            ],
        );
    }
}
