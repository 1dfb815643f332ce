//! NavIC (IRNSS) ephemeris (1041)
use super::{ClockPolynomial, Kepler};
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_19, P2_28, P2_31, P2_33, P2_41, P2_43, P2_55, SC2RAD},
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
pub struct NavicEphemeris {
    pub sv: SV,
    /// Full week counter
    pub week: u32,
    pub ura_index: u8,
    /// Issue of data, ephemeris and clock
    pub iodec: u8,
    pub toc_s: f64,
    pub toe_s: f64,
    pub clock: ClockPolynomial,
    pub kepler: Kepler,
    /// Group delay [s]
    pub tgd_s: f64,
    /// L5 and S health flags
    pub health: u8,
}

impl NavicEphemeris {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let prn = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::IRNSS, prn)?;
        let week = adjust_week(r.read_u32(10)?, 1024, reference, TimeScale::GST);
        let bias_s = r.read_scaled(22, P2_31)?;
        let drift_s_s = r.read_scaled(16, P2_43)?;
        let drift_rate_s_s2 = r.read_scaled(8, P2_55)?;
        let ura_index = r.read_u8(4)?;
        let toc_s = r.read_uscaled(16, 16.0)?;
        let tgd_s = r.read_scaled(8, P2_31)?;
        let delta_n_rad_s = r.read_scaled(22, P2_41 * SC2RAD)?;
        let iodec = r.read_u8(8)?;
        r.skip(10)?;
        let health = r.read_u8(2)?;
        let cuc = r.read_scaled(15, P2_28)?;
        let cus = r.read_scaled(15, P2_28)?;
        let cic = r.read_scaled(15, P2_28)?;
        let cis = r.read_scaled(15, P2_28)?;
        let crc = r.read_scaled(15, 0.0625)?;
        let crs = r.read_scaled(15, 0.0625)?;
        let i_dot_rad_s = r.read_scaled(14, P2_43 * SC2RAD)?;
        let m0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let toe_s = r.read_uscaled(16, 16.0)?;
        let e = r.read_uscaled(32, P2_33)?;
        let sqrt_a = r.read_uscaled(32, P2_19)?;
        let omega_0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let omega_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let omega_dot_rad_s = r.read_scaled(22, P2_41 * SC2RAD)?;
        let i0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        r.skip(4)?;
        Ok(Self {
            sv,
            week,
            ura_index,
            iodec,
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
            tgd_s,
            health,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let k = &self.kepler;
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        w.write_u64(10, (self.week % 1024) as u64)?;
        w.write_scaled(22, self.clock.bias_s, P2_31)?;
        w.write_scaled(16, self.clock.drift_s_s, P2_43)?;
        w.write_scaled(8, self.clock.drift_rate_s_s2, P2_55)?;
        w.write_u64(4, self.ura_index as u64)?;
        w.write_uscaled(16, self.toc_s, 16.0)?;
        w.write_scaled(8, self.tgd_s, P2_31)?;
        w.write_scaled(22, k.delta_n_rad_s, P2_41 * SC2RAD)?;
        w.write_u64(8, self.iodec as u64)?;
        w.skip(10);
        w.write_u64(2, self.health as u64)?;
        w.write_scaled(15, k.cuc, P2_28)?;
        w.write_scaled(15, k.cus, P2_28)?;
        w.write_scaled(15, k.cic, P2_28)?;
        w.write_scaled(15, k.cis, P2_28)?;
        w.write_scaled(15, k.crc, 0.0625)?;
        w.write_scaled(15, k.crs, 0.0625)?;
        w.write_scaled(14, k.i_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(32, k.m0_rad, P2_31 * SC2RAD)?;
        w.write_uscaled(16, self.toe_s, 16.0)?;
        w.write_uscaled(32, k.e, P2_33)?;
        w.write_uscaled(32, k.sqrt_a, P2_19)?;
        w.write_scaled(32, k.omega_0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(32, k.omega_rad, P2_31 * SC2RAD)?;
        w.write_scaled(22, k.omega_dot_rad_s, P2_41 * SC2RAD)?;
        w.write_scaled(32, k.i0_rad, P2_31 * SC2RAD)?;
        w.skip(4);
        Ok(())
    }

    pub fn toe(&self) -> Epoch {
        from_week_tow(self.week, self.toe_s, TimeScale::GST)
    }

    pub fn toc(&self) -> Epoch {
        from_week_tow(self.week, self.toc_s, TimeScale::GST)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::week_tow;

    #[test]
    fn navic() {
        let reference = from_week_tow(2300, 0.0, TimeScale::GPST);
        let (week, _) = week_tow(reference, TimeScale::GST);
        let eph = NavicEphemeris {
            sv: SV::new(Constellation::IRNSS, 3),
            week,
            iodec: 77,
            toe_s: 16.0 * 300.0,
            toc_s: 16.0 * 300.0,
            kepler: Kepler {
                crc: -12.5,
                crs: 100.0625,
                ..Default::default()
            },
            health: 2,
            ..Default::default()
        };
        let mut w = BitWriter::new();
        eph.encode(&mut w).unwrap();
        assert_eq!(w.position(), 482 - 12);

        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        let decoded = NavicEphemeris::decode(&mut r, reference).unwrap();
        assert_eq!(decoded, eph);
    }

    #[test]
    fn extreme_values() {
        use crate::ephemeris::test::{assert_extremes, Field::*};
        assert_extremes(
            1041,
            &[
                Fixed(6, 3), U(10), S(22), S(16), S(8), U(4), U(16), S(8), S(22), U(8),
                Fixed(10, 0), U(2), S(15), S(15), S(15), S(15), S(15), S(15), S(14), S(32),
                U(16), U(32), U(32), S(32), S(32), S(22), S(32), Fixed(4, 0),
            ],
        );
    }
}
