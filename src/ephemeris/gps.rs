//! GPS LNAV ephemeris (1019)
use super::{ClockPolynomial, Kepler};
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_19, P2_29, P2_31, P2_33, P2_43, P2_5, P2_55, SC2RAD},
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
pub struct GpsEphemeris {
    pub sv: SV,
    /// Full week counter, disambiguated
    pub week: u32,
    /// URA index
    pub ura_index: u8,
    /// Codes on L2 channel
    pub l2_codes: u8,
    pub iode: u8,
    pub iodc: u16,
    /// Clock reference time of week [s]
    pub toc_s: f64,
    /// Orbit reference time of week [s]
    pub toe_s: f64,
    pub clock: ClockPolynomial,
    pub kepler: Kepler,
    /// Group delay [s]
    pub tgd_s: f64,
    /// SV health code
    pub health: u8,
    /// L2P data flag
    pub l2p_data_flag: bool,
    /// Curve fit interval flag
    pub fit_interval: bool,
}

impl GpsEphemeris {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let prn = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::GPS, prn)?;
        let week = adjust_week(r.read_u32(10)?, 1024, reference, TimeScale::GPST);
        let ura_index = r.read_u8(4)?;
        let l2_codes = r.read_u8(2)?;
        let i_dot_rad_s = r.read_scaled(14, P2_43 * SC2RAD)?;
        let iode = r.read_u8(8)?;
        let toc_s = r.read_uscaled(16, 16.0)?;
        let drift_rate_s_s2 = r.read_scaled(8, P2_55)?;
        let drift_s_s = r.read_scaled(16, P2_43)?;
        let bias_s = r.read_scaled(22, P2_31)?;
        let iodc = r.read_u16(10)?;
        let crs = r.read_scaled(16, P2_5)?;
        let delta_n_rad_s = r.read_scaled(16, P2_43 * SC2RAD)?;
        let m0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cuc = r.read_scaled(16, P2_29)?;
        let e = r.read_uscaled(32, P2_33)?;
        let cus = r.read_scaled(16, P2_29)?;
        let sqrt_a = r.read_uscaled(32, P2_19)?;
        let toe_s = r.read_uscaled(16, 16.0)?;
        let cic = r.read_scaled(16, P2_29)?;
        let omega_0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let cis = r.read_scaled(16, P2_29)?;
        let i0_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let crc = r.read_scaled(16, P2_5)?;
        let omega_rad = r.read_scaled(32, P2_31 * SC2RAD)?;
        let omega_dot_rad_s = r.read_scaled(24, P2_43 * SC2RAD)?;
        let tgd_s = r.read_scaled(8, P2_31)?;
        let health = r.read_u8(6)?;
        let l2p_data_flag = r.read_bool()?;
        let fit_interval = r.read_bool()?;
        Ok(Self {
            sv,
            week,
            ura_index,
            l2_codes,
            iode,
            iodc,
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
            l2p_data_flag,
            fit_interval,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let k = &self.kepler;
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        w.write_u64(10, (self.week % 1024) as u64)?;
        w.write_u64(4, self.ura_index as u64)?;
        w.write_u64(2, self.l2_codes as u64)?;
        w.write_scaled(14, k.i_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_u64(8, self.iode as u64)?;
        w.write_uscaled(16, self.toc_s, 16.0)?;
        w.write_scaled(8, self.clock.drift_rate_s_s2, P2_55)?;
        w.write_scaled(16, self.clock.drift_s_s, P2_43)?;
        w.write_scaled(22, self.clock.bias_s, P2_31)?;
        w.write_u64(10, self.iodc as u64)?;
        w.write_scaled(16, k.crs, P2_5)?;
        w.write_scaled(16, k.delta_n_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(32, k.m0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.cuc, P2_29)?;
        w.write_uscaled(32, k.e, P2_33)?;
        w.write_scaled(16, k.cus, P2_29)?;
        w.write_uscaled(32, k.sqrt_a, P2_19)?;
        w.write_uscaled(16, self.toe_s, 16.0)?;
        w.write_scaled(16, k.cic, P2_29)?;
        w.write_scaled(32, k.omega_0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.cis, P2_29)?;
        w.write_scaled(32, k.i0_rad, P2_31 * SC2RAD)?;
        w.write_scaled(16, k.crc, P2_5)?;
        w.write_scaled(32, k.omega_rad, P2_31 * SC2RAD)?;
        w.write_scaled(24, k.omega_dot_rad_s, P2_43 * SC2RAD)?;
        w.write_scaled(8, self.tgd_s, P2_31)?;
        w.write_u64(6, self.health as u64)?;
        w.write_bool(self.l2p_data_flag)?;
        w.write_bool(self.fit_interval)
    }

    /// Orbit reference [Epoch]
    pub fn toe(&self) -> Epoch {
        from_week_tow(self.week, self.toe_s, TimeScale::GPST)
    }

    /// Clock reference [Epoch]
    pub fn toc(&self) -> Epoch {
        from_week_tow(self.week, self.toc_s, TimeScale::GPST)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sv::{to_index, SatIndex};

    /// 1019 body with PRN=5, IODE=10, week=512
    fn payload() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_u64(12, 1019).unwrap();
        // (width, raw value, signed)
        for (width, value, signed) in [
            (6, 5, false),
            (10, 512, false),
            (4, 2, false),
            (2, 1, false),
            (14, -35, true),
            (8, 10, false),
            (16, 2700, false),
            (8, 0, true),
            (16, -12, true),
            (22, 123456, true),
            (10, 10, false),
            (16, -1520, true),
            (16, 12000, true),
            (32, -1_123_456_789, true),
            (16, -2000, true),
            (32, 54_000_000, false),
            (16, 3100, true),
            (32, 2_702_000_000, false),
            (16, 2700, false),
            (16, 22, true),
            (32, 987_654_321, true),
            (16, -7, true),
            (32, 650_000_000, true),
            (16, 8000, true),
            (32, -400_000_000, true),
            (24, -22000, true),
            (8, -11, true),
            (6, 0, false),
            (1, 0, false),
            (1, 0, false),
        ] {
            if signed {
                w.write_i64(width, value).unwrap();
            } else {
                w.write_u64(width, value as u64).unwrap();
            }
        }
        assert_eq!(w.position(), 488);
        w.into_bytes()
    }

    #[test]
    fn gps_lnav() {
        let reference = from_week_tow(2300, 0.0, TimeScale::GPST);
        let buf = payload();
        assert_eq!(buf.len(), 61);

        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_u16(12).unwrap(), 1019);
        let eph = GpsEphemeris::decode(&mut r, reference).unwrap();

        assert_eq!(eph.sv, SV::new(Constellation::GPS, 5));
        assert_eq!(to_index(eph.sv).unwrap(), SatIndex(5));
        assert_eq!(eph.iode, 10);
        assert_eq!(eph.iodc, 10);
        assert_eq!(eph.week, 2560);
        assert_eq!(eph.toe_s, 2700.0 * 16.0);
        assert_eq!(eph.toc_s, 2700.0 * 16.0);
        assert!((eph.clock.bias_s - 123456.0 * P2_31).abs() < 1.0E-15);
        assert!((eph.kepler.sqrt_a - 2_702_000_000.0 * P2_19).abs() < 1.0E-9);
        assert!((eph.kepler.e - 54_000_000.0 * P2_33).abs() < 1.0E-15);

        let mut w = BitWriter::new();
        w.write_u64(12, 1019).unwrap();
        eph.encode(&mut w).unwrap();
        assert_eq!(w.into_bytes(), buf);
    }

    #[test]
    fn truncated() {
        let reference = from_week_tow(2300, 0.0, TimeScale::GPST);
        let buf = payload();
        let mut r = BitReader::new(&buf[..40]);
        r.read_u16(12).unwrap();
        assert!(matches!(
            GpsEphemeris::decode(&mut r, reference),
            Err(Error::TruncatedMessage)
        ));
    }

    #[test]
    fn extreme_values() {
        use crate::ephemeris::test::{assert_extremes, Field::*};
        assert_extremes(
            1019,
            &[
                Fixed(6, 5), U(10), U(4), U(2), S(14), U(8), U(16), S(8), S(16), S(22),
                U(10), S(16), S(16), S(32), S(16), U(32), S(16), U(32), U(16), S(16),
                S(32), S(16), S(32), S(16), S(32), S(24), S(8), U(6), U(1), U(1),
            ],
        );
    }
}
