//! Glonass L1/L2 ephemeris (1020).
//! Most real valued fields are sign-magnitude encoded.
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_11, P2_20, P2_30, P2_31, P2_40},
    sv::{sv_from_svid, svid_from_sv},
    time::resolve_glonass_tod,
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn read_sm(r: &mut BitReader, width: u32, scale: f64) -> Result<f64, Error> {
    Ok(r.read_sign_magnitude(width)? as f64 * scale)
}

fn write_sm(w: &mut BitWriter, width: u32, value: f64, scale: f64) -> Result<(), Error> {
    let raw = (value / scale).round();
    let max = ((1u64 << (width - 1)) - 1) as f64;
    if !raw.is_finite() || raw.abs() > max {
        return Err(Error::FieldOverflow(width));
    }
    w.write_sign_magnitude(width, raw as i64)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassEphemeris {
    pub sv: SV,
    /// Frequency channel number (-7..=13)
    pub frequency_channel: i8,
    /// Almanac health
    pub almanac_health: bool,
    /// Almanac health availability indicator
    pub almanac_health_available: bool,
    /// P1 word
    pub p1: u8,
    /// Frame start time within current day [s]
    pub tk_s: f64,
    /// MSB of Bn word (health)
    pub bn_msb: bool,
    pub p2: bool,
    /// Index of the 15' interval within current day
    pub tb: u8,
    /// ECEF position (PZ-90) [m]
    pub position_m: [f64; 3],
    /// ECEF velocity [m/s]
    pub velocity_m_s: [f64; 3],
    /// Luni-solar acceleration [m/s²]
    pub acceleration_m_s2: [f64; 3],
    pub p3: bool,
    /// Relative frequency bias
    pub gamma_n: f64,
    /// P word
    pub p: u8,
    /// Third string health
    pub ln3: bool,
    /// Clock bias [s]
    pub tau_n_s: f64,
    /// L1/L2 delay difference [s]
    pub delta_tau_n_s: f64,
    /// Age of data [days]
    pub en: u8,
    pub p4: bool,
    /// Predicted user range accuracy index
    pub ft: u8,
    /// Calendar day within 4 year interval
    pub nt: u16,
    /// Satellite type (M)
    pub m: u8,
    /// Availability of the additional data fields
    pub additional_data: bool,
    /// Almanac calendar day
    pub na: u16,
    /// Glonass to UTC(SU) correction [s]
    pub tau_c_s: f64,
    /// 4 year interval number
    pub n4: u8,
    /// Glonass to GPS correction [s]
    pub tau_gps_s: f64,
    /// Fifth string health
    pub ln5: bool,
    /// Reference [Epoch] (tb) in GPST
    pub toe: Epoch,
}

impl GlonassEphemeris {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let slot = r.read_u8(6)?;
        let sv = sv_from_svid(Constellation::Glonass, slot)?;
        let frequency_channel = r.read_u8(5)? as i8 - 7;
        let almanac_health = r.read_bool()?;
        let almanac_health_available = r.read_bool()?;
        let p1 = r.read_u8(2)?;
        let tk_h = r.read_u8(5)? as f64;
        let tk_m = r.read_u8(6)? as f64;
        let tk_30s = r.read_u8(1)? as f64;
        let bn_msb = r.read_bool()?;
        let p2 = r.read_bool()?;
        let tb = r.read_u8(7)?;

        let mut position_m = [0.0; 3];
        let mut velocity_m_s = [0.0; 3];
        let mut acceleration_m_s2 = [0.0; 3];
        for axis in 0..3 {
            velocity_m_s[axis] = read_sm(r, 24, P2_20 * 1.0E3)?;
            position_m[axis] = read_sm(r, 27, P2_11 * 1.0E3)?;
            acceleration_m_s2[axis] = read_sm(r, 5, P2_30 * 1.0E3)?;
        }

        let p3 = r.read_bool()?;
        let gamma_n = read_sm(r, 11, P2_40)?;
        let p = r.read_u8(2)?;
        let ln3 = r.read_bool()?;
        let tau_n_s = read_sm(r, 22, P2_30)?;
        let delta_tau_n_s = read_sm(r, 5, P2_30)?;
        let en = r.read_u8(5)?;
        let p4 = r.read_bool()?;
        let ft = r.read_u8(4)?;
        let nt = r.read_u16(11)?;
        let m = r.read_u8(2)?;
        let additional_data = r.read_bool()?;
        let na = r.read_u16(11)?;
        let tau_c_s = read_sm(r, 32, P2_31)?;
        let n4 = r.read_u8(5)?;
        let tau_gps_s = read_sm(r, 22, P2_30)?;
        let ln5 = r.read_bool()?;
        r.skip(7)?;

        // tb counts 15' intervals of the Moscow day
        let toe = resolve_glonass_tod(reference, tb as f64 * 900.0);

        Ok(Self {
            sv,
            frequency_channel,
            almanac_health,
            almanac_health_available,
            p1,
            tk_s: tk_h * 3600.0 + tk_m * 60.0 + tk_30s * 30.0,
            bn_msb,
            p2,
            tb,
            position_m,
            velocity_m_s,
            acceleration_m_s2,
            p3,
            gamma_n,
            p,
            ln3,
            tau_n_s,
            delta_tau_n_s,
            en,
            p4,
            ft,
            nt,
            m,
            additional_data,
            na,
            tau_c_s,
            n4,
            tau_gps_s,
            ln5,
            toe,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(6, svid_from_sv(self.sv)? as u64)?;
        let fcn = self.frequency_channel as i16 + 7;
        if !(0..32).contains(&fcn) {
            return Err(Error::FieldOverflow(5));
        }
        w.write_u64(5, fcn as u64)?;
        w.write_bool(self.almanac_health)?;
        w.write_bool(self.almanac_health_available)?;
        w.write_u64(2, self.p1 as u64)?;

        let tk = self.tk_s.round() as u64;
        w.write_u64(5, tk / 3600)?;
        w.write_u64(6, (tk % 3600) / 60)?;
        w.write_u64(1, (tk % 60) / 30)?;
        w.write_bool(self.bn_msb)?;
        w.write_bool(self.p2)?;
        w.write_u64(7, self.tb as u64)?;

        for axis in 0..3 {
            write_sm(w, 24, self.velocity_m_s[axis], P2_20 * 1.0E3)?;
            write_sm(w, 27, self.position_m[axis], P2_11 * 1.0E3)?;
            write_sm(w, 5, self.acceleration_m_s2[axis], P2_30 * 1.0E3)?;
        }

        w.write_bool(self.p3)?;
        write_sm(w, 11, self.gamma_n, P2_40)?;
        w.write_u64(2, self.p as u64)?;
        w.write_bool(self.ln3)?;
        write_sm(w, 22, self.tau_n_s, P2_30)?;
        write_sm(w, 5, self.delta_tau_n_s, P2_30)?;
        w.write_u64(5, self.en as u64)?;
        w.write_bool(self.p4)?;
        w.write_u64(4, self.ft as u64)?;
        w.write_u64(11, self.nt as u64)?;
        w.write_u64(2, self.m as u64)?;
        w.write_bool(self.additional_data)?;
        w.write_u64(11, self.na as u64)?;
        write_sm(w, 32, self.tau_c_s, P2_31)?;
        w.write_u64(5, self.n4 as u64)?;
        write_sm(w, 22, self.tau_gps_s, P2_30)?;
        w.write_bool(self.ln5)?;
        w.skip(7);
        Ok(())
    }

    /// Issue of data, derived from tb
    pub fn iode(&self) -> u8 {
        self.tb & 0x7f
    }

    /// True when the satellite is declared healthy (Bn MSB cleared)
    pub fn is_healthy(&self) -> bool {
        !self.bn_msb
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::{from_week_tow, glonass_dow_tod};
    use hifitime::TimeScale;

    #[test]
    fn glonass_l1l2() {
        let reference = from_week_tow(2300, 300_000.0, TimeScale::GPST);
        let (_, tod) = glonass_dow_tod(reference);
        let tb = (tod / 900.0).floor() as u8;

        let eph = GlonassEphemeris {
            sv: SV::new(Constellation::Glonass, 9),
            frequency_channel: -2,
            almanac_health: true,
            almanac_health_available: true,
            p1: 0,
            tk_s: 3600.0 * 5.0 + 60.0 * 12.0 + 30.0,
            bn_msb: false,
            p2: true,
            tb,
            position_m: [-14_000_123.0, 6_500_000.5, 20_123_456.0],
            velocity_m_s: [1_234.5, -2_999.75, 0.125],
            acceleration_m_s2: [0.0, -P2_30 * 1.0E3, 2.0 * P2_30 * 1.0E3],
            p3: false,
            gamma_n: -3.0 * P2_40,
            p: 3,
            ln3: false,
            tau_n_s: -1200.0 * P2_30,
            delta_tau_n_s: 2.0 * P2_30,
            en: 0,
            p4: false,
            ft: 2,
            nt: 1000,
            m: 1,
            additional_data: true,
            na: 1000,
            tau_c_s: 20.0 * P2_31,
            n4: 8,
            tau_gps_s: -5.0 * P2_30,
            ln5: false,
            toe: reference,
        };

        let mut w = BitWriter::new();
        eph.encode(&mut w).unwrap();
        assert_eq!(w.position(), 360 - 12);

        let buf = w.into_bytes();
        let mut r = BitReader::new(&buf);
        let decoded = GlonassEphemeris::decode(&mut r, reference).unwrap();
        assert_eq!(decoded.sv, eph.sv);
        assert_eq!(decoded.frequency_channel, -2);
        assert_eq!(decoded.tk_s, eph.tk_s);
        assert_eq!(decoded.iode(), tb);
        assert_eq!(decoded.gamma_n, eph.gamma_n);
        assert_eq!(decoded.tau_n_s, eph.tau_n_s);
        assert_eq!(decoded.tau_gps_s, eph.tau_gps_s);
        assert!(decoded.is_healthy());
        for axis in 0..3 {
            assert!((decoded.position_m[axis] - eph.position_m[axis]).abs() <= P2_11 * 1.0E3);
            assert!((decoded.velocity_m_s[axis] - eph.velocity_m_s[axis]).abs() <= P2_20 * 1.0E3);
        }
        assert_eq!(decoded.acceleration_m_s2, eph.acceleration_m_s2);

        // tb is a Moscow time of day, 15' resolution
        let (_, toe_tod) = glonass_dow_tod(decoded.toe);
        assert!((toe_tod - tb as f64 * 900.0).abs() < 1.0E-3);
    }

    #[test]
    fn sign_magnitude_fields() {
        let mut w = BitWriter::new();
        write_sm(&mut w, 5, -3.0, 1.0).unwrap();
        assert!(write_sm(&mut w, 5, 16.0, 1.0).is_err());
        let buf = w.into_bytes();
        // 1_0011
        assert_eq!(buf[0] >> 3, 0b10011);
        let mut r = BitReader::new(&buf);
        assert_eq!(read_sm(&mut r, 5, 1.0).unwrap(), -3.0);
    }

    #[test]
    fn extreme_values() {
        use crate::ephemeris::test::{assert_extremes, Field::*};
        // tk held at 23:59:30
        assert_extremes(
            1020,
            &[
                Fixed(6, 3), U(5), U(1), U(1), U(2), Fixed(5, 23), Fixed(6, 59), Fixed(1, 1),
                U(1), U(1), U(7),
                M(24), M(27), M(5), M(24), M(27), M(5), M(24), M(27), M(5),
                U(1), M(11), U(2), U(1), M(22), M(5), U(5), U(1), U(4), U(11),
                U(2), U(1), U(11), M(32), U(5), M(22), U(1), Fixed(7, 0),
            ],
        );
    }
}
