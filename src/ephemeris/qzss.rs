//! QZSS LNAV ephemeris (1044). Same content as GPS, different layout.
use super::{ClockPolynomial, GpsEphemeris, Kepler};
use crate::{
    bits::{BitReader, BitWriter},
    constants::{P2_19, P2_29, P2_31, P2_33, P2_43, P2_5, P2_55, SC2RAD},
    sv::{sv_from_svid, svid_from_sv},
    time::adjust_week,
    Error,
};
use gnss_rs::prelude::Constellation;
use hifitime::{Epoch, TimeScale};

pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<GpsEphemeris, Error> {
    let svid = r.read_u8(4)?;
    let sv = sv_from_svid(Constellation::QZSS, svid)?;
    let toc_s = r.read_uscaled(16, 16.0)?;
    let drift_rate_s_s2 = r.read_scaled(8, P2_55)?;
    let drift_s_s = r.read_scaled(16, P2_43)?;
    let bias_s = r.read_scaled(22, P2_31)?;
    let iode = r.read_u8(8)?;
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
    let i_dot_rad_s = r.read_scaled(14, P2_43 * SC2RAD)?;
    let l2_codes = r.read_u8(2)?;
    let week = adjust_week(r.read_u32(10)?, 1024, reference, TimeScale::GPST);
    let ura_index = r.read_u8(4)?;
    let health = r.read_u8(6)?;
    let tgd_s = r.read_scaled(8, P2_31)?;
    let iodc = r.read_u16(10)?;
    let fit_interval = r.read_bool()?;
    Ok(GpsEphemeris {
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
        l2p_data_flag: false,
        fit_interval,
    })
}

pub(crate) fn encode(eph: &GpsEphemeris, w: &mut BitWriter) -> Result<(), Error> {
    let k = &eph.kepler;
    w.write_u64(4, svid_from_sv(eph.sv)? as u64)?;
    w.write_uscaled(16, eph.toc_s, 16.0)?;
    w.write_scaled(8, eph.clock.drift_rate_s_s2, P2_55)?;
    w.write_scaled(16, eph.clock.drift_s_s, P2_43)?;
    w.write_scaled(22, eph.clock.bias_s, P2_31)?;
    w.write_u64(8, eph.iode as u64)?;
    w.write_scaled(16, k.crs, P2_5)?;
    w.write_scaled(16, k.delta_n_rad_s, P2_43 * SC2RAD)?;
    w.write_scaled(32, k.m0_rad, P2_31 * SC2RAD)?;
    w.write_scaled(16, k.cuc, P2_29)?;
    w.write_uscaled(32, k.e, P2_33)?;
    w.write_scaled(16, k.cus, P2_29)?;
    w.write_uscaled(32, k.sqrt_a, P2_19)?;
    w.write_uscaled(16, eph.toe_s, 16.0)?;
    w.write_scaled(16, k.cic, P2_29)?;
    w.write_scaled(32, k.omega_0_rad, P2_31 * SC2RAD)?;
    w.write_scaled(16, k.cis, P2_29)?;
    w.write_scaled(32, k.i0_rad, P2_31 * SC2RAD)?;
    w.write_scaled(16, k.crc, P2_5)?;
    w.write_scaled(32, k.omega_rad, P2_31 * SC2RAD)?;
    w.write_scaled(24, k.omega_dot_rad_s, P2_43 * SC2RAD)?;
    w.write_scaled(14, k.i_dot_rad_s, P2_43 * SC2RAD)?;
    w.write_u64(2, eph.l2_codes as u64)?;
    w.write_u64(10, (eph.week % 1024) as u64)?;
    w.write_u64(4, eph.ura_index as u64)?;
    w.write_u64(6, eph.health as u64)?;
    w.write_scaled(8, eph.tgd_s, P2_31)?;
    w.write_u64(10, eph.iodc as u64)?;
    w.write_bool(eph.fit_interval)
}
