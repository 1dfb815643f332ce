//! Orbit and clock corrections
use super::{read_count, read_sv, write_count, write_sv, SsrFlavor, SsrMessage};
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Satellite orbit correction, in the radial/along/cross frame
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbitCorrection {
    /// Issue of data of the broadcast ephemeris this applies to
    pub iode: u32,
    pub radial_m: f64,
    pub along_m: f64,
    pub cross_m: f64,
    pub radial_rate_m_s: f64,
    pub along_rate_m_s: f64,
    pub cross_rate_m_s: f64,
}

/// Satellite clock correction polynomial
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockCorrection {
    pub c0_m: f64,
    pub c1_m_s: f64,
    pub c2_m_s2: f64,
}

/// (width, scale) of the six orbit terms
const ORBIT_FIELDS: [(u32, f64); 6] = [
    (22, 1.0E-4),
    (20, 4.0E-4),
    (20, 4.0E-4),
    (21, 1.0E-6),
    (19, 4.0E-6),
    (19, 4.0E-6),
];

/// (width, scale) of the three clock terms
const CLOCK_FIELDS: [(u32, f64); 3] = [(22, 1.0E-4), (21, 1.0E-6), (27, 2.0E-8)];

fn iode_width(message: &SsrMessage) -> u32 {
    match (message.flavor, message.system()) {
        (SsrFlavor::Igs, _) => 8,
        (_, Constellation::Galileo) => 10,
        (_, Constellation::SBAS) => 24,
        _ => 8,
    }
}

impl OrbitCorrection {
    fn decode(r: &mut BitReader, message: &SsrMessage) -> Result<Self, Error> {
        let iode = r.read_u32(iode_width(message))?;
        let mut terms = [0.0; 6];
        for (term, (width, scale)) in terms.iter_mut().zip(ORBIT_FIELDS) {
            *term = r.read_scaled(width, scale)?;
        }
        Ok(Self {
            iode,
            radial_m: terms[0],
            along_m: terms[1],
            cross_m: terms[2],
            radial_rate_m_s: terms[3],
            along_rate_m_s: terms[4],
            cross_rate_m_s: terms[5],
        })
    }

    fn encode(&self, w: &mut BitWriter, message: &SsrMessage) -> Result<(), Error> {
        w.write_u64(iode_width(message), self.iode as u64)?;
        let terms = [
            self.radial_m,
            self.along_m,
            self.cross_m,
            self.radial_rate_m_s,
            self.along_rate_m_s,
            self.cross_rate_m_s,
        ];
        for (term, (width, scale)) in terms.iter().zip(ORBIT_FIELDS) {
            w.write_scaled(width, *term, scale)?;
        }
        Ok(())
    }
}

impl ClockCorrection {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        Ok(Self {
            c0_m: r.read_scaled(CLOCK_FIELDS[0].0, CLOCK_FIELDS[0].1)?,
            c1_m_s: r.read_scaled(CLOCK_FIELDS[1].0, CLOCK_FIELDS[1].1)?,
            c2_m_s2: r.read_scaled(CLOCK_FIELDS[2].0, CLOCK_FIELDS[2].1)?,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_scaled(CLOCK_FIELDS[0].0, self.c0_m, CLOCK_FIELDS[0].1)?;
        w.write_scaled(CLOCK_FIELDS[1].0, self.c1_m_s, CLOCK_FIELDS[1].1)?;
        w.write_scaled(CLOCK_FIELDS[2].0, self.c2_m_s2, CLOCK_FIELDS[2].1)
    }

    /// Clock correction [m], `dt` seconds past the correction epoch
    pub fn at(&self, dt: f64) -> f64 {
        self.c0_m + self.c1_m_s * dt + self.c2_m_s2 * dt * dt
    }
}

pub(crate) fn decode_orbits(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, OrbitCorrection)>, Error> {
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        satellites.push((sv, OrbitCorrection::decode(r, message)?));
    }
    Ok(satellites)
}

pub(crate) fn encode_orbits(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, OrbitCorrection)],
) -> Result<(), Error> {
    write_count(w, satellites.len())?;
    for (sv, orbit) in satellites {
        write_sv(w, message, *sv)?;
        orbit.encode(w, message)?;
    }
    Ok(())
}

pub(crate) fn decode_clocks(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, ClockCorrection)>, Error> {
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        satellites.push((sv, ClockCorrection::decode(r)?));
    }
    Ok(satellites)
}

pub(crate) fn encode_clocks(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, ClockCorrection)],
) -> Result<(), Error> {
    write_count(w, satellites.len())?;
    for (sv, clock) in satellites {
        write_sv(w, message, *sv)?;
        clock.encode(w)?;
    }
    Ok(())
}

pub(crate) fn decode_combined(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, OrbitCorrection, ClockCorrection)>, Error> {
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        let orbit = OrbitCorrection::decode(r, message)?;
        let clock = ClockCorrection::decode(r)?;
        satellites.push((sv, orbit, clock));
    }
    Ok(satellites)
}

pub(crate) fn encode_combined(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, OrbitCorrection, ClockCorrection)],
) -> Result<(), Error> {
    write_count(w, satellites.len())?;
    for (sv, orbit, clock) in satellites {
        write_sv(w, message, *sv)?;
        orbit.encode(w, message)?;
        clock.encode(w)?;
    }
    Ok(())
}

pub(crate) fn decode_high_rate(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, f64)>, Error> {
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        satellites.push((sv, r.read_scaled(22, 1.0E-4)?));
    }
    Ok(satellites)
}

pub(crate) fn encode_high_rate(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, f64)],
) -> Result<(), Error> {
    write_count(w, satellites.len())?;
    for (sv, clock) in satellites {
        write_sv(w, message, *sv)?;
        w.write_scaled(22, *clock, 1.0E-4)?;
    }
    Ok(())
}
