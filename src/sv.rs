//! Satellite identification: dense indexing and wire SVID conventions.
use crate::Error;
use gnss_rs::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense satellite index, in a single namespace shared by all constellations.
/// Index 0 is never allocated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatIndex(pub u16);

/// Contiguous PRN range allocated to one constellation
struct PrnRange {
    min_prn: u8,
    count: u8,
    base: u16,
}

const GPS: PrnRange = PrnRange {
    min_prn: 1,
    count: 32,
    base: 0,
};

const GLO: PrnRange = PrnRange {
    min_prn: 1,
    count: 27,
    base: 32,
};

const GAL: PrnRange = PrnRange {
    min_prn: 1,
    count: 36,
    base: 59,
};

const BDS: PrnRange = PrnRange {
    min_prn: 1,
    count: 63,
    base: 95,
};

const QZS: PrnRange = PrnRange {
    min_prn: 193,
    count: 10,
    base: 158,
};

const SBS: PrnRange = PrnRange {
    min_prn: 120,
    count: 24,
    base: 168,
};

const IRN: PrnRange = PrnRange {
    min_prn: 1,
    count: 10,
    base: 192,
};

/// Total number of indexed satellites
pub const MAX_SAT: u16 = 202;

fn prn_range(constellation: Constellation) -> Option<&'static PrnRange> {
    match constellation {
        Constellation::GPS => Some(&GPS),
        Constellation::Glonass => Some(&GLO),
        Constellation::Galileo => Some(&GAL),
        Constellation::BeiDou => Some(&BDS),
        Constellation::QZSS => Some(&QZS),
        Constellation::IRNSS => Some(&IRN),
        c if c.is_sbas() => Some(&SBS),
        _ => None,
    }
}

/// Converts a satellite into its dense [SatIndex].
pub fn to_index(sv: SV) -> Result<SatIndex, Error> {
    let range = prn_range(sv.constellation).ok_or(Error::InvalidPrn(sv.constellation, sv.prn))?;
    if sv.prn < range.min_prn || sv.prn - range.min_prn >= range.count {
        return Err(Error::InvalidPrn(sv.constellation, sv.prn));
    }
    Ok(SatIndex(range.base + (sv.prn - range.min_prn) as u16 + 1))
}

/// Converts a [SatIndex] back into a satellite.
/// SBAS vehicles are returned as [Constellation::SBAS].
pub fn from_index(index: SatIndex) -> Option<SV> {
    if index.0 == 0 || index.0 > MAX_SAT {
        return None;
    }
    for (constellation, range) in [
        (Constellation::GPS, &GPS),
        (Constellation::Glonass, &GLO),
        (Constellation::Galileo, &GAL),
        (Constellation::BeiDou, &BDS),
        (Constellation::QZSS, &QZS),
        (Constellation::SBAS, &SBS),
        (Constellation::IRNSS, &IRN),
    ] {
        let rel = index.0 - 1;
        if rel >= range.base && rel < range.base + range.count as u16 {
            return Some(SV::new(constellation, range.min_prn + (rel - range.base) as u8));
        }
    }
    None
}

/// PRN to SVID bias applied on the wire, for this [Constellation].
/// Every message family (MSM, SSR, ephemerides, integrity, network RTK)
/// shares the same convention.
pub const fn svid_offset(constellation: Constellation) -> u8 {
    match constellation {
        Constellation::QZSS => 192,
        Constellation::SBAS => 119,
        _ => 0,
    }
}

/// Builds the satellite designated by `svid`, validating its PRN.
pub fn sv_from_svid(constellation: Constellation, svid: u8) -> Result<SV, Error> {
    let prn = svid
        .checked_add(svid_offset(constellation))
        .ok_or(Error::InvalidPrn(constellation, svid))?;
    let sv = SV::new(constellation, prn);
    to_index(sv)?;
    Ok(sv)
}

/// Returns the wire SVID of `sv`.
pub fn svid_from_sv(sv: SV) -> Result<u8, Error> {
    let constellation = if sv.constellation.is_sbas() {
        Constellation::SBAS
    } else {
        sv.constellation
    };
    sv.prn
        .checked_sub(svid_offset(constellation))
        .ok_or(Error::InvalidPrn(sv.constellation, sv.prn))
}
