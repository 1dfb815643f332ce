//! User range accuracy, (class, value) quantized
use super::{read_count, read_sv, write_count, write_sv, SsrMessage};
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};
use gnss_rs::prelude::SV;

lazy_static! {
    /// URA [m] of each 6 bit index (class << 3 | value).
    /// Index 0 means "undefined".
    static ref URA_TABLE: [f64; 64] = {
        let mut table = [0.0; 64];
        for (index, ura) in table.iter_mut().enumerate() {
            let class = (index >> 3) as i32;
            let value = (index & 0x07) as f64;
            *ura = (3.0_f64.powi(class) * (1.0 + value / 4.0) - 1.0) * 1.0E-3;
        }
        table
    };
}

/// Converts a URA (class, value) pair into a standard deviation [m].
/// (0, 0) is undefined and returns None. (7, 7) is the saturated value,
/// meaning the URA exceeds 5466.5 mm.
pub fn decode_ura(class: u8, value: u8) -> Option<f64> {
    let index = ((class & 0x07) << 3 | (value & 0x07)) as usize;
    if index == 0 {
        None
    } else {
        Some(URA_TABLE[index])
    }
}

/// Quantizes a standard deviation [m] to the nearest URA (class, value).
/// Ties go to the larger class. None quantizes to (0, 0).
pub fn quantize_ura(stdev: Option<f64>) -> (u8, u8) {
    let stdev = match stdev {
        Some(stdev) if stdev.is_finite() => stdev,
        _ => return (0, 0),
    };
    let mut best = 1;
    for index in 1..64 {
        if (URA_TABLE[index] - stdev).abs() <= (URA_TABLE[best] - stdev).abs() {
            best = index;
        }
    }
    ((best >> 3) as u8, (best & 0x07) as u8)
}

pub(crate) fn decode_satellites(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, Option<f64>)>, Error> {
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        let class = r.read_u8(3)?;
        let value = r.read_u8(3)?;
        satellites.push((sv, decode_ura(class, value)));
    }
    Ok(satellites)
}

pub(crate) fn encode_satellites(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, Option<f64>)],
) -> Result<(), Error> {
    write_count(w, satellites.len())?;
    for (sv, ura) in satellites {
        write_sv(w, message, *sv)?;
        let (class, value) = quantize_ura(*ura);
        w.write_u64(3, class as u64)?;
        w.write_u64(3, value as u64)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ura_table() {
        for (class, value, expected) in [
            (0, 1, 0.25E-3),
            (1, 0, 2.0E-3),
            (2, 3, 14.75E-3),
            (7, 7, 5466.5E-3),
        ] {
            let ura = decode_ura(class, value).unwrap();
            assert!((ura - expected).abs() < 1e-9, "({}, {})", class, value);
            assert_eq!(quantize_ura(Some(ura)), (class, value));
        }
        assert!(decode_ura(0, 0).is_none());
        assert_eq!(quantize_ura(None), (0, 0));
    }

    #[test]
    fn nearest_entry() {
        // beyond the table
        assert_eq!(quantize_ura(Some(10.0)), (7, 7));
        // between 1.75 mm (0, 7) and 2 mm (1, 0)
        assert_eq!(quantize_ura(Some(1.95E-3)), (1, 0));
        assert_eq!(quantize_ura(Some(1.8E-3)), (0, 7));
        // negative input saturates at the smallest defined entry
        assert_eq!(quantize_ura(Some(-1.0)), (0, 1));
    }
}
