//! Bit masks to index lists.
//!
//! Masks are read MSB first: bit `k` (0 being the most significant of
//! the `width` bit field) stands for index `k + offset`.
use crate::{bits::BitReader, bits::BitWriter, Error};

/// Expands a `width` bit mask into the ascending list of present indices.
pub fn decode_mask(bits: u64, width: u32, offset: u32) -> (Vec<u32>, usize) {
    let indices: Vec<u32> = (0..width)
        .filter(|k| (bits >> (width - 1 - k)) & 0x01 == 1)
        .map(|k| k + offset)
        .collect();
    let count = indices.len();
    (indices, count)
}

/// Packs `indices` into a `width` bit mask.
/// Every index must lie within `[offset, offset + width)`.
pub fn encode_mask(indices: &[u32], width: u32, offset: u32) -> Result<u64, Error> {
    let mut bits = 0u64;
    for index in indices {
        if *index < offset || *index - offset >= width {
            return Err(Error::FieldOverflow(width));
        }
        bits |= 1u64 << (width - 1 - (*index - offset));
    }
    Ok(bits)
}

/// Reads a `width` bit mask and expands it.
pub(crate) fn read_mask(r: &mut BitReader, width: u32, offset: u32) -> Result<Vec<u32>, Error> {
    let bits = r.read_u64(width)?;
    Ok(decode_mask(bits, width, offset).0)
}

/// Packs and writes a `width` bit mask.
pub(crate) fn write_mask(
    w: &mut BitWriter,
    indices: &[u32],
    width: u32,
    offset: u32,
) -> Result<(), Error> {
    let bits = encode_mask(indices, width, offset)?;
    w.write_u64(width, bits)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn msb_first() {
        let (indices, count) = decode_mask(0b1010_0001, 8, 1);
        assert_eq!(indices, vec![1, 3, 8]);
        assert_eq!(count, 3);

        let (indices, _) = decode_mask(1 << 63, 64, 193);
        assert_eq!(indices, vec![193]);

        let (indices, count) = decode_mask(0, 16, 0);
        assert!(indices.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn random_masks() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let width = rng.gen_range(1..=64);
            let offset = rng.gen_range(0..200);
            let mut indices: Vec<u32> = (offset..offset + width)
                .filter(|_| rng.gen_bool(0.3))
                .collect();
            indices.sort();
            let bits = encode_mask(&indices, width, offset).unwrap();
            assert_eq!(decode_mask(bits, width, offset), (indices.clone(), indices.len()));
        }
    }

    #[test]
    fn out_of_range_index() {
        assert!(encode_mask(&[0], 8, 1).is_err());
        assert!(encode_mask(&[9], 8, 1).is_err());
        assert_eq!(encode_mask(&[8], 8, 1).unwrap(), 1);
    }
}
