//! Bit level cursors over RTCM payloads.
//!
//! Fields are packed MSB first with no alignment. Signed fields use
//! two's complement unless stated otherwise.
use crate::Error;
use bitvec::prelude::*;

/// MSB first bit view over a payload
pub type Bits = BitSlice<u8, Msb0>;

/// Reads fixed width fields out of a byte buffer.
/// Reading past the end of the buffer is a hard [Error::TruncatedMessage].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a Bits,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new [BitReader] pointing to the first bit of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            bits: buf.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    /// Current bit offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left to read.
    pub fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.pos)
    }

    /// Next `width` bits, cursor is advanced only on success.
    fn take(&mut self, width: usize) -> Result<&'a Bits, Error> {
        let all: &'a Bits = self.bits;
        let bits = all
            .get(self.pos..self.pos + width)
            .ok_or(Error::TruncatedMessage)?;
        self.pos += width;
        Ok(bits)
    }

    /// Skips `width` bits.
    pub fn skip(&mut self, width: usize) -> Result<(), Error> {
        self.take(width).map(|_| ())
    }

    /// Reads an unsigned integer of `width` bits (0 to 64).
    /// A zero width reads nothing and returns 0.
    pub fn read_u64(&mut self, width: u32) -> Result<u64, Error> {
        debug_assert!(width <= 64);
        let bits = self.take(width as usize)?;
        if bits.is_empty() {
            Ok(0)
        } else {
            Ok(bits.load_be::<u64>())
        }
    }

    /// Reads a two's complement signed integer of `width` bits.
    pub fn read_i64(&mut self, width: u32) -> Result<i64, Error> {
        let raw = self.read_u64(width)?;
        if width == 0 || width == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - width;
        Ok(((raw << shift) as i64) >> shift)
    }

    pub fn read_u32(&mut self, width: u32) -> Result<u32, Error> {
        debug_assert!(width <= 32);
        Ok(self.read_u64(width)? as u32)
    }

    pub fn read_u16(&mut self, width: u32) -> Result<u16, Error> {
        debug_assert!(width <= 16);
        Ok(self.read_u64(width)? as u16)
    }

    pub fn read_u8(&mut self, width: u32) -> Result<u8, Error> {
        debug_assert!(width <= 8);
        Ok(self.read_u64(width)? as u8)
    }

    pub fn read_i32(&mut self, width: u32) -> Result<i32, Error> {
        debug_assert!(width <= 32);
        Ok(self.read_i64(width)? as i32)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.take(1)?[0])
    }

    /// Reads a sign-magnitude integer (MSB is the sign bit), as used
    /// by Glonass ephemeris fields.
    pub fn read_sign_magnitude(&mut self, width: u32) -> Result<i64, Error> {
        let bits = self.take(width as usize)?;
        let (sign, magnitude) = bits.split_at(1);
        let magnitude = if magnitude.is_empty() {
            0
        } else {
            magnitude.load_be::<u64>() as i64
        };
        Ok(if sign[0] { -magnitude } else { magnitude })
    }

    /// Reads a signed field and applies `scale`.
    pub fn read_scaled(&mut self, width: u32, scale: f64) -> Result<f64, Error> {
        Ok(self.read_i64(width)? as f64 * scale)
    }

    /// Reads an unsigned field and applies `scale`.
    pub fn read_uscaled(&mut self, width: u32, scale: f64) -> Result<f64, Error> {
        Ok(self.read_u64(width)? as f64 * scale)
    }

    /// Reads a signed field whose most negative value means "not available".
    pub fn read_scaled_opt(&mut self, width: u32, scale: f64) -> Result<Option<f64>, Error> {
        let raw = self.read_i64(width)?;
        if raw == invalid_signed(width) {
            Ok(None)
        } else {
            Ok(Some(raw as f64 * scale))
        }
    }

    /// Reads `len` bytes, whatever the current alignment.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let bits = self.take(len * 8)?;
        Ok(bits.chunks(8).map(|byte| byte.load_be::<u8>()).collect())
    }
}

/// "Not available" pattern of a signed field of `width` bits.
pub(crate) fn invalid_signed(width: u32) -> i64 {
    if width == 0 {
        0
    } else {
        -(1i64 << (width - 1))
    }
}

/// Builds a payload field by field.
/// Values that do not fit their field are rejected with [Error::FieldOverflow]
/// rather than silently truncated.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far.
    pub fn position(&self) -> usize {
        self.bits.len()
    }

    fn push_bits(&mut self, width: usize, value: u64) {
        if width == 0 {
            return;
        }
        let start = self.bits.len();
        self.bits.resize(start + width, false);
        self.bits[start..].store_be(value);
    }

    /// Writes an unsigned integer on `width` bits.
    pub fn write_u64(&mut self, width: u32, value: u64) -> Result<(), Error> {
        debug_assert!(width <= 64);
        if width < 64 && value >> width != 0 {
            return Err(Error::FieldOverflow(width));
        }
        self.push_bits(width as usize, value);
        Ok(())
    }

    /// Writes a two's complement integer on `width` bits.
    pub fn write_i64(&mut self, width: u32, value: i64) -> Result<(), Error> {
        debug_assert!(width <= 64);
        if width == 0 {
            return if value == 0 {
                Ok(())
            } else {
                Err(Error::FieldOverflow(0))
            };
        }
        if width < 64 {
            let min = -(1i64 << (width - 1));
            let max = (1i64 << (width - 1)) - 1;
            if value < min || value > max {
                return Err(Error::FieldOverflow(width));
            }
        }
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        self.push_bits(width as usize, value as u64 & mask);
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.bits.push(value);
        Ok(())
    }

    /// Writes `width` zero bits.
    pub fn skip(&mut self, width: usize) {
        let len = self.bits.len();
        self.bits.resize(len + width, false);
    }

    pub fn write_sign_magnitude(&mut self, width: u32, value: i64) -> Result<(), Error> {
        self.write_bool(value < 0)?;
        self.write_u64(width - 1, value.unsigned_abs())
    }

    /// Quantizes `value` with `scale` into a signed field.
    pub fn write_scaled(&mut self, width: u32, value: f64, scale: f64) -> Result<(), Error> {
        self.write_i64(width, quantize(value, scale)?)
    }

    /// Quantizes `value` with `scale` into an unsigned field.
    pub fn write_uscaled(&mut self, width: u32, value: f64, scale: f64) -> Result<(), Error> {
        let raw = quantize(value, scale)?;
        if raw < 0 {
            return Err(Error::FieldOverflow(width));
        }
        self.write_u64(width, raw as u64)
    }

    /// Writes an optional value, [None] being encoded as the most negative pattern.
    pub fn write_scaled_opt(
        &mut self,
        width: u32,
        value: Option<f64>,
        scale: f64,
    ) -> Result<(), Error> {
        match value {
            Some(value) => {
                let raw = quantize(value, scale)?;
                if raw == invalid_signed(width) {
                    return Err(Error::FieldOverflow(width));
                }
                self.write_i64(width, raw)
            },
            None => self.write_i64(width, invalid_signed(width)),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bits.extend_from_bitslice(bytes.view_bits::<Msb0>());
    }

    /// Returns the payload, last byte zero padded.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let padding = (8 - self.bits.len() % 8) % 8;
        self.skip(padding);
        self.bits.into_vec()
    }
}

fn quantize(value: f64, scale: f64) -> Result<i64, Error> {
    let raw = (value / scale).round();
    if !raw.is_finite() || raw.abs() > i64::MAX as f64 {
        Err(Error::FieldOverflow(64))
    } else {
        Ok(raw as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unsigned_fields() {
        let buf = [0xd3, 0x00, 0x13, 0x3e];
        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_u8(8).unwrap(), 0xd3);
        assert_eq!(r.read_u8(6).unwrap(), 0);
        assert_eq!(r.read_u16(10).unwrap(), 0x13);
        assert_eq!(r.read_u8(4).unwrap(), 0x03);
        assert_eq!(r.remaining(), 4);
        assert!(matches!(r.read_u8(5), Err(Error::TruncatedMessage)));
        // failed read does not move the cursor
        assert_eq!(r.position(), 28);
    }

    #[test]
    fn signed_fields() {
        let mut w = BitWriter::new();
        for (width, value) in [(5, -16), (5, 15), (14, -1), (22, -123456), (38, -1234567890123)] {
            w.write_i64(width, value).unwrap();
        }
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        for (width, value) in [(5, -16), (5, 15), (14, -1), (22, -123456), (38, -1234567890123)] {
            assert_eq!(r.read_i64(width).unwrap(), value);
        }
    }

    #[test]
    fn overflow() {
        let mut w = BitWriter::new();
        assert!(matches!(w.write_u64(4, 16), Err(Error::FieldOverflow(4))));
        assert!(matches!(w.write_i64(4, 8), Err(Error::FieldOverflow(4))));
        assert!(matches!(w.write_i64(4, -9), Err(Error::FieldOverflow(4))));
        assert!(w.write_i64(4, -8).is_ok());
        assert!(w.write_u64(64, u64::MAX).is_ok());
    }

    #[test]
    fn not_available_sentinel() {
        let mut w = BitWriter::new();
        w.write_scaled_opt(22, None, 1.0E-4).unwrap();
        w.write_scaled_opt(22, Some(-0.5), 1.0E-4).unwrap();
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_scaled_opt(22, 1.0E-4).unwrap(), None);
        let v = r.read_scaled_opt(22, 1.0E-4).unwrap().unwrap();
        assert!((v + 0.5).abs() < 1.0E-9);
    }

    #[test]
    fn sign_magnitude() {
        let mut w = BitWriter::new();
        w.write_sign_magnitude(24, -1234).unwrap();
        w.write_sign_magnitude(5, 3).unwrap();
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_sign_magnitude(24).unwrap(), -1234);
        assert_eq!(r.read_sign_magnitude(5).unwrap(), 3);
    }

    #[test]
    fn unaligned_bytes() {
        let mut w = BitWriter::new();
        w.write_u64(3, 5).unwrap();
        w.write_bytes(b"ADVNULLANTENNA");
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_u8(3).unwrap(), 5);
        assert_eq!(r.read_bytes(14).unwrap(), b"ADVNULLANTENNA");
    }

    #[test]
    fn wide_unaligned_fields() {
        let mut w = BitWriter::new();
        w.write_u64(3, 0b101).unwrap();
        w.write_u64(64, 0x8000_0000_0000_0001).unwrap();
        w.write_i64(38, -1).unwrap();
        assert_eq!(w.position(), 105);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 14);
        // zero padded
        assert_eq!(bytes[13] & 0x7f, 0);
        assert_eq!(bytes[0], 0b1011_0000);

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_u8(3).unwrap(), 0b101);
        assert_eq!(r.read_u64(64).unwrap(), 0x8000_0000_0000_0001);
        assert_eq!(r.read_i64(38).unwrap(), -1);
        assert_eq!(r.read_u64(0).unwrap(), 0);
        assert_eq!(r.remaining(), 7);
    }
}
