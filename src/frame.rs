//! RTCM3 transport layer: preamble, length and CRC-24Q.
use crate::Error;
use crc::{Crc, CRC_24_LTE_A};

/// Frame synchronization byte
pub const PREAMBLE: u8 = 0xd3;

/// Maximal payload length, in bytes
pub const MAX_PAYLOAD_LEN: usize = 1023;

/// Preamble + reserved/length + CRC
pub const FRAME_OVERHEAD: usize = 6;

const CRC24: Crc<u32> = Crc::<u32>::new(&CRC_24_LTE_A);

/// CRC-24Q (CRC-24/LTE-A) of `data`.
pub fn crc24(data: &[u8]) -> u32 {
    CRC24.checksum(data)
}

/// A validated [Frame] located within a byte stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    /// Offset of the preamble within the scanned buffer
    pub offset: usize,
    /// Message payload
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Validates a [Frame] starting at the first byte of `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self, Error> {
        if buf.len() < FRAME_OVERHEAD {
            return Err(Error::TruncatedMessage);
        }
        if buf[0] != PREAMBLE {
            return Err(Error::MissingPreamble(buf[0]));
        }
        let len = (((buf[1] as usize) << 8) | buf[2] as usize) & 0x3ff;
        let total = len + FRAME_OVERHEAD;
        if buf.len() < total {
            return Err(Error::TruncatedMessage);
        }
        let crc = ((buf[total - 3] as u32) << 16)
            | ((buf[total - 2] as u32) << 8)
            | buf[total - 1] as u32;
        if crc24(&buf[..total - 3]) != crc {
            return Err(Error::ChecksumMismatch);
        }
        Ok(Self {
            offset: 0,
            payload: &buf[3..3 + len],
        })
    }

    /// 12 bit message type, 0 for an empty payload.
    pub fn message_type(&self) -> u16 {
        if self.payload.len() < 2 {
            0
        } else {
            ((self.payload[0] as u16) << 4) | (self.payload[1] as u16 >> 4)
        }
    }

    /// Total size of this [Frame] on the wire.
    pub fn encoding_size(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Offset of the first byte following this [Frame].
    pub fn end(&self) -> usize {
        self.offset + self.encoding_size()
    }
}

/// Scans `buf` from `start` for the first valid [Frame].
/// Every preamble candidate is accepted only if its CRC matches.
/// Returns [None] when no complete valid frame is found.
pub fn find_frame(buf: &[u8], start: usize) -> Option<Frame<'_>> {
    let mut k = start;
    while k < buf.len() {
        if buf[k] == PREAMBLE {
            match Frame::parse(&buf[k..]) {
                Ok(frame) => {
                    return Some(Frame {
                        offset: k,
                        payload: frame.payload,
                    })
                },
                Err(_e) => {
                    #[cfg(feature = "log")]
                    debug!("frame candidate at {} rejected: {}", k, _e);
                },
            }
        }
        k += 1;
    }
    None
}

/// Wraps `payload` into a complete frame.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::MessageTooLong);
    }
    let mut bytes = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    bytes.push(PREAMBLE);
    bytes.push(((payload.len() >> 8) & 0x03) as u8);
    bytes.push((payload.len() & 0xff) as u8);
    bytes.extend_from_slice(payload);
    let crc = crc24(&bytes);
    bytes.push(((crc >> 16) & 0xff) as u8);
    bytes.push(((crc >> 8) & 0xff) as u8);
    bytes.push((crc & 0xff) as u8);
    Ok(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn crc24q_check_value() {
        assert_eq!(crc24(b"123456789"), 0xcde703);
    }

    #[test]
    fn frame_encoding() {
        // 1005 with a zero body
        let mut payload = vec![0u8; 19];
        payload[0] = 0x3e;
        payload[1] = 0xd0;
        let bytes = encode_frame(&payload).unwrap();
        assert_eq!(bytes.len(), 25);
        assert_eq!(bytes[0], PREAMBLE);
        assert_eq!(bytes[2], 19);

        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.message_type(), 1005);
        assert_eq!(frame.encoding_size(), 25);
    }

    #[test]
    fn frame_search() {
        let payload = [0x3e, 0xd0, 0x01, 0x02];
        let bytes = encode_frame(&payload).unwrap();
        let mut stream = vec![0xd3, 0x00, 0x01, 0xaa];
        stream.extend_from_slice(&bytes);
        stream.extend_from_slice(&[0xd3, 0x00]);

        let frame = find_frame(&stream, 0).unwrap();
        assert_eq!(frame.offset, 4);
        assert_eq!(frame.payload, &payload);
        assert_eq!(frame.end(), 4 + bytes.len());
        assert!(find_frame(&stream, frame.end()).is_none());
    }

    #[test]
    fn parsing_errors() {
        let bytes = encode_frame(&[0x3e, 0xd0, 0x01, 0x02]).unwrap();

        let mut shifted = vec![0xaa];
        shifted.extend_from_slice(&bytes);
        assert!(matches!(
            Frame::parse(&shifted),
            Err(Error::MissingPreamble(0xaa))
        ));
        assert_eq!(find_frame(&shifted, 0).map(|f| f.offset), Some(1));

        let mut corrupt = bytes.clone();
        corrupt[4] ^= 0x80;
        assert!(matches!(
            Frame::parse(&corrupt),
            Err(Error::ChecksumMismatch)
        ));

        assert!(matches!(
            Frame::parse(&bytes[..bytes.len() - 1]),
            Err(Error::TruncatedMessage)
        ));
        assert!(matches!(
            Frame::parse(&bytes[..3]),
            Err(Error::TruncatedMessage)
        ));
    }

    #[test]
    fn oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD_LEN + 1];
        assert!(matches!(encode_frame(&payload), Err(Error::MessageTooLong)));
    }
}
