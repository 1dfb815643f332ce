use std::io::{ErrorKind, Read};

use crate::{
    codec::Codec,
    config::Config,
    frame::{FRAME_OVERHEAD, MAX_PAYLOAD_LEN},
    message::Message,
    Error,
};

/// Internal buffer size, holds at least two complete frames
const BUFFER_SIZE: usize = 4096;

/// Largest frame
const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD;

/// RTCM3 stream [Decoder]. Use this structure to decode all messages
/// streamed on a readable interface.
/// ```
/// use rtcm3::prelude::{Config, Decoder, Error};
///
/// // an empty source
/// let source: &[u8] = &[];
/// let mut decoder = Decoder::new(source, Config::default());
///
/// loop {
///     match decoder.next() {
///         Some(Ok(msg)) => {
///             // decoded message
///         },
///         Some(Err(e)) => match e {
///             Error::IoError(e) => {
///                 // I/O errors should be handled by the user
///             },
///             _ => {
///                 // corrupt or unsupported content,
///                 // following messages remain decodable
///             },
///         },
///         None => {
///             // end of stream
///             break;
///         },
///     }
/// }
/// ```
pub struct Decoder<R: Read> {
    reader: R,
    codec: Codec,
    /// Buffer read pointer
    rd_ptr: usize,
    /// Buffer write pointer
    wr_ptr: usize,
    buffer: Vec<u8>,
    /// End of stream reached
    eos: bool,
}

impl<R: Read> Decoder<R> {
    /// Creates a new [Decoder] from [R] readable interface.
    pub fn new(reader: R, config: Config) -> Self {
        Self::with_codec(reader, Codec::new(config))
    }

    /// Creates a new [Decoder] that continues with existing [Codec] state.
    pub fn with_codec(reader: R, codec: Codec) -> Self {
        Self {
            reader,
            codec,
            rd_ptr: 0,
            wr_ptr: 0,
            buffer: vec![0; BUFFER_SIZE],
            eos: false,
        }
    }

    /// [Codec] and its accumulated state
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Releases the [Codec]
    pub fn into_codec(self) -> Codec {
        self.codec
    }

    /// Moves pending bytes to the front of the buffer. When the buffer
    /// is full without any valid frame, the oldest bytes are dropped.
    fn compact(&mut self) {
        if self.wr_ptr - self.rd_ptr >= BUFFER_SIZE {
            self.rd_ptr = self.wr_ptr - MAX_FRAME_LEN;
        }
        self.buffer.copy_within(self.rd_ptr..self.wr_ptr, 0);
        self.wr_ptr -= self.rd_ptr;
        self.rd_ptr = 0;
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Message, Error>;
    /// Parse next message contained in stream
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pending = &self.buffer[self.rd_ptr..self.wr_ptr];
            if let Some((consumed, result)) = self.codec.decode_one(pending) {
                self.rd_ptr += consumed;
                return Some(result);
            }
            if self.eos {
                return None;
            }
            self.compact();
            match self.reader.read(&mut self.buffer[self.wr_ptr..]) {
                Ok(0) => self.eos = true,
                Ok(size) => self.wr_ptr += size,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Some(Err(Error::IoError(e))),
            }
        }
    }
}
