#![doc(html_logo_url = "https://raw.githubusercontent.com/georust/meta/master/logo/logo.png")]
#![cfg_attr(docrs, feature(doc_cfg))]

//! RTCM3 message decoding and encoding.
//!
//! This crate covers the bit-exact wire format of:
//! - broadcast ephemerides (GPS, Glonass, Galileo, BeiDou, QZSS, NavIC, SBAS)
//! - MSM1 to MSM7 observations
//! - SSR corrections (RTCM, IGS and experimental numbering),
//!   accumulated over several messages by a [CorrectionState](prelude::CorrectionState)
//! - augmentation integrity messages
//! - station and antenna descriptors
//!
//! The entry point is the stateful [Codec](prelude::Codec):
//! ```
//! use rtcm3::prelude::{Codec, Config};
//!
//! let mut codec = Codec::new(Config::default());
//! let buf = [0u8; 16];
//! // no valid frame in this buffer
//! assert!(codec.decode_one(&buf).is_none());
//! ```

#[cfg(feature = "log")]
#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

pub mod bits;
pub mod frame;
pub mod mask;
pub mod signal;
pub mod sv;

mod codec;
mod config;
mod constants;
mod message;
mod time;

pub mod ephemeris;
pub mod integrity;
pub mod observation;
pub mod ssr;
pub mod station;

#[cfg(feature = "std")]
mod decoder;

use gnss_rs::prelude::Constellation;
use thiserror::Error;

pub mod prelude {
    pub use crate::bits::{BitReader, BitWriter};
    pub use crate::codec::Codec;
    pub use crate::config::{Config, IodPolicy};
    pub use crate::ephemeris::Ephemeris;
    pub use crate::frame::{encode_frame, find_frame, Frame};
    pub use crate::integrity::{IntegrityKind, IntegrityRecord, IntegrityState, IntegrityUpdate};
    pub use crate::mask::{decode_mask, encode_mask};
    pub use crate::message::{Message, MessageKind, Record};
    pub use crate::observation::{Cell, LliFlags, LockTimeCache, MsmVariant, ObservationBlock};
    pub use crate::signal::SignalCode;
    pub use crate::ssr::{
        Correction, CorrectionKind, CorrectionState, CorrectionUpdate, SsrFlavor, SsrMessage,
    };
    pub use crate::station::StationRecord;
    pub use crate::sv::{sv_from_svid, svid_from_sv, SatIndex};
    pub use crate::Error;

    #[cfg(feature = "std")]
    pub use crate::decoder::Decoder;

    // re-export
    pub use gnss_rs::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("truncated message")]
    TruncatedMessage,
    #[error("missing frame preamble (0x{0:02x})")]
    MissingPreamble(u8),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("invalid prn #{1} for {0}")]
    InvalidPrn(Constellation, u8),
    #[error("invalid signal code")]
    InvalidSignalCode,
    #[error("inconsistent issue of data")]
    InconsistentIssueOfData,
    #[error("value does not fit in {0} bit field")]
    FieldOverflow(u32),
    #[error("too many msm cells ({0})")]
    TooManyCells(usize),
    #[error("payload exceeds 1023 bytes")]
    MessageTooLong,
    #[error("record does not match message type {0}")]
    RecordMismatch(u16),
    #[error("no encoder for message type {0}")]
    UnsupportedMessage(u16),
    #[error("invalid grid type {0}")]
    InvalidGridType(u8),
    #[error("invalid subtype {0}")]
    InvalidSubtype(u8),
    #[error("utf8 error")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[cfg(feature = "std")]
    #[error("i/o error")]
    IoError(#[from] std::io::Error),
}
