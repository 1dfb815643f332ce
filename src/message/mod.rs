mod kind; // message type classification
mod record; // message content

pub use kind::MessageKind;
pub use record::Record;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One RTCM3 [Message]: its 12 bit type and decoded [Record]
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message {
    /// Message type
    pub message_type: u16,
    /// [Record]
    pub record: Record,
}

impl Message {
    /// Creates a new [Message] ready to be encoded.
    pub fn new(message_type: u16, record: Record) -> Self {
        Self {
            message_type,
            record,
        }
    }

    /// [MessageKind] of this [Message]
    pub fn kind(&self) -> MessageKind {
        MessageKind::from(self.message_type)
    }
}
