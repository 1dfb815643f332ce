use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Behavior on issue of data mismatches between messages
/// that contribute to the same correction set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IodPolicy {
    /// Reject the message, state remains untouched
    Strict,
    /// Log the mismatch and apply the message
    #[default]
    Lenient,
}

/// [Codec](crate::prelude::Codec) configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Reference [Epoch] used to resolve week and time of week ambiguities,
    /// until the first timed message is decoded. Defaults to system time.
    pub reference: Option<Epoch>,
    /// Follow the most recently decoded [Epoch]
    pub track_reference: bool,
    /// [IodPolicy]
    pub iod_policy: IodPolicy,
    /// Message types that are returned undecoded
    pub skip_types: Vec<u16>,
    /// Return phase bias messages undecoded
    pub mask_phase_bias: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference: None,
            track_reference: true,
            iod_policy: IodPolicy::default(),
            skip_types: Vec::new(),
            mask_phase_bias: false,
        }
    }
}

impl Config {
    /// Copies and returns [Config] with given reference [Epoch].
    pub fn with_reference(&self, t: Epoch) -> Self {
        let mut s = self.clone();
        s.reference = Some(t);
        s
    }

    /// Copies and returns [Config] with given [IodPolicy].
    pub fn with_iod_policy(&self, policy: IodPolicy) -> Self {
        let mut s = self.clone();
        s.iod_policy = policy;
        s
    }

    /// Copies and returns [Config] that will not decode `msg_type`.
    pub fn with_skipped_type(&self, msg_type: u16) -> Self {
        let mut s = self.clone();
        s.skip_types.push(msg_type);
        s
    }

    /// True if `msg_type` should not be decoded
    pub(crate) fn skipped(&self, msg_type: u16) -> bool {
        self.skip_types.contains(&msg_type)
    }
}
