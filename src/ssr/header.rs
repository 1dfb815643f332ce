//! Common SSR header
use super::{CorrectionKind, SsrFlavor, SsrMessage};
use crate::{
    bits::{BitReader, BitWriter},
    time::{glonass_dow_tod, gps_tow, resolve_glonass_tod, resolve_tow},
    Error,
};
use gnss_rs::prelude::Constellation;
use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fields shared by epoch tagged SSR messages.
/// Which of them are actually transmitted depends on the [CorrectionKind]:
/// the phase bias extension has no update interval nor multiple message flag,
/// only orbit related kinds carry the reference datum.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SsrHeader {
    /// Correction [Epoch], in GPST
    pub epoch: Epoch,
    /// Update interval indicator
    pub update_interval: u8,
    /// More messages of the same epoch follow
    pub multiple_message: bool,
    /// Satellite reference datum (false: ITRF, true: regional)
    pub regional_datum: bool,
    /// Issue of data SSR
    pub iod_ssr: u8,
    pub provider_id: u16,
    pub solution_id: u8,
}

impl SsrHeader {
    /// Builds a header for `epoch`, all other fields zeroed.
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            update_interval: 0,
            multiple_message: false,
            regional_datum: false,
            iod_ssr: 0,
            provider_id: 0,
            solution_id: 0,
        }
    }

    /// Copies and returns [SsrHeader] with multiple message flag set.
    pub fn with_multiple_message(&self, multiple: bool) -> Self {
        let mut s = self.clone();
        s.multiple_message = multiple;
        s
    }

    /// Copies and returns [SsrHeader] with given IOD SSR.
    pub fn with_iod_ssr(&self, iod_ssr: u8) -> Self {
        let mut s = self.clone();
        s.iod_ssr = iod_ssr;
        s
    }

    pub(crate) fn decode(
        r: &mut BitReader,
        message: &SsrMessage,
        reference: Epoch,
    ) -> Result<Self, Error> {
        let epoch = if glonass_time(message) {
            let tod = r.read_u32(17)? as f64;
            resolve_glonass_tod(reference, tod)
        } else {
            let tow = r.read_u32(20)? as f64;
            resolve_tow(reference, tow, TimeScale::GPST)
        };
        let (update_interval, multiple_message) = if has_interval(message.kind) {
            (r.read_u8(4)?, r.read_bool()?)
        } else {
            (0, false)
        };
        let regional_datum = if has_datum(message.kind) {
            r.read_bool()?
        } else {
            false
        };
        let iod_ssr = r.read_u8(4)?;
        let provider_id = r.read_u16(16)?;
        let solution_id = r.read_u8(4)?;
        Ok(Self {
            epoch,
            update_interval,
            multiple_message,
            regional_datum,
            iod_ssr,
            provider_id,
            solution_id,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter, message: &SsrMessage) -> Result<(), Error> {
        if glonass_time(message) {
            let (_, tod) = glonass_dow_tod(self.epoch);
            w.write_u64(17, tod.round() as u64 % 86400)?;
        } else {
            w.write_u64(20, gps_tow(self.epoch).round() as u64 % 604800)?;
        }
        if has_interval(message.kind) {
            w.write_u64(4, self.update_interval as u64)?;
            w.write_bool(self.multiple_message)?;
        }
        if has_datum(message.kind) {
            w.write_bool(self.regional_datum)?;
        }
        w.write_u64(4, self.iod_ssr as u64)?;
        w.write_u64(16, self.provider_id as u64)?;
        w.write_u64(4, self.solution_id as u64)
    }
}

/// Glonass corrections are tagged with a 17 bit time of day,
/// except in IGS SSR.
fn glonass_time(message: &SsrMessage) -> bool {
    message.flavor != SsrFlavor::Igs && message.constellation == Some(Constellation::Glonass)
}

fn has_interval(kind: CorrectionKind) -> bool {
    kind != CorrectionKind::PhaseBiasExtension
}

fn has_datum(kind: CorrectionKind) -> bool {
    matches!(kind, CorrectionKind::Orbit | CorrectionKind::Combined)
}
