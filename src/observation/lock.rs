//! Loss of lock indication, derived from MSM lock time indicators
use crate::signal::SignalCode;
use bitflags::bitflags;
use gnss_rs::prelude::SV;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Default, Copy, Clone)]
    #[derive(PartialEq, Eq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LliFlags: u8 {
        /// Current epoch is marked Ok or Unknown status
        const OK_OR_UNKNOWN = 0x00;
        /// Lock lost between previous observation and current observation,
        /// cycle slip is possible
        const LOCK_LOSS = 0x01;
        /// Half cycle ambiguity is unresolved
        const HALF_CYCLE_SLIP = 0x02;
    }
}

/// Last lock time indicator seen for each (satellite, signal).
/// Lives across messages, one per decoding context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockTimeCache {
    indicators: HashMap<(SV, SignalCode), u16>,
}

impl LockTimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the new `lock` indicator and returns the resulting [LliFlags].
    /// Lock is lost when the indicator decreases, or when it stays at zero:
    /// the indicator cannot remain at its minimum across two epochs without
    /// a reacquisition. An unchanged non zero indicator is a continuous lock.
    /// An unresolved half cycle raises both flags. The first sighting of a
    /// signal never raises any flag.
    pub fn update(&mut self, sv: SV, code: SignalCode, lock: u16, half_cycle: bool) -> LliFlags {
        let mut flags = LliFlags::OK_OR_UNKNOWN;
        if let Some(previous) = self.indicators.insert((sv, code), lock) {
            if lock < previous || (lock == 0 && previous == 0) {
                flags |= LliFlags::LOCK_LOSS;
            }
            if half_cycle {
                flags |= LliFlags::LOCK_LOSS | LliFlags::HALF_CYCLE_SLIP;
            }
        }
        flags
    }

    /// Last indicator stored for this signal
    pub fn get(&self, sv: SV, code: SignalCode) -> Option<u16> {
        self.indicators.get(&(sv, code)).copied()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn clear(&mut self) {
        self.indicators.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::Constellation;

    #[test]
    fn lock_time_reset() {
        let sv = SV::new(Constellation::GPS, 3);
        let l1c = SignalCode::new(1, 'C');
        let mut cache = LockTimeCache::new();

        assert_eq!(cache.update(sv, l1c, 50, false), LliFlags::OK_OR_UNKNOWN);
        assert_eq!(cache.update(sv, l1c, 2, false), LliFlags::LOCK_LOSS);
        assert_eq!(cache.get(sv, l1c), Some(2));
    }

    #[test]
    fn lock_time_sequence() {
        let sv = SV::new(Constellation::Galileo, 7);
        let code = SignalCode::new(5, 'Q');
        let mut cache = LockTimeCache::new();
        for (lock, half, expected) in [
            (0, false, LliFlags::OK_OR_UNKNOWN),
            (0, false, LliFlags::LOCK_LOSS),
            (3, false, LliFlags::OK_OR_UNKNOWN),
            // unchanged non zero indicators: continuous lock
            (3, false, LliFlags::OK_OR_UNKNOWN),
            (3, false, LliFlags::OK_OR_UNKNOWN),
            (4, true, LliFlags::LOCK_LOSS | LliFlags::HALF_CYCLE_SLIP),
            (1, true, LliFlags::LOCK_LOSS | LliFlags::HALF_CYCLE_SLIP),
            (1, false, LliFlags::OK_OR_UNKNOWN),
        ] {
            assert_eq!(cache.update(sv, code, lock, half), expected);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn saturated_indicators() {
        let sv = SV::new(Constellation::GPS, 12);
        let l2w = SignalCode::new(2, 'W');
        let mut cache = LockTimeCache::new();
        // MSM4 indicator saturates at 15, MSM7 at 704
        for lock in [15, 15, 15] {
            assert_eq!(cache.update(sv, l2w, lock, false), LliFlags::OK_OR_UNKNOWN);
        }
        for lock in [704, 704] {
            assert_eq!(cache.update(sv, l2w, lock, false), LliFlags::OK_OR_UNKNOWN);
        }
    }

    #[test]
    fn half_cycle_first_sighting() {
        let sv = SV::new(Constellation::BeiDou, 19);
        let code = SignalCode::new(2, 'I');
        let mut cache = LockTimeCache::new();
        assert_eq!(cache.update(sv, code, 20, true), LliFlags::OK_OR_UNKNOWN);
        assert_eq!(
            cache.update(sv, code, 21, true),
            LliFlags::LOCK_LOSS | LliFlags::HALF_CYCLE_SLIP
        );
        assert_eq!(LliFlags::all().bits(), 0x03);
        // other signals of the same satellite are first sightings
        assert_eq!(
            cache.update(sv, SignalCode::new(7, 'I'), 21, true),
            LliFlags::OK_OR_UNKNOWN
        );
    }
}
