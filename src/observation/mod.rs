//! Multi Signal Messages (MSM) observations
use crate::signal::{frequency, SignalCode};
use crate::constants::SPEED_OF_LIGHT;
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod lock;
mod msm;

pub use lock::{LliFlags, LockTimeCache};
pub use msm::MsmVariant;

pub(crate) use msm::{decode, encode};

/// Per satellite content of an MSM
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MsmSatellite {
    pub sv: SV,
    /// Rough range [ms], None when not available
    pub rough_range_ms: Option<f64>,
    /// Extended satellite information (MSM5/7)
    pub extended_info: Option<u8>,
    /// Rough range rate [m/s] (MSM5/7)
    pub rough_range_rate_m_s: Option<f64>,
    /// Glonass frequency channel number, either transmitted
    /// in the extended info or previously learned from an ephemeris
    pub frequency_channel: Option<i8>,
}

/// One (satellite, signal) observation
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Pseudo range [m]
    pub pseudorange_m: Option<f64>,
    /// Carrier phase, expressed as a range [m]
    pub phase_range_m: Option<f64>,
    /// Carrier phase [cycles]. None when the carrier frequency is unknown.
    pub phase_cycles: Option<f64>,
    /// Raw lock time indicator
    pub lock_indicator: Option<u16>,
    /// Half cycle ambiguity indicator
    pub half_cycle: bool,
    /// Carrier to noise density ratio [dB-Hz]
    pub cnr_dbhz: Option<f64>,
    /// Fine range rate [m/s] (MSM5/7)
    pub fine_range_rate_m_s: Option<f64>,
    /// Doppler shift [Hz]
    pub doppler_hz: Option<f64>,
    /// Loss of lock indication
    pub lli: LliFlags,
}

/// Decoded MSM content, for a single constellation.
/// `cells` is shaped (satellites × signals): a `None` cell was not
/// present in the cell mask.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationBlock {
    pub constellation: Constellation,
    pub variant: MsmVariant,
    /// Reference station ID
    pub station_id: u16,
    /// Observation [Epoch], in GPST
    pub epoch: Epoch,
    /// More MSM of the same epoch follow
    pub multiple_message: bool,
    /// Issue of data station
    pub iods: u8,
    pub clock_steering: u8,
    pub external_clock: u8,
    /// Divergence free smoothing
    pub smoothing: bool,
    pub smoothing_interval: u8,
    pub satellites: Vec<MsmSatellite>,
    pub signals: Vec<SignalCode>,
    pub cells: Vec<Vec<Option<Cell>>>,
}

impl ObservationBlock {
    /// RTCM message type of this block
    pub fn message_type(&self) -> Option<u16> {
        self.variant.message_type(self.constellation)
    }

    pub fn nsat(&self) -> usize {
        self.satellites.len()
    }

    pub fn nsig(&self) -> usize {
        self.signals.len()
    }

    /// Number of cells actually present
    pub fn ncell(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|c| c.is_some()).count())
            .sum()
    }

    /// Returns the [Cell] observed for `sv` on `code`, if any.
    pub fn cell(&self, sv: SV, code: SignalCode) -> Option<&Cell> {
        let i = self.satellites.iter().position(|s| s.sv == sv)?;
        let j = self.signals.iter().position(|s| *s == code)?;
        self.cells.get(i)?.get(j)?.as_ref()
    }

    /// Iterates over all present cells
    pub fn iter(&self) -> impl Iterator<Item = (SV, SignalCode, &Cell)> + '_ {
        self.satellites.iter().zip(self.cells.iter()).flat_map(move |(sat, row)| {
            self.signals
                .iter()
                .zip(row.iter())
                .filter_map(move |(code, cell)| cell.as_ref().map(|c| (sat.sv, *code, c)))
        })
    }

    /// Updates the lock time `cache` and sets the loss of lock flags.
    pub fn apply_lock_times(&mut self, cache: &mut LockTimeCache) {
        for (sat, row) in self.satellites.iter().zip(self.cells.iter_mut()) {
            for (code, cell) in self.signals.iter().zip(row.iter_mut()) {
                if let Some(cell) = cell {
                    if let Some(lock) = cell.lock_indicator {
                        cell.lli = cache.update(sat.sv, *code, lock, cell.half_cycle);
                    }
                }
            }
        }
    }

    /// Completes missing Glonass frequency channels using `lookup`,
    /// then converts phases and range rates to cycles and Hz.
    pub(crate) fn resolve_carriers<F: Fn(SV) -> Option<i8>>(&mut self, lookup: F) {
        let constellation = self.constellation;
        for (sat, row) in self.satellites.iter_mut().zip(self.cells.iter_mut()) {
            if constellation == Constellation::Glonass && sat.frequency_channel.is_none() {
                sat.frequency_channel = lookup(sat.sv);
                #[cfg(feature = "log")]
                if sat.frequency_channel.is_none() {
                    debug!("{}: unknown frequency channel", sat.sv);
                }
            }
            for (code, cell) in self.signals.iter().zip(row.iter_mut()) {
                let cell = match cell {
                    Some(cell) => cell,
                    None => continue,
                };
                let f = frequency(constellation, *code, sat.frequency_channel);
                cell.phase_cycles = match (cell.phase_range_m, f) {
                    (Some(phase), Some(f)) => Some(phase * f / SPEED_OF_LIGHT),
                    _ => None,
                };
                cell.doppler_hz = match (sat.rough_range_rate_m_s, cell.fine_range_rate_m_s, f) {
                    (Some(rough), Some(fine), Some(f)) => Some(-(rough + fine) * f / SPEED_OF_LIGHT),
                    _ => None,
                };
            }
        }
    }
}
