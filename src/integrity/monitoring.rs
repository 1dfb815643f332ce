//! Quality indicators, signal monitoring and SSR integrity
use super::tables::{agc_level, cnr_level};
use super::{read_epoch, read_systems, write_epoch, write_systems, SatelliteSet, Validity};
use crate::{
    bits::{BitReader, BitWriter},
    mask::{read_mask, write_mask},
    Error,
};
use hifitime::Epoch;
use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Message quality indicators
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualityIndicator {
    pub epoch: Epoch,
    pub provider_id: u16,
    pub validity: Validity,
    pub network_id: u8,
    /// (indicator index, quality)
    pub indicators: Vec<(u8, f64)>,
}

impl QualityIndicator {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let provider_id = r.read_u16(12)?;
        let validity = Validity::decode(r)?;
        let network_id = r.read_u8(8)?;
        let mut indicators = Vec::new();
        for index in read_mask(r, 8, 0)? {
            indicators.push((index as u8, r.read_uscaled(8, 0.1)?));
        }
        Ok(Self {
            epoch,
            provider_id,
            validity,
            network_id,
            indicators,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(12, self.provider_id as u64)?;
        self.validity.encode(w)?;
        w.write_u64(8, self.network_id as u64)?;
        let indicators = self
            .indicators
            .iter()
            .sorted_by_key(|(index, _)| *index)
            .collect::<Vec<_>>();
        let indices = indicators
            .iter()
            .map(|(index, _)| *index as u32)
            .collect::<Vec<_>>();
        write_mask(w, &indices, 8, 0)?;
        for (_, quality) in indicators {
            w.write_uscaled(8, *quality, 0.1)?;
        }
        Ok(())
    }
}

/// Received signal levels, as indices
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalLevel {
    pub cnr: u8,
    pub agc_type: bool,
    pub agc: u8,
}

impl SignalLevel {
    /// Carrier to noise density ratio [dB.Hz]
    pub fn cnr_dbhz(&self) -> Option<f64> {
        cnr_level(self.cnr)
    }

    /// Automatic gain control level [dB]
    pub fn agc_db(&self) -> Option<f64> {
        agc_level(self.agc)
    }
}

/// Monitored signals of one satellite
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitoredSatellite {
    pub iod_frequency: u8,
    /// (frequency index, level)
    pub signals: Vec<(u8, SignalLevel)>,
}

impl MonitoredSatellite {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let frequencies = read_mask(r, 8, 0)?;
        let iod_frequency = r.read_u8(2)?;
        let mut signals = Vec::with_capacity(frequencies.len());
        for frequency in frequencies {
            signals.push((
                frequency as u8,
                SignalLevel {
                    cnr: r.read_u8(8)?,
                    agc_type: r.read_bool()?,
                    agc: r.read_u8(8)?,
                },
            ));
        }
        Ok(Self {
            iod_frequency,
            signals,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        let signals = self
            .signals
            .iter()
            .sorted_by_key(|(frequency, _)| *frequency)
            .collect::<Vec<_>>();
        let frequencies = signals.iter().map(|(f, _)| *f as u32).collect::<Vec<_>>();
        write_mask(w, &frequencies, 8, 0)?;
        w.write_u64(2, self.iod_frequency as u64)?;
        for (_, level) in signals {
            w.write_u64(8, level.cnr as u64)?;
            w.write_bool(level.agc_type)?;
            w.write_u64(8, level.agc as u64)?;
        }
        Ok(())
    }
}

/// CNR and AGC signal in space monitoring
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalMonitoring {
    pub provider_id: u16,
    pub epoch: Epoch,
    /// Update rate interval [0.1 s]
    pub update_interval: u16,
    pub area_id: u16,
    pub systems: Vec<SatelliteSet<MonitoredSatellite>>,
}

impl SignalMonitoring {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let provider_id = r.read_u16(12)?;
        let epoch = read_epoch(r, reference)?;
        let update_interval = r.read_u16(16)?;
        let area_id = r.read_u16(10)?;
        let constellations = read_systems(r)?;
        let systems = SatelliteSet::decode_all(r, &constellations, MonitoredSatellite::decode)?;
        Ok(Self {
            provider_id,
            epoch,
            update_interval,
            area_id,
            systems,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(12, self.provider_id as u64)?;
        write_epoch(w, self.epoch)?;
        w.write_u64(16, self.update_interval as u64)?;
        w.write_u64(10, self.area_id as u64)?;
        for system in write_systems(w, &self.systems, |s| s.constellation)? {
            system.encode(w, |w, sat| sat.encode(w))?;
        }
        Ok(())
    }
}

/// Integrity flags attached to an SSR correction stream
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SsrIntegrity {
    pub provider_id: u16,
    pub ssr_provider_id: u16,
    pub ssr_solution_id: u8,
    pub iod_ssr: u8,
    pub epoch: Epoch,
    pub validity: Validity,
    /// Per satellite integrity flag (2 bits)
    pub systems: Vec<SatelliteSet<u8>>,
}

impl SsrIntegrity {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let provider_id = r.read_u16(12)?;
        let ssr_provider_id = r.read_u16(16)?;
        let ssr_solution_id = r.read_u8(4)?;
        let iod_ssr = r.read_u8(4)?;
        let epoch = read_epoch(r, reference)?;
        let constellations = read_systems(r)?;
        let validity = Validity::decode(r)?;
        let systems = SatelliteSet::decode_all(r, &constellations, |r| r.read_u8(2))?;
        Ok(Self {
            provider_id,
            ssr_provider_id,
            ssr_solution_id,
            iod_ssr,
            epoch,
            validity,
            systems,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(12, self.provider_id as u64)?;
        w.write_u64(16, self.ssr_provider_id as u64)?;
        w.write_u64(4, self.ssr_solution_id as u64)?;
        w.write_u64(4, self.iod_ssr as u64)?;
        write_epoch(w, self.epoch)?;
        let systems = write_systems(w, &self.systems, |s| s.constellation)?;
        self.validity.encode(w)?;
        for system in systems {
            system.encode(w, |w, flag| w.write_u64(2, *flag as u64))?;
        }
        Ok(())
    }
}
