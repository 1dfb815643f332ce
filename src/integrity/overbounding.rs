//! Extended integrity: service levels, overbounding
//! and signal in space / local error parameters
use super::tables::{self, lookup, SolutionType};
use super::{read_epoch, read_satellites, read_systems, write_epoch, write_satellites};
use super::{write_systems, SatelliteSet, Validity};
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Overbounding parameters of one satellite, as table indices
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteOverbounding {
    pub code_fault_probability: u8,
    pub code_sigma: u8,
    pub phase_fault_probability: u8,
    pub code_bias: u8,
    pub phase_sigma: u8,
    pub phase_bias: u8,
}

impl SatelliteOverbounding {
    /// Single satellite pseudorange message fault probability
    pub fn code_fault_probability(&self) -> Option<f64> {
        lookup(&*tables::PROBABILITY, self.code_fault_probability)
    }

    /// Single satellite carrier phase message fault probability
    pub fn phase_fault_probability(&self) -> Option<f64> {
        lookup(&*tables::PROBABILITY, self.phase_fault_probability)
    }

    /// Overbounding pseudorange error standard deviation [m]
    pub fn code_sigma_m(&self) -> Option<f64> {
        lookup(&tables::CODE_SIGMA, self.code_sigma)
    }

    /// Overbounding carrier phase error standard deviation [m]
    pub fn phase_sigma_m(&self) -> Option<f64> {
        lookup(&tables::PHASE_SIGMA, self.phase_sigma)
    }

    /// Overbounding long term pseudorange bias [m]
    pub fn code_bias_m(&self) -> Option<f64> {
        lookup(&tables::CODE_BIAS, self.code_bias)
    }

    /// Overbounding long term carrier phase bias [m]
    pub fn phase_bias_m(&self) -> Option<f64> {
        lookup(&tables::PHASE_BIAS, self.phase_bias)
    }

    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        Ok(Self {
            code_fault_probability: r.read_u8(4)?,
            code_sigma: r.read_u8(5)?,
            phase_fault_probability: r.read_u8(4)?,
            code_bias: r.read_u8(4)?,
            phase_sigma: r.read_u8(5)?,
            phase_bias: r.read_u8(4)?,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(4, self.code_fault_probability as u64)?;
        w.write_u64(5, self.code_sigma as u64)?;
        w.write_u64(4, self.phase_fault_probability as u64)?;
        w.write_u64(4, self.code_bias as u64)?;
        w.write_u64(5, self.phase_sigma as u64)?;
        w.write_u64(4, self.phase_bias as u64)
    }
}

/// Constellation wide overbounding parameters, as table indices
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverboundingSystem {
    pub constellation: Constellation,
    pub satellite_failure_duration: u8,
    pub constellation_failure_duration: u8,
    pub code_correlation_time: u8,
    /// Gauss-Markov pseudorange standard deviation index
    pub code_gauss_markov_sigma: u8,
    pub phase_correlation_time: u8,
    /// Gauss-Markov carrier phase standard deviation index
    pub phase_gauss_markov_sigma: u8,
    pub code_fault_probability: u8,
    pub phase_fault_probability: u8,
    pub satellites: Vec<(SV, SatelliteOverbounding)>,
}

impl OverboundingSystem {
    /// Mean failure duration of a single satellite fault [s]
    pub fn satellite_failure_duration_s(&self) -> Option<f64> {
        lookup(
            &tables::SATELLITE_FAILURE_DURATION,
            self.satellite_failure_duration,
        )
    }

    /// Mean failure duration of a constellation fault [s]
    pub fn constellation_failure_duration_s(&self) -> Option<f64> {
        lookup(
            &tables::CONSTELLATION_FAILURE_DURATION,
            self.constellation_failure_duration,
        )
    }

    pub fn code_correlation_time_s(&self) -> Option<f64> {
        lookup(&tables::CODE_CORRELATION_TIME, self.code_correlation_time)
    }

    pub fn phase_correlation_time_s(&self) -> Option<f64> {
        lookup(&tables::PHASE_CORRELATION_TIME, self.phase_correlation_time)
    }

    /// Multiple satellite pseudorange message fault probability
    pub fn code_fault_probability(&self) -> Option<f64> {
        lookup(&*tables::PROBABILITY, self.code_fault_probability)
    }

    /// Multiple satellite carrier phase message fault probability
    pub fn phase_fault_probability(&self) -> Option<f64> {
        lookup(&*tables::PROBABILITY, self.phase_fault_probability)
    }
}

/// Service levels and overbounding parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Overbounding {
    pub epoch: Epoch,
    pub provider_id: u16,
    pub area_id: u16,
    pub integrity_level: u8,
    /// Time to alert index
    pub time_to_alert: u8,
    pub solution: SolutionType,
    pub validity: Validity,
    /// Augmentation system fault probability index
    pub system_fault_probability: Option<u8>,
    /// Correlation times also apply to continuity monitoring
    pub continuity: bool,
    pub iod: u8,
    pub systems: Vec<OverboundingSystem>,
}

impl Overbounding {
    /// Time to alert [s]
    pub fn time_to_alert_s(&self) -> Option<f64> {
        tables::time_to_alert(self.time_to_alert)
    }

    /// Augmentation system fault probability
    pub fn system_fault_probability(&self) -> Option<f64> {
        lookup(&*tables::PROBABILITY, self.system_fault_probability?)
    }

    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let provider_id = r.read_u16(12)?;
        let area_id = r.read_u16(10)?;
        let integrity_level = r.read_u8(8)?;
        let time_to_alert = r.read_u8(7)?;
        let solution = SolutionType::from_bits_retain(r.read_u16(15)?);
        let constellations = read_systems(r)?;
        let validity = Validity::decode(r)?;
        let system_fault_probability = if r.read_bool()? {
            Some(r.read_u8(4)?)
        } else {
            None
        };
        let continuity = r.read_bool()?;
        let iod = r.read_u8(6)?;

        let mut systems = Vec::with_capacity(constellations.len());
        for constellation in constellations {
            let satellite_failure_duration = r.read_u8(4)?;
            let constellation_failure_duration = r.read_u8(4)?;
            let code_correlation_time = r.read_u8(4)?;
            let code_gauss_markov_sigma = r.read_u8(5)?;
            let phase_correlation_time = r.read_u8(4)?;
            let phase_gauss_markov_sigma = r.read_u8(5)?;
            let code_fault_probability = r.read_u8(4)?;
            let phase_fault_probability = r.read_u8(4)?;
            let svs = read_satellites(r, constellation)?;
            let mut satellites = Vec::with_capacity(svs.len());
            for sv in svs {
                satellites.push((sv, SatelliteOverbounding::decode(r)?));
            }
            systems.push(OverboundingSystem {
                constellation,
                satellite_failure_duration,
                constellation_failure_duration,
                code_correlation_time,
                code_gauss_markov_sigma,
                phase_correlation_time,
                phase_gauss_markov_sigma,
                code_fault_probability,
                phase_fault_probability,
                satellites,
            });
        }

        Ok(Self {
            epoch,
            provider_id,
            area_id,
            integrity_level,
            time_to_alert,
            solution,
            validity,
            system_fault_probability,
            continuity,
            iod,
            systems,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(12, self.provider_id as u64)?;
        w.write_u64(10, self.area_id as u64)?;
        w.write_u64(8, self.integrity_level as u64)?;
        w.write_u64(7, self.time_to_alert as u64)?;
        w.write_u64(15, self.solution.bits() as u64)?;
        let systems = write_systems(w, &self.systems, |s| s.constellation)?;
        self.validity.encode(w)?;
        w.write_bool(self.system_fault_probability.is_some())?;
        if let Some(index) = self.system_fault_probability {
            w.write_u64(4, index as u64)?;
        }
        w.write_bool(self.continuity)?;
        w.write_u64(6, self.iod as u64)?;

        for system in systems {
            w.write_u64(4, system.satellite_failure_duration as u64)?;
            w.write_u64(4, system.constellation_failure_duration as u64)?;
            w.write_u64(4, system.code_correlation_time as u64)?;
            w.write_u64(5, system.code_gauss_markov_sigma as u64)?;
            w.write_u64(4, system.phase_correlation_time as u64)?;
            w.write_u64(5, system.phase_gauss_markov_sigma as u64)?;
            w.write_u64(4, system.code_fault_probability as u64)?;
            w.write_u64(4, system.phase_fault_probability as u64)?;
            for (_, sat) in write_satellites(w, &system.satellites)? {
                sat.encode(w)?;
            }
        }
        Ok(())
    }
}

/// Signal in space and local error parameters of one satellite, as table indices
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteSis {
    pub code_sigma_rate: u8,
    pub phase_sigma_rate: u8,
    pub code_bias_rate: u8,
    pub phase_range_rate_sigma: u8,
    pub phase_range_rate_index: u8,
    pub orbit_clock_rate: u8,
    pub ionosphere_sigma: u8,
    pub ionosphere_rate: u8,
    pub troposphere_sigma: u8,
    pub troposphere_rate: u8,
}

impl SatelliteSis {
    /// Bound on the rate of change of the pseudorange error sigma [m/s]
    pub fn code_sigma_rate(&self) -> Option<f64> {
        lookup(&tables::CODE_SIGMA_RATE, self.code_sigma_rate)
    }

    /// Bound on the rate of change of the phase error sigma [m/s]
    pub fn phase_sigma_rate(&self) -> Option<f64> {
        lookup(&tables::PHASE_SIGMA_RATE, self.phase_sigma_rate)
    }

    /// Nominal pseudorange bias rate of change [m/s]
    pub fn code_bias_rate(&self) -> Option<f64> {
        lookup(&tables::RATE_BOUND, self.code_bias_rate)
    }

    /// Bounding sigma on the phase range rate error [m/s]
    pub fn phase_range_rate_sigma(&self) -> Option<f64> {
        lookup(&tables::PHASE_RANGE_RATE_SIGMA, self.phase_range_rate_sigma)
    }

    pub fn phase_range_rate_index(&self) -> Option<f64> {
        lookup(&tables::PHASE_RANGE_RATE_INDEX, self.phase_range_rate_index)
    }

    /// Orbit and clock error rate bound [m/s]
    pub fn orbit_clock_rate(&self) -> Option<f64> {
        lookup(&tables::RATE_BOUND, self.orbit_clock_rate)
    }

    /// Residual ionosphere error sigma [m]
    pub fn ionosphere_sigma_m(&self) -> Option<f64> {
        lookup(&tables::IONOSPHERE_SIGMA, self.ionosphere_sigma)
    }

    /// Ionosphere error rate bound [m/s]
    pub fn ionosphere_rate(&self) -> Option<f64> {
        lookup(&tables::RATE_BOUND, self.ionosphere_rate)
    }

    /// Residual troposphere error sigma [m]
    pub fn troposphere_sigma_m(&self) -> Option<f64> {
        lookup(&tables::TROPOSPHERE_SIGMA, self.troposphere_sigma)
    }

    /// Troposphere error rate bound [m/s]
    pub fn troposphere_rate(&self) -> Option<f64> {
        lookup(&tables::RATE_BOUND, self.troposphere_rate)
    }

    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        Ok(Self {
            code_sigma_rate: r.read_u8(4)?,
            phase_sigma_rate: r.read_u8(4)?,
            code_bias_rate: r.read_u8(3)?,
            phase_range_rate_sigma: r.read_u8(4)?,
            phase_range_rate_index: r.read_u8(4)?,
            orbit_clock_rate: r.read_u8(3)?,
            ionosphere_sigma: r.read_u8(3)?,
            ionosphere_rate: r.read_u8(3)?,
            troposphere_sigma: r.read_u8(3)?,
            troposphere_rate: r.read_u8(3)?,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        for (width, value) in [
            (4, self.code_sigma_rate),
            (4, self.phase_sigma_rate),
            (3, self.code_bias_rate),
            (4, self.phase_range_rate_sigma),
            (4, self.phase_range_rate_index),
            (3, self.orbit_clock_rate),
            (3, self.ionosphere_sigma),
            (3, self.ionosphere_rate),
            (3, self.troposphere_sigma),
            (3, self.troposphere_rate),
        ] {
            w.write_u64(width, value as u64)?;
        }
        Ok(())
    }
}

/// Signal in space integrity and local error parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SisLocal {
    pub epoch: Epoch,
    pub iod: u8,
    pub provider_id: u16,
    pub area_id: u16,
    pub validity: Validity,
    pub continuity: bool,
    pub inter_constellation_bias: u8,
    pub inter_frequency_bias: u8,
    pub systems: Vec<SatelliteSet<SatelliteSis>>,
}

impl SisLocal {
    /// Bounding inter constellation bias [m]
    pub fn inter_constellation_bias_m(&self) -> Option<f64> {
        lookup(
            &tables::INTER_CONSTELLATION_BIAS,
            self.inter_constellation_bias,
        )
    }

    /// Bounding inter frequency bias [m]
    pub fn inter_frequency_bias_m(&self) -> Option<f64> {
        lookup(&tables::INTER_FREQUENCY_BIAS, self.inter_frequency_bias)
    }

    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let iod = r.read_u8(6)?;
        let provider_id = r.read_u16(12)?;
        let area_id = r.read_u16(10)?;
        let constellations = read_systems(r)?;
        let validity = Validity::decode(r)?;
        let continuity = r.read_bool()?;
        let inter_constellation_bias = r.read_u8(3)?;
        let inter_frequency_bias = r.read_u8(3)?;
        let systems = SatelliteSet::decode_all(r, &constellations, SatelliteSis::decode)?;
        Ok(Self {
            epoch,
            iod,
            provider_id,
            area_id,
            validity,
            continuity,
            inter_constellation_bias,
            inter_frequency_bias,
            systems,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(6, self.iod as u64)?;
        w.write_u64(12, self.provider_id as u64)?;
        w.write_u64(10, self.area_id as u64)?;
        let systems = write_systems(w, &self.systems, |s| s.constellation)?;
        self.validity.encode(w)?;
        w.write_bool(self.continuity)?;
        w.write_u64(3, self.inter_constellation_bias as u64)?;
        w.write_u64(3, self.inter_frequency_bias as u64)?;
        for system in systems {
            system.encode(w, |w, sat| sat.encode(w))?;
        }
        Ok(())
    }
}
