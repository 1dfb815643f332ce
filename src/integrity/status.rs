//! Minimum integrity: constellation, satellite and signal status
use super::{read_epoch, read_satellites, read_systems, write_epoch, write_satellites};
use super::{write_systems, Validity};
use crate::{
    bits::{BitReader, BitWriter},
    mask::decode_mask,
    sv::sv_from_svid,
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of the signals of one satellite
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteStatus {
    /// Frequency mask, MSB being frequency index 0
    pub frequency_mask: u8,
    pub iod_frequency: u8,
    /// Frequency integrity status bits
    pub integrity: u8,
    /// Frequency monitoring status bits
    pub monitoring: u8,
}

impl SatelliteStatus {
    /// Frequency indices described by this status
    pub fn frequencies(&self) -> Vec<u8> {
        decode_mask(self.frequency_mask as u64, 8, 0)
            .0
            .into_iter()
            .map(|f| f as u8)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemStatus {
    pub constellation: Constellation,
    pub iod_mask: u8,
    /// Satellite integrity status mask
    pub integrity: u64,
    /// Satellite monitoring status mask
    pub monitoring: u64,
    /// Fault source: 0 orbit, 1 clock, 2 atmosphere, 3 other
    pub fault_source: u8,
    pub satellites: Vec<(SV, SatelliteStatus)>,
}

impl SystemStatus {
    fn mask_satellites(&self, bits: u64) -> Result<Vec<SV>, Error> {
        decode_mask(bits, 64, 1)
            .0
            .into_iter()
            .map(|svid| sv_from_svid(self.constellation, svid as u8))
            .collect()
    }

    /// Satellites flagged by the integrity status mask
    pub fn flagged(&self) -> Result<Vec<SV>, Error> {
        self.mask_satellites(self.integrity)
    }

    /// Satellites under monitoring
    pub fn monitored(&self) -> Result<Vec<SV>, Error> {
        self.mask_satellites(self.monitoring)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MinimumIntegrity {
    pub provider_id: u16,
    pub epoch: Epoch,
    /// Constellation integrity status bits
    pub constellation_integrity: u16,
    /// Constellation monitoring status bits
    pub constellation_monitoring: u16,
    pub validity: Validity,
    pub systems: Vec<SystemStatus>,
}

impl MinimumIntegrity {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let provider_id = r.read_u16(12)?;
        let epoch = read_epoch(r, reference)?;
        let constellations = read_systems(r)?;
        let constellation_integrity = r.read_u16(16)?;
        let constellation_monitoring = r.read_u16(16)?;
        let validity = Validity::decode(r)?;

        let mut systems = Vec::with_capacity(constellations.len());
        for constellation in constellations {
            let svs = read_satellites(r, constellation)?;
            let iod_mask = r.read_u8(2)?;
            let integrity = r.read_u64(64)?;
            let monitoring = r.read_u64(64)?;
            let fault_source = r.read_u8(3)?;
            let mut satellites = Vec::with_capacity(svs.len());
            for sv in svs {
                satellites.push((
                    sv,
                    SatelliteStatus {
                        frequency_mask: r.read_u8(8)?,
                        iod_frequency: r.read_u8(2)?,
                        integrity: r.read_u8(8)?,
                        monitoring: r.read_u8(8)?,
                    },
                ));
            }
            systems.push(SystemStatus {
                constellation,
                iod_mask,
                integrity,
                monitoring,
                fault_source,
                satellites,
            });
        }

        Ok(Self {
            provider_id,
            epoch,
            constellation_integrity,
            constellation_monitoring,
            validity,
            systems,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(12, self.provider_id as u64)?;
        write_epoch(w, self.epoch)?;
        let systems = write_systems(w, &self.systems, |s| s.constellation)?;
        w.write_u64(16, self.constellation_integrity as u64)?;
        w.write_u64(16, self.constellation_monitoring as u64)?;
        self.validity.encode(w)?;

        for system in systems {
            let satellites = write_satellites(w, &system.satellites)?;
            w.write_u64(2, system.iod_mask as u64)?;
            w.write_u64(64, system.integrity)?;
            w.write_u64(64, system.monitoring)?;
            w.write_u64(3, system.fault_source as u64)?;
            for (_, status) in satellites {
                w.write_u64(8, status.frequency_mask as u64)?;
                w.write_u64(2, status.iod_frequency as u64)?;
                w.write_u64(8, status.integrity as u64)?;
                w.write_u64(8, status.monitoring as u64)?;
            }
        }
        Ok(())
    }
}
