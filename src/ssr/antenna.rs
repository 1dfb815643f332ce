//! Satellite antenna phase center and group delay corrections
use crate::{
    bits::{BitReader, BitWriter},
    mask::{read_mask, write_mask},
    sv::{sv_from_svid, svid_from_sv},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CORRECTION_SCALE: f64 = 1.0E-3;

/// Nadir angle dependent corrections layout
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NadirRange {
    /// Maximum off nadir angle indicator
    pub max_nadir: u8,
    /// Range extension: (extension + 1) corrections of (3 + extension) bits
    pub extension: u8,
}

impl NadirRange {
    fn width(&self) -> u32 {
        3 + self.extension as u32
    }

    fn count(&self) -> usize {
        self.extension as usize + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyCorrection {
    /// Nadir correction [m]
    pub nadir_m: Option<f64>,
    /// Nadir angle dependent corrections [m]
    pub nadir_dependent_m: Vec<Option<f64>>,
}

/// Corrections of one satellite, per frequency index (0..6)
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AntennaCorrections {
    /// Applies to a frequency set rather than a single frequency
    pub frequency_set: bool,
    pub frequencies: Vec<(u8, FrequencyCorrection)>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteAntenna {
    pub provider_id: u16,
    pub iod: u8,
    pub phase_center: bool,
    pub group_delay: bool,
    pub nadir: Option<NadirRange>,
    /// Applies to a satellite set rather than a single satellite
    pub satellite_set: bool,
    pub satellites: Vec<(SV, AntennaCorrections)>,
}

impl SatelliteAntenna {
    pub(crate) fn decode(r: &mut BitReader, constellation: Constellation) -> Result<Self, Error> {
        let provider_id = r.read_u16(16)?;
        let iod = r.read_u8(6)?;
        let phase_center = r.read_bool()?;
        let group_delay = r.read_bool()?;
        let nadir = if r.read_bool()? {
            Some(NadirRange {
                max_nadir: r.read_u8(5)?,
                extension: r.read_u8(4)?,
            })
        } else {
            None
        };
        let satellite_set = r.read_bool()?;
        let svids = read_mask(r, 64, 1)?;

        let mut satellites = Vec::with_capacity(svids.len());
        for svid in svids {
            let sv = sv_from_svid(constellation, svid as u8)?;
            let frequency_set = r.read_bool()?;
            let mut frequencies = Vec::new();
            for freq in read_mask(r, 6, 0)? {
                let nadir_m = if r.read_bool()? {
                    Some(r.read_scaled(12, CORRECTION_SCALE)?)
                } else {
                    None
                };
                let mut nadir_dependent_m = Vec::new();
                if let Some(range) = &nadir {
                    for _ in 0..range.count() {
                        nadir_dependent_m.push(r.read_scaled_opt(range.width(), CORRECTION_SCALE)?);
                    }
                }
                frequencies.push((
                    freq as u8,
                    FrequencyCorrection {
                        nadir_m,
                        nadir_dependent_m,
                    },
                ));
            }
            satellites.push((
                sv,
                AntennaCorrections {
                    frequency_set,
                    frequencies,
                },
            ));
        }

        Ok(Self {
            provider_id,
            iod,
            phase_center,
            group_delay,
            nadir,
            satellite_set,
            satellites,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(16, self.provider_id as u64)?;
        w.write_u64(6, self.iod as u64)?;
        w.write_bool(self.phase_center)?;
        w.write_bool(self.group_delay)?;
        w.write_bool(self.nadir.is_some())?;
        if let Some(range) = &self.nadir {
            w.write_u64(5, range.max_nadir as u64)?;
            w.write_u64(4, range.extension as u64)?;
        }
        w.write_bool(self.satellite_set)?;

        let mut satellites = self.satellites.iter().collect::<Vec<_>>();
        satellites.sort_by_key(|(sv, _)| sv.prn);
        let svids = satellites
            .iter()
            .map(|(sv, _)| svid_from_sv(*sv).map(|svid| svid as u32))
            .collect::<Result<Vec<_>, Error>>()?;
        write_mask(w, &svids, 64, 1)?;

        for (_, corrections) in satellites {
            w.write_bool(corrections.frequency_set)?;
            let mut frequencies = corrections.frequencies.iter().collect::<Vec<_>>();
            frequencies.sort_by_key(|(freq, _)| *freq);
            let indices = frequencies.iter().map(|(f, _)| *f as u32).collect::<Vec<_>>();
            write_mask(w, &indices, 6, 0)?;
            for (_, freq) in frequencies {
                w.write_bool(freq.nadir_m.is_some())?;
                if let Some(nadir_m) = freq.nadir_m {
                    w.write_scaled(12, nadir_m, CORRECTION_SCALE)?;
                }
                if let Some(range) = &self.nadir {
                    for k in 0..range.count() {
                        let value = freq.nadir_dependent_m.get(k).copied().flatten();
                        w.write_scaled_opt(range.width(), value, CORRECTION_SCALE)?;
                    }
                }
            }
        }
        Ok(())
    }
}
