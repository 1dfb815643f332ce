//! Correction state, accumulated across SSR messages.
//!
//! Each (network, kind) pair is epoch gated: a message of a newer epoch
//! clears that kind before being applied, a message of the same epoch
//! merges into it, an older message is dropped.
use super::{
    AntennaCorrections, ClockCorrection, Correction, CorrectionKind, CorrectionUpdate,
    GridDefinition, Metadata, OrbitCorrection, PhaseBiasFlags, SatPhaseBias, SsrHeader,
    StecCorrection, StecResiduals, Troposphere, Vtec,
};
use crate::{config::IodPolicy, signal::SignalCode, Error};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Completion status of a correction set
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SetStatus {
    #[default]
    Empty,
    /// More messages of this epoch are expected
    Partial,
    Complete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Gate {
    Stale,
    Same,
    Newer,
}

fn gate(cached: Option<Epoch>, epoch: Epoch) -> Gate {
    match cached {
        Some(cached) if epoch < cached => Gate::Stale,
        Some(cached) if epoch == cached => Gate::Same,
        _ => Gate::Newer,
    }
}

/// Per satellite correction set of one kind
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KindState<T> {
    /// Epoch of the current set
    pub epoch: Option<Epoch>,
    /// IOD SSR of the last contributing message
    pub iod_ssr: Option<u8>,
    pub status: SetStatus,
    pub satellites: BTreeMap<SV, T>,
}

impl<T> Default for KindState<T> {
    fn default() -> Self {
        Self {
            epoch: None,
            iod_ssr: None,
            status: SetStatus::Empty,
            satellites: BTreeMap::new(),
        }
    }
}

impl<T> KindState<T> {
    pub fn get(&self, sv: &SV) -> Option<&T> {
        self.satellites.get(sv)
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    fn gate(&self, epoch: Epoch) -> Gate {
        gate(self.epoch, epoch)
    }

    fn reset(&mut self) {
        self.satellites.clear();
        self.status = SetStatus::Empty;
    }

    /// Prepares this set to receive the content of a message tagged by `header`.
    fn begin(&mut self, header: &SsrHeader) {
        if self.gate(header.epoch) == Gate::Newer {
            #[cfg(feature = "log")]
            if !self.satellites.is_empty() {
                debug!("{:?}: new correction epoch", header.epoch);
            }
            self.reset();
        }
        self.stamp(header);
    }

    fn stamp(&mut self, header: &SsrHeader) {
        self.epoch = Some(header.epoch);
        self.iod_ssr = Some(header.iod_ssr);
        self.status = if header.multiple_message {
            SetStatus::Partial
        } else {
            SetStatus::Complete
        };
    }

    fn iod_conflict(&self, epoch: Epoch, iod_ssr: u8) -> bool {
        self.epoch == Some(epoch) && self.iod_ssr.map(|iod| iod != iod_ssr).unwrap_or(false)
    }
}

/// Non satellite specific correction, tagged by its epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot<T> {
    pub epoch: Epoch,
    pub iod_ssr: u8,
    pub value: T,
}

impl<T> Snapshot<T> {
    fn iod_conflict(&self, epoch: Epoch, iod_ssr: u8) -> bool {
        self.epoch == epoch && self.iod_ssr != iod_ssr
    }
}

/// Everything known about one network. Satellite corrections belong to network 0,
/// gridded corrections to the network of their grid id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkState {
    pub orbit: KindState<OrbitCorrection>,
    pub clock: KindState<ClockCorrection>,
    /// High rate clock corrections [m]
    pub high_rate_clock: KindState<f64>,
    /// User range accuracy [m]
    pub ura: KindState<Option<f64>>,
    /// Code biases [m]
    pub code_bias: KindState<BTreeMap<SignalCode, f64>>,
    pub phase_bias: KindState<SatPhaseBias>,
    /// Extended property id of the last phase bias message
    pub phase_bias_property_id: Option<u8>,
    pub vtec: Option<Snapshot<Vtec>>,
    pub troposphere: Option<Snapshot<Troposphere>>,
    pub ionosphere: KindState<StecCorrection>,
    /// Residual layout of the last ionosphere message
    pub ionosphere_residuals: Option<StecResiduals>,
    pub grid: Option<GridDefinition>,
    /// Antenna corrections, with the IOD they were received with
    pub antenna: BTreeMap<SV, (u8, AntennaCorrections)>,
}

impl NetworkState {
    /// Epoch of the set `kind` contributes to
    fn epoch(&self, kind: CorrectionKind) -> Option<Epoch> {
        match kind {
            CorrectionKind::Orbit | CorrectionKind::Combined => self.orbit.epoch,
            CorrectionKind::Clock => self.clock.epoch,
            CorrectionKind::HighRateClock => self.high_rate_clock.epoch,
            CorrectionKind::Ura => self.ura.epoch,
            CorrectionKind::CodeBias => self.code_bias.epoch,
            CorrectionKind::PhaseBias | CorrectionKind::PhaseBiasExtension => {
                self.phase_bias.epoch
            },
            CorrectionKind::Vtec => self.vtec.as_ref().map(|s| s.epoch),
            CorrectionKind::Troposphere => self.troposphere.as_ref().map(|s| s.epoch),
            CorrectionKind::Ionosphere => self.ionosphere.epoch,
            _ => None,
        }
    }

    /// True if another set of this `epoch` was built with a different IOD SSR
    fn iod_conflict(&self, epoch: Epoch, iod_ssr: u8) -> bool {
        self.orbit.iod_conflict(epoch, iod_ssr)
            || self.clock.iod_conflict(epoch, iod_ssr)
            || self.high_rate_clock.iod_conflict(epoch, iod_ssr)
            || self.ura.iod_conflict(epoch, iod_ssr)
            || self.code_bias.iod_conflict(epoch, iod_ssr)
            || self.phase_bias.iod_conflict(epoch, iod_ssr)
            || self.ionosphere.iod_conflict(epoch, iod_ssr)
            || self
                .vtec
                .as_ref()
                .map(|s| s.iod_conflict(epoch, iod_ssr))
                .unwrap_or(false)
            || self
                .troposphere
                .as_ref()
                .map(|s| s.iod_conflict(epoch, iod_ssr))
                .unwrap_or(false)
    }

    /// Orbit and clock of `sv`, when both are known
    pub fn orbit_clock(&self, sv: &SV) -> Option<(&OrbitCorrection, &ClockCorrection)> {
        Some((self.orbit.get(sv)?, self.clock.get(sv)?))
    }

    /// Code bias [m] of `sv` on `code`
    pub fn code_bias(&self, sv: &SV, code: &SignalCode) -> Option<f64> {
        self.code_bias.get(sv)?.get(code).copied()
    }
}

/// SSR corrections accumulated across messages, per network.
/// Networks are created on first reference and never evicted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrectionState {
    networks: BTreeMap<u16, NetworkState>,
    metadata: Option<Metadata>,
}

impl CorrectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(&self, id: u16) -> Option<&NetworkState> {
        self.networks.get(&id)
    }

    pub fn networks(&self) -> impl Iterator<Item = (&u16, &NetworkState)> + '_ {
        self.networks.iter()
    }

    /// Last metadata message
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn clear(&mut self) {
        self.networks.clear();
        self.metadata = None;
    }

    /// (satellite, signal) pairs of the cached phase biases for `constellation`,
    /// in ascending order.
    pub fn phase_bias_signals(&self, constellation: Constellation) -> Vec<(SV, SignalCode)> {
        let network = match self.networks.get(&0) {
            Some(network) => network,
            None => return Vec::new(),
        };
        let mut signals = Vec::new();
        for (sv, sat) in network.phase_bias.satellites.iter() {
            if sv.constellation != constellation {
                continue;
            }
            let mut codes = sat.signals.iter().map(|s| s.signal).collect::<Vec<_>>();
            codes.sort();
            signals.extend(codes.into_iter().map(|code| (*sv, code)));
        }
        signals
    }

    /// Applies a decoded `update`. Returns false when the update was dropped
    /// because an older epoch than the cached one. Under [IodPolicy::Strict],
    /// an IOD mismatch is an error and leaves the state untouched.
    pub fn apply(&mut self, update: &CorrectionUpdate, policy: IodPolicy) -> Result<bool, Error> {
        let correction = &update.correction;
        let id = correction.network_id();

        let header = match correction {
            Correction::Metadata(metadata) => {
                self.metadata = Some(metadata.clone());
                return Ok(true);
            },
            Correction::Grid(grid) => {
                self.networks.entry(id).or_default().grid = Some(grid.clone());
                return Ok(true);
            },
            Correction::SatelliteAntenna(antenna) => {
                let network = self.networks.entry(id).or_default();
                for (sv, corrections) in antenna.satellites.iter() {
                    network
                        .antenna
                        .insert(*sv, (antenna.iod, corrections.clone()));
                }
                return Ok(true);
            },
            _ => match correction.header() {
                Some(header) => header,
                None => return Ok(false),
            },
        };

        let kind = correction.kind();
        let network = self.networks.entry(id).or_default();
        if gate(network.epoch(kind), header.epoch) == Gate::Stale {
            #[cfg(feature = "log")]
            debug!("{:?}: dropping stale {:?} correction", header.epoch, kind);
            return Ok(false);
        }

        let mut consistent = !network.iod_conflict(header.epoch, header.iod_ssr);
        if let Correction::PhaseBiasExtension { property_id, .. } = correction {
            consistent &= network.phase_bias_property_id == Some(*property_id);
        }
        if !consistent {
            match policy {
                IodPolicy::Strict => return Err(Error::InconsistentIssueOfData),
                IodPolicy::Lenient => {
                    #[cfg(feature = "log")]
                    warn!(
                        "{:?}: {:?} correction iod mismatch (iod ssr {})",
                        header.epoch, kind, header.iod_ssr
                    );
                },
            }
        }

        match correction {
            Correction::Orbit { satellites, .. } => {
                network.orbit.begin(header);
                for (sv, orbit) in satellites {
                    network.orbit.satellites.insert(*sv, *orbit);
                }
            },
            Correction::Clock { satellites, .. } => {
                network.clock.begin(header);
                for (sv, clock) in satellites {
                    network.clock.satellites.insert(*sv, *clock);
                }
            },
            Correction::Combined { satellites, .. } => {
                if network.orbit.gate(header.epoch) == Gate::Newer {
                    network.orbit.reset();
                    network.clock.reset();
                }
                network.orbit.stamp(header);
                network.clock.stamp(header);
                for (sv, orbit, clock) in satellites {
                    network.orbit.satellites.insert(*sv, *orbit);
                    network.clock.satellites.insert(*sv, *clock);
                }
            },
            Correction::HighRateClock { satellites, .. } => {
                network.high_rate_clock.begin(header);
                for (sv, clock) in satellites {
                    network.high_rate_clock.satellites.insert(*sv, *clock);
                }
            },
            Correction::Ura { satellites, .. } => {
                network.ura.begin(header);
                for (sv, ura) in satellites {
                    network.ura.satellites.insert(*sv, *ura);
                }
            },
            Correction::CodeBias { satellites, .. } => {
                network.code_bias.begin(header);
                for (sv, biases) in satellites {
                    let biases = biases.iter().map(|b| (b.signal, b.bias_m)).collect();
                    network.code_bias.satellites.insert(*sv, biases);
                }
            },
            Correction::PhaseBias {
                flags, satellites, ..
            } => {
                network.phase_bias.begin(header);
                network.phase_bias_property_id = match flags {
                    PhaseBiasFlags::Extended { property_id, .. } => Some(*property_id),
                    PhaseBiasFlags::Consistency { .. } => None,
                };
                for (sv, sat) in satellites {
                    network.phase_bias.satellites.insert(*sv, sat.clone());
                }
            },
            Correction::PhaseBiasExtension { indicators, .. } => {
                for (sv, code, widelane) in indicators {
                    if let Some(sat) = network.phase_bias.satellites.get_mut(sv) {
                        for bias in sat.signals.iter_mut().filter(|b| b.signal == *code) {
                            bias.widelane = Some(*widelane);
                        }
                    }
                }
            },
            Correction::Vtec { vtec, .. } => {
                network.vtec = Some(Snapshot {
                    epoch: header.epoch,
                    iod_ssr: header.iod_ssr,
                    value: vtec.clone(),
                });
            },
            Correction::Troposphere { troposphere, .. } => {
                network.troposphere = Some(Snapshot {
                    epoch: header.epoch,
                    iod_ssr: header.iod_ssr,
                    value: troposphere.clone(),
                });
            },
            Correction::Ionosphere { ionosphere, .. } => {
                network.ionosphere.begin(header);
                network.ionosphere_residuals = ionosphere.residuals;
                for (sv, stec) in ionosphere.satellites.iter() {
                    network.ionosphere.satellites.insert(*sv, stec.clone());
                }
            },
            _ => {},
        }
        Ok(true)
    }
}
