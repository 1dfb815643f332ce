//! Satellite visibility and multipath maps
use super::area::{read_latlon, write_latlon};
use super::tables::{self, lookup};
use super::{read_epoch, write_epoch};
use crate::{
    bits::{BitReader, BitWriter},
    mask::{read_mask, write_mask},
    Error,
};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Multipath map message type
const MULTIPATH_MAP: u16 = 2072;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Height [m]
    pub height_m: i16,
}

impl AreaPoint {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let (latitude_deg, longitude_deg) = read_latlon(r)?;
        Ok(Self {
            latitude_deg,
            longitude_deg,
            height_m: r.read_i64(14)? as i16,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_latlon(w, self.latitude_deg, self.longitude_deg)?;
        w.write_i64(14, self.height_m as i64)
    }
}

/// Elevation masks around area points
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisibilityMap {
    pub epoch: Epoch,
    pub continuation: bool,
    pub sequence: u8,
    /// Area points, with (azimuth [deg], elevation mask [deg]) slices
    /// in increasing azimuth order
    pub points: Vec<(AreaPoint, Vec<(u16, u8)>)>,
}

impl VisibilityMap {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let npoints = r.read_u8(8)?;
        let continuation = r.read_bool()?;
        let sequence = r.read_u8(5)?;
        let mut points = Vec::with_capacity(npoints as usize);
        for _ in 0..npoints {
            let point = AreaPoint::decode(r)?;
            let nslices = r.read_u8(6)?;
            let mut azimuth = 0u16;
            let mut slices = Vec::with_capacity(nslices as usize);
            for _ in 0..nslices {
                azimuth += r.read_u16(9)?;
                slices.push((azimuth, r.read_u8(7)?));
            }
            points.push((point, slices));
        }
        Ok(Self {
            epoch,
            continuation,
            sequence,
            points,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(8, self.points.len() as u64)?;
        w.write_bool(self.continuation)?;
        w.write_u64(5, self.sequence as u64)?;
        for (point, slices) in &self.points {
            point.encode(w)?;
            w.write_u64(6, slices.len() as u64)?;
            let mut azimuth = 0u16;
            for (slice_azimuth, elevation) in slices {
                let delta = slice_azimuth
                    .checked_sub(azimuth)
                    .ok_or(Error::FieldOverflow(9))?;
                w.write_u64(9, delta as u64)?;
                w.write_u64(7, *elevation as u64)?;
                azimuth = *slice_azimuth;
            }
        }
        Ok(())
    }
}

/// Gaussian mixture model component
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GmmComponent {
    pub probability: f64,
    /// Mean index
    pub mean: u8,
    /// Standard deviation index
    pub sigma: u8,
}

impl GmmComponent {
    /// Component mean [m]
    pub fn mean_m(&self) -> Option<f64> {
        lookup(&tables::GMM_MEAN, self.mean)
    }

    /// Component standard deviation [m]
    pub fn sigma_m(&self) -> Option<f64> {
        lookup(&tables::GMM_SIGMA, self.sigma)
    }
}

/// Mats Brenner (a, b, c) or Jahn (a, b, c, d) parameters of one signal
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalMultipath {
    pub signal: u8,
    /// Parameter a index
    pub a: u8,
    pub b: f64,
    pub c: f64,
    /// Jahn model only
    pub d: Option<f64>,
}

impl SignalMultipath {
    /// Parameter a [m]
    pub fn a_m(&self) -> Option<f64> {
        lookup(&tables::GMM_SIGMA, self.a)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MultipathParameters {
    /// Gaussian mixture model (model 0)
    Gmm(Vec<GmmComponent>),
    /// Per signal parameters (models 1 and 2)
    Signals(Vec<SignalMultipath>),
    /// Unknown model, position only
    None,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultipathMap {
    pub epoch: Epoch,
    /// Model id: 0 GMM, 1 Mats Brenner, 2 Jahn
    pub model: u8,
    pub continuation: bool,
    pub sequence: u8,
    pub areas: Vec<(AreaPoint, MultipathParameters)>,
}

impl MultipathMap {
    pub(crate) fn decode(r: &mut BitReader, reference: Epoch) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let nareas = r.read_u8(8)?;
        let model = r.read_u8(3)?;
        let continuation = r.read_bool()?;
        let sequence = r.read_u8(5)?;

        let mut areas = Vec::with_capacity(nareas as usize);
        for _ in 0..nareas {
            let signals = if model == 1 || model == 2 {
                read_mask(r, 8, 0)?
            } else {
                Vec::new()
            };
            let point = AreaPoint::decode(r)?;
            let parameters = match model {
                0 => {
                    let ncomponents = r.read_u8(2)?;
                    let mut components = Vec::with_capacity(ncomponents as usize);
                    for _ in 0..ncomponents {
                        components.push(GmmComponent {
                            probability: r.read_uscaled(4, 0.0625)?,
                            mean: r.read_u8(4)?,
                            sigma: r.read_u8(4)?,
                        });
                    }
                    MultipathParameters::Gmm(components)
                },
                1 | 2 => {
                    let mut parameters = Vec::with_capacity(signals.len());
                    for signal in signals {
                        let a = r.read_u8(4)?;
                        let b = r.read_scaled(5, 0.25)?;
                        let c = r.read_scaled(5, 0.0625)?;
                        let d = if model == 2 {
                            Some(r.read_uscaled(8, 0.3515625)?)
                        } else {
                            None
                        };
                        parameters.push(SignalMultipath {
                            signal: signal as u8,
                            a,
                            b,
                            c,
                            d,
                        });
                    }
                    MultipathParameters::Signals(parameters)
                },
                _ => MultipathParameters::None,
            };
            areas.push((point, parameters));
        }

        Ok(Self {
            epoch,
            model,
            continuation,
            sequence,
            areas,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(8, self.areas.len() as u64)?;
        w.write_u64(3, self.model as u64)?;
        w.write_bool(self.continuation)?;
        w.write_u64(5, self.sequence as u64)?;

        for (point, parameters) in &self.areas {
            match (self.model, parameters) {
                (0, MultipathParameters::Gmm(components)) => {
                    point.encode(w)?;
                    w.write_u64(2, components.len() as u64)?;
                    for component in components {
                        w.write_uscaled(4, component.probability, 0.0625)?;
                        w.write_u64(4, component.mean as u64)?;
                        w.write_u64(4, component.sigma as u64)?;
                    }
                },
                (1 | 2, MultipathParameters::Signals(signals)) => {
                    let mut signals = signals.iter().collect::<Vec<_>>();
                    signals.sort_by_key(|s| s.signal);
                    let indices = signals.iter().map(|s| s.signal as u32).collect::<Vec<_>>();
                    write_mask(w, &indices, 8, 0)?;
                    point.encode(w)?;
                    for signal in signals {
                        w.write_u64(4, signal.a as u64)?;
                        w.write_scaled(5, signal.b, 0.25)?;
                        w.write_scaled(5, signal.c, 0.0625)?;
                        if self.model == 2 {
                            w.write_uscaled(8, signal.d.unwrap_or(0.0), 0.3515625)?;
                        }
                    }
                },
                (3..=7, MultipathParameters::None) => point.encode(w)?,
                _ => return Err(Error::RecordMismatch(MULTIPATH_MAP)),
            }
        }
        Ok(())
    }
}
