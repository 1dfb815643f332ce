//! Primary and extended service areas
use super::tables::{self, lookup};
use super::{read_epoch, write_epoch, Validity};
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Area point latitude / longitude scaling [deg]
pub(crate) const AREA_SCALE: f64 = 1.1E-8;

pub(crate) fn read_latlon(r: &mut BitReader) -> Result<(f64, f64), Error> {
    Ok((r.read_scaled(34, AREA_SCALE)?, r.read_scaled(35, AREA_SCALE)?))
}

pub(crate) fn write_latlon(w: &mut BitWriter, latitude: f64, longitude: f64) -> Result<(), Error> {
    w.write_scaled(34, latitude, AREA_SCALE)?;
    w.write_scaled(35, longitude, AREA_SCALE)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AreaShape {
    /// Validity radius around a point
    Circle {
        latitude_deg: f64,
        longitude_deg: f64,
        radius: u32,
    },
    /// Polygon vertices (latitude, longitude) [deg]
    Polygon(Vec<(f64, f64)>),
    /// Reserved area type, without parameters
    Reserved(u8),
}

impl AreaShape {
    fn area_type(&self) -> u8 {
        match self {
            Self::Circle { .. } => 0,
            Self::Polygon(_) => 1,
            Self::Reserved(t) => *t,
        }
    }
}

/// Extended area degradation factors, as table indices
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Degradation {
    pub integrity_risk: u8,
    pub time_to_detect: u8,
    pub time: u8,
    pub spatial: u8,
}

impl Degradation {
    pub fn integrity_risk(&self) -> Option<f64> {
        lookup(&tables::RISK_DEGRADATION, self.integrity_risk)
    }

    pub fn time_to_detect(&self) -> Option<f64> {
        lookup(&tables::DETECTION_DEGRADATION, self.time_to_detect)
    }

    pub fn time(&self) -> Option<f64> {
        lookup(&tables::TIME_DEGRADATION, self.time)
    }

    pub fn spatial(&self) -> Option<f64> {
        lookup(&tables::SPATIAL_DEGRADATION, self.spatial)
    }
}

/// Service area definition. Extended areas carry [Degradation] factors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServiceArea {
    pub epoch: Epoch,
    pub iod: u8,
    pub provider_id: u16,
    pub area_id: u16,
    pub validity: Validity,
    /// More messages follow
    pub continuation: bool,
    pub sequence: u8,
    pub degradation: Option<Degradation>,
    pub shape: AreaShape,
}

impl ServiceArea {
    pub(crate) fn decode(
        r: &mut BitReader,
        reference: Epoch,
        extended: bool,
    ) -> Result<Self, Error> {
        let epoch = read_epoch(r, reference)?;
        let iod = r.read_u8(6)?;
        let provider_id = r.read_u16(12)?;
        let area_id = r.read_u16(10)?;
        let validity = Validity::decode(r)?;
        let area_type = r.read_u8(2)?;
        let continuation = r.read_bool()?;
        let sequence = r.read_u8(5)?;
        let degradation = if extended {
            Some(Degradation {
                integrity_risk: r.read_u8(2)?,
                time_to_detect: r.read_u8(2)?,
                time: r.read_u8(3)?,
                spatial: r.read_u8(3)?,
            })
        } else {
            None
        };
        let shape = match area_type {
            0 => {
                let (latitude_deg, longitude_deg) = read_latlon(r)?;
                AreaShape::Circle {
                    latitude_deg,
                    longitude_deg,
                    radius: r.read_u32(20)?,
                }
            },
            1 => {
                let npoints = r.read_u8(8)?;
                let points = (0..npoints)
                    .map(|_| read_latlon(r))
                    .collect::<Result<Vec<_>, _>>()?;
                AreaShape::Polygon(points)
            },
            t => AreaShape::Reserved(t),
        };
        Ok(Self {
            epoch,
            iod,
            provider_id,
            area_id,
            validity,
            continuation,
            sequence,
            degradation,
            shape,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        write_epoch(w, self.epoch)?;
        w.write_u64(6, self.iod as u64)?;
        w.write_u64(12, self.provider_id as u64)?;
        w.write_u64(10, self.area_id as u64)?;
        self.validity.encode(w)?;
        w.write_u64(2, self.shape.area_type() as u64)?;
        w.write_bool(self.continuation)?;
        w.write_u64(5, self.sequence as u64)?;
        if let Some(degradation) = &self.degradation {
            w.write_u64(2, degradation.integrity_risk as u64)?;
            w.write_u64(2, degradation.time_to_detect as u64)?;
            w.write_u64(3, degradation.time as u64)?;
            w.write_u64(3, degradation.spatial as u64)?;
        }
        match &self.shape {
            AreaShape::Circle {
                latitude_deg,
                longitude_deg,
                radius,
            } => {
                write_latlon(w, *latitude_deg, *longitude_deg)?;
                w.write_u64(20, *radius as u64)?;
            },
            AreaShape::Polygon(points) => {
                w.write_u64(8, points.len() as u64)?;
                for (latitude, longitude) in points {
                    write_latlon(w, *latitude, *longitude)?;
                }
            },
            AreaShape::Reserved(_) => {},
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::from_week_tow;
    use hifitime::TimeScale;

    #[test]
    fn service_areas() {
        let t = from_week_tow(2310, 100.0, TimeScale::GPST);
        let primary = ServiceArea {
            epoch: t,
            iod: 5,
            provider_id: 12,
            area_id: 1,
            validity: Validity {
                period: 15,
                update_interval: 600,
            },
            continuation: false,
            sequence: 0,
            degradation: None,
            shape: AreaShape::Circle {
                latitude_deg: 35.6,
                longitude_deg: 139.7,
                radius: 50_000,
            },
        };
        let mut w = BitWriter::new();
        primary.encode(&mut w).unwrap();
        assert_eq!(w.position(), 62 + 24 + 89);
        let buf = w.into_bytes();
        let decoded = ServiceArea::decode(&mut BitReader::new(&buf), t, false).unwrap();
        match decoded.shape {
            AreaShape::Circle {
                latitude_deg,
                longitude_deg,
                radius,
            } => {
                assert!((latitude_deg - 35.6).abs() < 1e-7);
                assert!((longitude_deg - 139.7).abs() < 1e-7);
                assert_eq!(radius, 50_000);
            },
            shape => panic!("unexpected shape {:?}", shape),
        }

        let extended = ServiceArea {
            degradation: Some(Degradation {
                integrity_risk: 1,
                time_to_detect: 3,
                time: 7,
                spatial: 0,
            }),
            shape: AreaShape::Polygon(vec![(10.0, 20.0), (10.5, 20.0), (10.5, -20.5)]),
            continuation: true,
            sequence: 3,
            ..primary
        };
        let mut w = BitWriter::new();
        extended.encode(&mut w).unwrap();
        assert_eq!(w.position(), 62 + 24 + 10 + 8 + 3 * 69);
        let buf = w.into_bytes();
        let decoded = ServiceArea::decode(&mut BitReader::new(&buf), t, true).unwrap();
        let degradation = decoded.degradation.unwrap();
        assert_eq!(degradation.integrity_risk(), Some(10.0));
        assert_eq!(degradation.time_to_detect(), Some(4.0));
        assert_eq!(degradation.time(), None);
        assert_eq!(degradation.spatial(), Some(1.0));
        assert!(decoded.continuation);
        match decoded.shape {
            AreaShape::Polygon(points) => {
                assert_eq!(points.len(), 3);
                assert!((points[2].1 + 20.5).abs() < 1e-7);
            },
            shape => panic!("unexpected shape {:?}", shape),
        }
    }
}
