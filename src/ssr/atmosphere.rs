//! Gridded troposphere and slant ionosphere (STEC) corrections.
//! Both are keyed by grid id, and may carry per grid point residuals
//! whose width is part of the message.
use crate::{
    bits::{BitReader, BitWriter},
    mask::{read_mask, write_mask},
    sv::{sv_from_svid, svid_from_sv},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// (width, scale, offset) of the hydrostatic then wet mapping function
/// coefficients a, b and c.
const MAPPING_FIELDS: [(u32, f64, f64); 6] = [
    (11, 2.5E-7, 0.00118),
    (9, 5.0E-6, 0.00298),
    (9, 2.0E-4, 0.0682),
    (13, 1.0E-6, 0.000104),
    (6, 2.5E-5, 0.0015),
    (5, 2.0E-3, 0.048),
];

const HYDROSTATIC_OFFSET: f64 = 2.3;
const WET_OFFSET: f64 = 0.252;
const TROPO_RESIDUAL_SCALE: f64 = 1.0E-4;

/// Zenith delay polynomial: offset and gradients
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TropoPolynomial {
    pub c00_m: f64,
    /// West to east gradient [m/deg]
    pub c10_m_deg: f64,
    /// South to north gradient [m/deg]
    pub c01_m_deg: f64,
}

impl TropoPolynomial {
    fn decode(r: &mut BitReader, offset: f64) -> Result<Self, Error> {
        Ok(Self {
            c00_m: r.read_scaled(13, 1.0E-4)? + offset,
            c10_m_deg: r.read_scaled(15, 1.0E-5)?,
            c01_m_deg: r.read_scaled(15, 1.0E-5)?,
        })
    }

    fn encode(&self, w: &mut BitWriter, offset: f64) -> Result<(), Error> {
        w.write_scaled(13, self.c00_m - offset, 1.0E-4)?;
        w.write_scaled(15, self.c10_m_deg, 1.0E-5)?;
        w.write_scaled(15, self.c01_m_deg, 1.0E-5)
    }
}

/// Grid point residuals. A null width means that component is not transmitted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TropoResiduals {
    /// Index of the first grid point
    pub offset: u16,
    pub hydrostatic_width: u8,
    pub wet_width: u8,
    /// Hydrostatic residuals [m], one per grid point
    pub hydrostatic_m: Vec<Option<f64>>,
    /// Wet residuals [m], one per grid point
    pub wet_m: Vec<Option<f64>>,
}

impl TropoResiduals {
    /// Number of grid points
    pub fn count(&self) -> usize {
        self.hydrostatic_m.len().max(self.wet_m.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Troposphere {
    pub grid_id: u16,
    /// Hydrostatic mapping function coefficients (a, b, c)
    pub hydrostatic_mapping: [f64; 3],
    /// Wet mapping function coefficients (a, b, c)
    pub wet_mapping: [f64; 3],
    pub hydrostatic: TropoPolynomial,
    pub wet: TropoPolynomial,
    pub residuals: Option<TropoResiduals>,
}

impl Troposphere {
    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let grid_id = r.read_u16(10)?;
        let has_residuals = r.read_bool()?;
        let mut mapping = [0.0; 6];
        for (value, (width, scale, offset)) in mapping.iter_mut().zip(MAPPING_FIELDS) {
            *value = r.read_scaled(width, scale)? + offset;
        }
        let hydrostatic = TropoPolynomial::decode(r, HYDROSTATIC_OFFSET)?;
        let wet = TropoPolynomial::decode(r, WET_OFFSET)?;

        let residuals = if has_residuals {
            let offset = r.read_u16(12)?;
            let count = r.read_u16(12)? as usize;
            let hydrostatic_width = r.read_u8(4)?;
            let wet_width = r.read_u8(4)?;
            let mut hydrostatic_m = Vec::new();
            let mut wet_m = Vec::new();
            for _ in 0..count {
                if hydrostatic_width > 0 {
                    hydrostatic_m
                        .push(r.read_scaled_opt(hydrostatic_width as u32, TROPO_RESIDUAL_SCALE)?);
                }
                if wet_width > 0 {
                    wet_m.push(r.read_scaled_opt(wet_width as u32, TROPO_RESIDUAL_SCALE)?);
                }
            }
            Some(TropoResiduals {
                offset,
                hydrostatic_width,
                wet_width,
                hydrostatic_m,
                wet_m,
            })
        } else {
            None
        };

        Ok(Self {
            grid_id,
            hydrostatic_mapping: [mapping[0], mapping[1], mapping[2]],
            wet_mapping: [mapping[3], mapping[4], mapping[5]],
            hydrostatic,
            wet,
            residuals,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(10, self.grid_id as u64)?;
        w.write_bool(self.residuals.is_some())?;
        let mapping = self.hydrostatic_mapping.iter().chain(self.wet_mapping.iter());
        for (value, (width, scale, offset)) in mapping.zip(MAPPING_FIELDS) {
            w.write_scaled(width, value - offset, scale)?;
        }
        self.hydrostatic.encode(w, HYDROSTATIC_OFFSET)?;
        self.wet.encode(w, WET_OFFSET)?;

        if let Some(residuals) = &self.residuals {
            let count = residuals.count();
            w.write_u64(12, residuals.offset as u64)?;
            w.write_u64(12, count as u64)?;
            w.write_u64(4, residuals.hydrostatic_width as u64)?;
            w.write_u64(4, residuals.wet_width as u64)?;
            for k in 0..count {
                if residuals.hydrostatic_width > 0 {
                    let value = residuals.hydrostatic_m.get(k).copied().flatten();
                    w.write_scaled_opt(
                        residuals.hydrostatic_width as u32,
                        value,
                        TROPO_RESIDUAL_SCALE,
                    )?;
                }
                if residuals.wet_width > 0 {
                    let value = residuals.wet_m.get(k).copied().flatten();
                    w.write_scaled_opt(residuals.wet_width as u32, value, TROPO_RESIDUAL_SCALE)?;
                }
            }
        }
        Ok(())
    }
}

/// Residual block layout of a STEC message
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StecResiduals {
    /// Index of the first grid point
    pub offset: u16,
    /// Number of grid points
    pub count: u16,
    /// Residual width [bits], 0 when no residual is transmitted
    pub width: u8,
    /// Resolution exponent: scale is 1E-3 * 2^exponent TECU
    pub scale_exponent: u8,
}

impl StecResiduals {
    /// Residual scale [TECU]
    pub fn scale(&self) -> f64 {
        1.0E-3 * (1u32 << self.scale_exponent) as f64
    }
}

/// STEC correction of one satellite
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StecCorrection {
    /// Polynomial offset [TECU]
    pub c00_tecu: Option<f64>,
    /// South to north gradient [TECU/deg]
    pub c01_tecu_deg: Option<f64>,
    /// West to east gradient [TECU/deg]
    pub c10_tecu_deg: Option<f64>,
    /// Grid point residuals [TECU]
    pub residuals_tecu: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ionosphere {
    pub grid_id: u16,
    /// Polynomial block is present
    pub polynomial: bool,
    /// Polynomial gradients are present
    pub gradient: bool,
    pub residuals: Option<StecResiduals>,
    pub satellites: Vec<(SV, StecCorrection)>,
}

impl Ionosphere {
    pub(crate) fn decode(r: &mut BitReader, constellation: Constellation) -> Result<Self, Error> {
        let grid_id = r.read_u16(10)?;
        let polynomial = r.read_bool()?;
        let has_residuals = r.read_bool()?;
        let mut satellites = read_mask(r, 64, 1)?
            .into_iter()
            .map(|svid| {
                let sv = sv_from_svid(constellation, svid as u8)?;
                Ok((sv, StecCorrection::default()))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let mut gradient = false;
        if polynomial {
            gradient = r.read_bool()?;
            for (_, stec) in satellites.iter_mut() {
                stec.c00_tecu = Some(r.read_scaled(17, 0.01)?);
                if gradient {
                    stec.c01_tecu_deg = Some(r.read_scaled(18, 1.0E-3)?);
                    stec.c10_tecu_deg = Some(r.read_scaled(18, 1.0E-3)?);
                }
            }
        }

        let residuals = if has_residuals {
            let offset = r.read_u16(12)?;
            let count = r.read_u16(12)?;
            let width = r.read_u8(5)?;
            let scale_exponent = if width > 0 { r.read_u8(3)? } else { 0 };
            let layout = StecResiduals {
                offset,
                count,
                width,
                scale_exponent,
            };
            if width > 0 {
                let scale = layout.scale();
                for (_, stec) in satellites.iter_mut() {
                    for _ in 0..count {
                        stec.residuals_tecu.push(r.read_scaled_opt(width as u32, scale)?);
                    }
                }
            }
            Some(layout)
        } else {
            None
        };

        Ok(Self {
            grid_id,
            polynomial,
            gradient,
            residuals,
            satellites,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(10, self.grid_id as u64)?;
        w.write_bool(self.polynomial)?;
        w.write_bool(self.residuals.is_some())?;
        // the mask imposes ascending order
        let mut satellites = self.satellites.iter().collect::<Vec<_>>();
        satellites.sort_by_key(|(sv, _)| sv.prn);
        let svids = satellites
            .iter()
            .map(|(sv, _)| svid_from_sv(*sv).map(|svid| svid as u32))
            .collect::<Result<Vec<_>, Error>>()?;
        write_mask(w, &svids, 64, 1)?;

        if self.polynomial {
            w.write_bool(self.gradient)?;
            for (_, stec) in satellites.iter() {
                w.write_scaled(17, stec.c00_tecu.unwrap_or(0.0), 0.01)?;
                if self.gradient {
                    w.write_scaled(18, stec.c01_tecu_deg.unwrap_or(0.0), 1.0E-3)?;
                    w.write_scaled(18, stec.c10_tecu_deg.unwrap_or(0.0), 1.0E-3)?;
                }
            }
        }

        if let Some(layout) = &self.residuals {
            w.write_u64(12, layout.offset as u64)?;
            w.write_u64(12, layout.count as u64)?;
            w.write_u64(5, layout.width as u64)?;
            if layout.width > 0 {
                w.write_u64(3, layout.scale_exponent as u64)?;
                let scale = layout.scale();
                for (_, stec) in satellites.iter() {
                    for k in 0..layout.count as usize {
                        let value = stec.residuals_tecu.get(k).copied().flatten();
                        w.write_scaled_opt(layout.width as u32, value, scale)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn troposphere() -> Troposphere {
        Troposphere {
            grid_id: 12,
            hydrostatic_mapping: [0.00118, 0.00298 + 5.0E-6, 0.0682],
            wet_mapping: [0.000104, 0.0015, 0.048 - 2.0E-3],
            hydrostatic: TropoPolynomial {
                c00_m: 2.3102,
                c10_m_deg: 1.0E-5,
                c01_m_deg: -2.0E-5,
            },
            wet: TropoPolynomial {
                c00_m: 0.1,
                c10_m_deg: 0.0,
                c01_m_deg: 0.0,
            },
            residuals: Some(TropoResiduals {
                offset: 3,
                hydrostatic_width: 0,
                wet_width: 6,
                hydrostatic_m: vec![],
                wet_m: vec![Some(0.0012), None, Some(-0.0031)],
            }),
        }
    }

    #[test]
    fn tropo_residuals() {
        let tropo = troposphere();
        let mut w = BitWriter::new();
        tropo.encode(&mut w).unwrap();
        assert_eq!(w.position(), 11 + 53 + 43 + 43 + 32 + 3 * 6);

        let buf = w.into_bytes();
        let decoded = Troposphere::decode(&mut BitReader::new(&buf)).unwrap();
        assert_eq!(decoded.grid_id, 12);
        assert!((decoded.hydrostatic.c00_m - 2.3102).abs() < 1e-9);
        assert!((decoded.wet.c00_m - 0.1).abs() < 1e-9);
        assert!((decoded.wet_mapping[2] - 0.046).abs() < 1e-9);
        let residuals = decoded.residuals.unwrap();
        assert_eq!(residuals.offset, 3);
        assert_eq!(residuals.count(), 3);
        assert!(residuals.hydrostatic_m.is_empty());
        assert_eq!(residuals.wet_m[1], None);
        assert!((residuals.wet_m[2].unwrap() + 0.0031).abs() < 1e-9);
    }

    #[test]
    fn stec_variable_width() {
        let iono = Ionosphere {
            grid_id: 7,
            polynomial: true,
            gradient: true,
            residuals: Some(StecResiduals {
                offset: 0,
                count: 2,
                width: 7,
                scale_exponent: 2,
            }),
            satellites: vec![
                (
                    SV::new(Constellation::QZSS, 194),
                    StecCorrection {
                        c00_tecu: Some(-3.21),
                        c01_tecu_deg: Some(0.012),
                        c10_tecu_deg: Some(-0.004),
                        residuals_tecu: vec![Some(0.004), Some(-0.252)],
                    },
                ),
                (
                    SV::new(Constellation::QZSS, 199),
                    StecCorrection {
                        c00_tecu: Some(10.0),
                        c01_tecu_deg: Some(0.0),
                        c10_tecu_deg: Some(0.0),
                        residuals_tecu: vec![None, Some(0.0)],
                    },
                ),
            ],
        };
        let mut w = BitWriter::new();
        iono.encode(&mut w).unwrap();
        assert_eq!(
            w.position(),
            12 + 64 + 1 + 2 * (17 + 36) + 29 + 3 + 2 * 2 * 7
        );

        let buf = w.into_bytes();
        let decoded = Ionosphere::decode(&mut BitReader::new(&buf), Constellation::QZSS).unwrap();
        assert_eq!(decoded, {
            let mut expected = iono.clone();
            for (_, stec) in expected.satellites.iter_mut() {
                stec.c00_tecu = stec.c00_tecu.map(|c| (c / 0.01_f64).round() * 0.01);
                stec.c01_tecu_deg = stec.c01_tecu_deg.map(|c| (c / 1.0E-3_f64).round() * 1.0E-3);
                stec.c10_tecu_deg = stec.c10_tecu_deg.map(|c| (c / 1.0E-3_f64).round() * 1.0E-3);
                stec.residuals_tecu = stec
                    .residuals_tecu
                    .iter()
                    .map(|r| r.map(|r| (r / 4.0E-3_f64).round() * 4.0E-3))
                    .collect();
            }
            expected
        });
    }

    #[test]
    fn stec_zero_width_residuals() {
        let iono = Ionosphere {
            grid_id: 1,
            polynomial: false,
            gradient: false,
            residuals: Some(StecResiduals {
                offset: 4,
                count: 9,
                width: 0,
                scale_exponent: 0,
            }),
            satellites: vec![(SV::new(Constellation::GPS, 3), StecCorrection::default())],
        };
        let mut w = BitWriter::new();
        iono.encode(&mut w).unwrap();
        assert_eq!(w.position(), 12 + 64 + 29);
        let buf = w.into_bytes();
        let decoded = Ionosphere::decode(&mut BitReader::new(&buf), Constellation::GPS).unwrap();
        assert_eq!(decoded, iono);
    }
}
