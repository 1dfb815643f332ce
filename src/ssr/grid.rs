//! Grid definition: locates the points referenced by
//! troposphere and ionosphere residuals.
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ANGLE_SCALE: f64 = 1.0E-3;
const HEIGHT_SCALE: f64 = 12.5;
const HEIGHT_OFFSET: f64 = 1000.0;
const STEP_SCALE: f64 = 0.01;

/// A resolved grid point
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPoint {
    pub index: u16,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Ellipsoidal height [m], when defined
    pub height_m: Option<f64>,
}

/// Selection of a regular grid
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridMask {
    /// Selected rows
    pub rows: Vec<bool>,
    /// Selected columns
    pub cols: Vec<bool>,
    /// Existing points, over selected rows × selected columns, row major
    pub points: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GridKind {
    /// Reference point followed by relative points (types 0 and 1).
    /// Type 1 carries no height.
    Relative {
        latitude_deg: f64,
        longitude_deg: f64,
        height_m: Option<f64>,
        /// Index of the reference point
        offset: u16,
        /// Point to point increments [deg, deg, m]
        deltas: Vec<(f64, f64, Option<f64>)>,
    },
    /// Regular grid (type 2)
    Regular {
        latitude_deg: f64,
        longitude_deg: f64,
        rows: u8,
        cols: u8,
        lat_step_deg: f64,
        lon_step_deg: f64,
        mask: Option<GridMask>,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridDefinition {
    pub provider_id: u16,
    pub multiple_message: bool,
    pub grid_id: u16,
    pub kind: GridKind,
}

fn read_flags(r: &mut BitReader, count: usize) -> Result<Vec<bool>, Error> {
    (0..count).map(|_| r.read_bool()).collect()
}

fn write_flags(w: &mut BitWriter, flags: &[bool]) -> Result<(), Error> {
    for flag in flags {
        w.write_bool(*flag)?;
    }
    Ok(())
}

impl GridDefinition {
    /// Grid type number
    pub fn grid_type(&self) -> u8 {
        match &self.kind {
            GridKind::Relative { height_m, .. } => {
                if height_m.is_some() {
                    0
                } else {
                    1
                }
            },
            GridKind::Regular { .. } => 2,
        }
    }

    /// Resolves every point of this grid
    pub fn points(&self) -> Vec<GridPoint> {
        match &self.kind {
            GridKind::Relative {
                latitude_deg,
                longitude_deg,
                height_m,
                offset,
                deltas,
            } => {
                let mut point = GridPoint {
                    index: *offset,
                    latitude_deg: *latitude_deg,
                    longitude_deg: *longitude_deg,
                    height_m: *height_m,
                };
                let mut points = vec![point];
                for (dlat, dlon, dh) in deltas {
                    point.index += 1;
                    point.latitude_deg += dlat;
                    point.longitude_deg += dlon;
                    point.height_m = match (point.height_m, dh) {
                        (Some(h), Some(dh)) => Some(h + dh),
                        (h, _) => h,
                    };
                    points.push(point);
                }
                points
            },
            GridKind::Regular {
                latitude_deg,
                longitude_deg,
                rows,
                cols,
                lat_step_deg,
                lon_step_deg,
                mask,
            } => {
                let mut points = Vec::new();
                let mut selected = 0;
                for row in 0..*rows as usize {
                    for col in 0..*cols as usize {
                        if let Some(mask) = mask {
                            let row_ok = mask.rows.get(row).copied().unwrap_or(false);
                            let col_ok = mask.cols.get(col).copied().unwrap_or(false);
                            if !row_ok || !col_ok {
                                continue;
                            }
                            let exists = mask.points.get(selected).copied().unwrap_or(false);
                            selected += 1;
                            if !exists {
                                continue;
                            }
                        }
                        points.push(GridPoint {
                            index: points.len() as u16,
                            latitude_deg: latitude_deg + lat_step_deg * row as f64,
                            longitude_deg: longitude_deg + lon_step_deg * col as f64,
                            height_m: None,
                        });
                    }
                }
                points
            },
        }
    }

    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let provider_id = r.read_u16(16)?;
        let multiple_message = r.read_bool()?;
        let grid_id = r.read_u16(10)?;
        let grid_type = r.read_u8(3)?;
        let kind = match grid_type {
            0 | 1 => {
                let latitude_deg = r.read_scaled(18, ANGLE_SCALE)?;
                let longitude_deg = r.read_scaled(19, ANGLE_SCALE)?;
                let height_m = if grid_type == 0 {
                    Some(r.read_uscaled(10, HEIGHT_SCALE)? - HEIGHT_OFFSET)
                } else {
                    None
                };
                let offset = r.read_u16(12)?;
                let npnt = r.read_u8(8)?;
                let mut deltas = Vec::with_capacity(npnt as usize);
                for _ in 0..npnt {
                    let dlat = r.read_scaled(13, ANGLE_SCALE)?;
                    let dlon = r.read_scaled(14, ANGLE_SCALE)?;
                    let dh = if grid_type == 0 {
                        Some(r.read_scaled(9, HEIGHT_SCALE)?)
                    } else {
                        None
                    };
                    deltas.push((dlat, dlon, dh));
                }
                GridKind::Relative {
                    latitude_deg,
                    longitude_deg,
                    height_m,
                    offset,
                    deltas,
                }
            },
            2 => {
                let latitude_deg = r.read_scaled(18, ANGLE_SCALE)?;
                let longitude_deg = r.read_scaled(19, ANGLE_SCALE)?;
                let rows = r.read_u8(6)?;
                let cols = r.read_u8(6)?;
                let lat_step_deg = r.read_scaled(9, STEP_SCALE)?;
                let lon_step_deg = r.read_scaled(10, STEP_SCALE)?;
                let mask = if r.read_bool()? {
                    let rows = read_flags(r, rows as usize)?;
                    let cols = read_flags(r, cols as usize)?;
                    let nlat = rows.iter().filter(|f| **f).count();
                    let nlon = cols.iter().filter(|f| **f).count();
                    let points = read_flags(r, nlat * nlon)?;
                    Some(GridMask { rows, cols, points })
                } else {
                    None
                };
                GridKind::Regular {
                    latitude_deg,
                    longitude_deg,
                    rows,
                    cols,
                    lat_step_deg,
                    lon_step_deg,
                    mask,
                }
            },
            t => return Err(Error::InvalidGridType(t)),
        };
        Ok(Self {
            provider_id,
            multiple_message,
            grid_id,
            kind,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(16, self.provider_id as u64)?;
        w.write_bool(self.multiple_message)?;
        w.write_u64(10, self.grid_id as u64)?;
        w.write_u64(3, self.grid_type() as u64)?;
        match &self.kind {
            GridKind::Relative {
                latitude_deg,
                longitude_deg,
                height_m,
                offset,
                deltas,
            } => {
                w.write_scaled(18, *latitude_deg, ANGLE_SCALE)?;
                w.write_scaled(19, *longitude_deg, ANGLE_SCALE)?;
                if let Some(h) = height_m {
                    w.write_uscaled(10, h + HEIGHT_OFFSET, HEIGHT_SCALE)?;
                }
                w.write_u64(12, *offset as u64)?;
                w.write_u64(8, deltas.len() as u64)?;
                for (dlat, dlon, dh) in deltas {
                    w.write_scaled(13, *dlat, ANGLE_SCALE)?;
                    w.write_scaled(14, *dlon, ANGLE_SCALE)?;
                    if height_m.is_some() {
                        w.write_scaled(9, dh.unwrap_or(0.0), HEIGHT_SCALE)?;
                    }
                }
            },
            GridKind::Regular {
                latitude_deg,
                longitude_deg,
                rows,
                cols,
                lat_step_deg,
                lon_step_deg,
                mask,
            } => {
                w.write_scaled(18, *latitude_deg, ANGLE_SCALE)?;
                w.write_scaled(19, *longitude_deg, ANGLE_SCALE)?;
                w.write_u64(6, *rows as u64)?;
                w.write_u64(6, *cols as u64)?;
                w.write_scaled(9, *lat_step_deg, STEP_SCALE)?;
                w.write_scaled(10, *lon_step_deg, STEP_SCALE)?;
                w.write_bool(mask.is_some())?;
                if let Some(mask) = mask {
                    if mask.rows.len() != *rows as usize || mask.cols.len() != *cols as usize {
                        return Err(Error::FieldOverflow(6));
                    }
                    write_flags(w, &mask.rows)?;
                    write_flags(w, &mask.cols)?;
                    let nlat = mask.rows.iter().filter(|f| **f).count();
                    let nlon = mask.cols.iter().filter(|f| **f).count();
                    for k in 0..nlat * nlon {
                        w.write_bool(mask.points.get(k).copied().unwrap_or(false))?;
                    }
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relative_grid() {
        let grid = GridDefinition {
            provider_id: 0x1234,
            multiple_message: false,
            grid_id: 3,
            kind: GridKind::Relative {
                latitude_deg: 35.0,
                longitude_deg: 139.5,
                height_m: Some(50.0),
                offset: 10,
                deltas: vec![(0.5, 0.0, Some(12.5)), (0.0, -0.25, Some(-25.0))],
            },
        };
        let mut w = BitWriter::new();
        grid.encode(&mut w).unwrap();
        assert_eq!(w.position(), 30 + 67 + 2 * 36);

        let buf = w.into_bytes();
        let decoded = GridDefinition::decode(&mut BitReader::new(&buf)).unwrap();
        assert_eq!(decoded.grid_type(), 0);
        let points = decoded.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].index, 12);
        assert!((points[2].latitude_deg - 35.5).abs() < 1e-9);
        assert!((points[2].longitude_deg - 139.25).abs() < 1e-9);
        assert!((points[2].height_m.unwrap() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn regular_grid_mask() {
        let grid = GridDefinition {
            provider_id: 1,
            multiple_message: true,
            grid_id: 700,
            kind: GridKind::Regular {
                latitude_deg: 30.0,
                longitude_deg: 130.0,
                rows: 3,
                cols: 4,
                lat_step_deg: 0.5,
                lon_step_deg: 0.25,
                mask: Some(GridMask {
                    rows: vec![true, false, true],
                    cols: vec![true, true, false, true],
                    points: vec![true, false, true, true, true, false],
                }),
            },
        };
        let mut w = BitWriter::new();
        grid.encode(&mut w).unwrap();
        assert_eq!(w.position(), 30 + 69 + 3 + 4 + 6);

        let buf = w.into_bytes();
        let decoded = GridDefinition::decode(&mut BitReader::new(&buf)).unwrap();
        assert_eq!(decoded.grid_type(), 2);
        assert!(decoded.multiple_message);
        match (&decoded.kind, &grid.kind) {
            (GridKind::Regular { mask: a, .. }, GridKind::Regular { mask: b, .. }) => {
                assert_eq!(a, b)
            },
            _ => panic!("not a regular grid"),
        }
        let points = decoded.points();
        assert_eq!(points.len(), 4);
        // row 0: columns 0 and 3, row 2: columns 0 and 1
        assert!((points[1].longitude_deg - 130.75).abs() < 1e-9);
        assert!((points[2].latitude_deg - 31.0).abs() < 1e-9);
        assert!((points[3].longitude_deg - 130.25).abs() < 1e-9);
    }

    #[test]
    fn invalid_grid_type() {
        let mut w = BitWriter::new();
        w.write_u64(16, 1).unwrap();
        w.write_bool(false).unwrap();
        w.write_u64(10, 1).unwrap();
        w.write_u64(3, 5).unwrap();
        w.skip(64);
        let buf = w.into_bytes();
        assert!(matches!(
            GridDefinition::decode(&mut BitReader::new(&buf)),
            Err(Error::InvalidGridType(5))
        ));
    }
}
