//! Global ionosphere (VTEC), spherical harmonics expansion
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const COEFFICIENT_SCALE: f64 = 5.0E-3;

/// One ionospheric layer. Coefficients are indexed `[degree][order]`,
/// the sine terms of order 0 are not transmitted and remain null.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VtecLayer {
    /// Layer height [km]
    pub height_km: f64,
    pub degree: u8,
    pub order: u8,
    /// Cosine coefficients [TECU]
    pub cosine: Vec<Vec<f64>>,
    /// Sine coefficients [TECU]
    pub sine: Vec<Vec<f64>>,
}

impl VtecLayer {
    /// Builds a layer with null coefficients.
    pub fn new(height_km: f64, degree: u8, order: u8) -> Self {
        let shape = vec![vec![0.0; order as usize + 1]; degree as usize + 1];
        Self {
            height_km,
            degree,
            order,
            cosine: shape.clone(),
            sine: shape,
        }
    }

    /// (degree, order) of the cosine coefficients, in wire order.
    fn cosine_terms(&self) -> impl Iterator<Item = (usize, usize)> {
        let (n, m) = (self.degree as usize, self.order as usize);
        (0..=m).flat_map(move |j| (j..=n).map(move |l| (l, j)))
    }

    /// (degree, order) of the sine coefficients, in wire order.
    fn sine_terms(&self) -> impl Iterator<Item = (usize, usize)> {
        let (n, m) = (self.degree as usize, self.order as usize);
        (1..=m).flat_map(move |j| (j..=n).map(move |l| (l, j)))
    }

    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let height_km = r.read_uscaled(8, 10.0)?;
        let degree = r.read_u8(4)?;
        let order = r.read_u8(4)?;
        let mut layer = Self::new(height_km, degree, order);
        for (l, j) in layer.cosine_terms().collect::<Vec<_>>() {
            layer.cosine[l][j] = r.read_scaled(16, COEFFICIENT_SCALE)?;
        }
        for (l, j) in layer.sine_terms().collect::<Vec<_>>() {
            layer.sine[l][j] = r.read_scaled(16, COEFFICIENT_SCALE)?;
        }
        Ok(layer)
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_uscaled(8, self.height_km, 10.0)?;
        w.write_u64(4, self.degree as u64)?;
        w.write_u64(4, self.order as u64)?;
        for (l, j) in self.cosine_terms() {
            let c = self.cosine.get(l).and_then(|row| row.get(j)).copied();
            w.write_scaled(16, c.unwrap_or(0.0), COEFFICIENT_SCALE)?;
        }
        for (l, j) in self.sine_terms() {
            let s = self.sine.get(l).and_then(|row| row.get(j)).copied();
            w.write_scaled(16, s.unwrap_or(0.0), COEFFICIENT_SCALE)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vtec {
    /// Quality indicator [TECU]
    pub quality_tecu: f64,
    /// 1 to 4 layers
    pub layers: Vec<VtecLayer>,
}

impl Vtec {
    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let quality_tecu = r.read_uscaled(9, 0.05)?;
        let nlayer = r.read_u8(2)? + 1;
        let mut layers = Vec::with_capacity(nlayer as usize);
        for _ in 0..nlayer {
            layers.push(VtecLayer::decode(r)?);
        }
        Ok(Self {
            quality_tecu,
            layers,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        if self.layers.is_empty() {
            return Err(Error::FieldOverflow(2));
        }
        w.write_uscaled(9, self.quality_tecu, 0.05)?;
        w.write_u64(2, self.layers.len() as u64 - 1)?;
        for layer in &self.layers {
            layer.encode(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn coefficient_count() {
        let mut layer = VtecLayer::new(450.0, 3, 2);
        // (3+1) + 3 + 2 cosine terms, 3 + 2 sine terms
        assert_eq!(layer.cosine_terms().count(), 9);
        assert_eq!(layer.sine_terms().count(), 5);
        layer.cosine[0][0] = 12.5;
        layer.cosine[3][2] = -0.005;
        layer.sine[2][1] = 1.0;

        let vtec = Vtec {
            quality_tecu: 1.5,
            layers: vec![layer],
        };
        let mut w = BitWriter::new();
        vtec.encode(&mut w).unwrap();
        assert_eq!(w.position(), 11 + 16 + 14 * 16);

        let buf = w.into_bytes();
        let decoded = Vtec::decode(&mut BitReader::new(&buf)).unwrap();
        assert_eq!(decoded.layers.len(), 1);
        let layer = &decoded.layers[0];
        assert_eq!(layer.height_km, 450.0);
        assert!((layer.cosine[0][0] - 12.5).abs() < 1e-9);
        assert!((layer.cosine[3][2] + 0.005).abs() < 1e-9);
        assert!((layer.sine[2][1] - 1.0).abs() < 1e-9);
        assert_eq!(layer.sine[0][0], 0.0);
        assert!((decoded.quality_tecu - 1.5).abs() < 1e-9);
    }

    #[test]
    fn layers_required() {
        let vtec = Vtec {
            quality_tecu: 0.0,
            layers: vec![],
        };
        assert!(vtec.encode(&mut BitWriter::new()).is_err());
    }
}
