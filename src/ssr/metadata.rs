//! SSR metadata: models and corrections applied by the provider
use crate::{
    bits::{BitReader, BitWriter},
    Error,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Model type of the GNSS broadcast ephemeris reference entry
const BE_REFERENCE: u8 = 7;

/// One model / correction entry
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetadataEntry {
    /// Model type: 1 satellite antenna PCV, 2 satellite antenna GDV,
    /// 3 solid earth tides, 4 ocean loading, 5 pole tides,
    /// 6 relativity, 7 broadcast ephemeris reference.
    pub model_type: u8,
    pub applied: bool,
    /// Non default model id
    pub model_id: Option<u8>,
    /// Issue of data of the model
    pub iod: Option<u8>,
    /// Additional model parameters, only for non default models
    pub parameters: Option<Vec<bool>>,
    /// (constellation, broadcast ephemeris) reference, for model type 7
    pub be_reference: Option<(u8, u8)>,
}

impl MetadataEntry {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let model_type = r.read_u8(5)?;
        let applied = r.read_bool()?;
        let non_default = r.read_bool()?;
        let model_id = if non_default {
            Some(r.read_u8(3)?)
        } else {
            None
        };
        let iod = if r.read_bool()? {
            Some(r.read_u8(6)?)
        } else {
            None
        };
        let parameters = if non_default && r.read_bool()? {
            let nbits = r.read_u8(8)?;
            Some((0..nbits).map(|_| r.read_bool()).collect::<Result<Vec<_>, _>>()?)
        } else {
            None
        };
        let be_reference = if model_type == BE_REFERENCE {
            Some((r.read_u8(4)?, r.read_u8(4)?))
        } else {
            None
        };
        Ok(Self {
            model_type,
            applied,
            model_id,
            iod,
            parameters,
            be_reference,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(5, self.model_type as u64)?;
        w.write_bool(self.applied)?;
        w.write_bool(self.model_id.is_some())?;
        if let Some(id) = self.model_id {
            w.write_u64(3, id as u64)?;
        }
        w.write_bool(self.iod.is_some())?;
        if let Some(iod) = self.iod {
            w.write_u64(6, iod as u64)?;
        }
        if self.model_id.is_some() {
            w.write_bool(self.parameters.is_some())?;
            if let Some(parameters) = &self.parameters {
                w.write_u64(8, parameters.len() as u64)?;
                for bit in parameters {
                    w.write_bool(*bit)?;
                }
            }
        }
        if self.model_type == BE_REFERENCE {
            let (constellation, be) = self.be_reference.unwrap_or((0, 0));
            w.write_u64(4, constellation as u64)?;
            w.write_u64(4, be as u64)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    pub iod_ssr: u8,
    pub provider_id: u16,
    pub solution_id: u8,
    pub entries: Vec<MetadataEntry>,
}

impl Metadata {
    pub(crate) fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let iod_ssr = r.read_u8(4)?;
        let provider_id = r.read_u16(16)?;
        let solution_id = r.read_u8(4)?;
        let nm = r.read_u8(5)?;
        let mut entries = Vec::with_capacity(nm as usize);
        if nm == 0 {
            r.skip(7)?;
        }
        for _ in 0..nm {
            entries.push(MetadataEntry::decode(r)?);
        }
        Ok(Self {
            iod_ssr,
            provider_id,
            solution_id,
            entries,
        })
    }

    pub(crate) fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(4, self.iod_ssr as u64)?;
        w.write_u64(16, self.provider_id as u64)?;
        w.write_u64(4, self.solution_id as u64)?;
        w.write_u64(5, self.entries.len() as u64)?;
        if self.entries.is_empty() {
            w.skip(7);
        }
        for entry in &self.entries {
            entry.encode(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_metadata() {
        let metadata = Metadata {
            iod_ssr: 2,
            provider_id: 3,
            solution_id: 1,
            entries: vec![],
        };
        let mut w = BitWriter::new();
        metadata.encode(&mut w).unwrap();
        assert_eq!(w.position(), 36);
        let buf = w.into_bytes();
        assert_eq!(Metadata::decode(&mut BitReader::new(&buf)).unwrap(), metadata);
    }

    #[test]
    fn metadata_entries() {
        let metadata = Metadata {
            iod_ssr: 15,
            provider_id: 0xabcd,
            solution_id: 0,
            entries: vec![
                MetadataEntry {
                    model_type: 3,
                    applied: true,
                    ..Default::default()
                },
                MetadataEntry {
                    model_type: 1,
                    applied: false,
                    model_id: Some(5),
                    iod: Some(33),
                    parameters: Some(vec![true, false, true]),
                    be_reference: None,
                },
                MetadataEntry {
                    model_type: 7,
                    applied: true,
                    model_id: None,
                    iod: None,
                    parameters: None,
                    be_reference: Some((2, 9)),
                },
            ],
        };
        let mut w = BitWriter::new();
        metadata.encode(&mut w).unwrap();
        assert_eq!(w.position(), 29 + 8 + (7 + 3 + 7 + 1 + 8 + 3) + (8 + 8));
        let buf = w.into_bytes();
        assert_eq!(Metadata::decode(&mut BitReader::new(&buf)).unwrap(), metadata);
    }
}
