//! Reference station descriptors, auxiliary messages and network RTK residuals
use crate::{
    bits::{BitReader, BitWriter},
    sv::{sv_from_svid, svid_from_sv},
    time::{glonass_dow_tod, resolve_glonass_tod, resolve_tow, week_tow},
    Error,
};
use gnss_rs::prelude::{Constellation, SV};
use hifitime::{Duration, Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ECEF coordinates scaling [m]
const ECEF_SCALE: f64 = 1.0E-4;

/// Antenna reference point
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationPosition {
    /// Non physical station id (1032 only)
    pub non_physical_id: Option<u16>,
    pub reference_id: u16,
    pub itrf_year: u8,
    /// GPS, Glonass, Galileo and reference station indicators (1005/1006 only)
    pub indicators: u8,
    /// Single receiver oscillator and reserved bits (1005/1006 only)
    pub oscillator: u8,
    /// Quarter cycle indicator (1005/1006 only)
    pub quarter_cycle: u8,
    /// ECEF coordinates [m]
    pub ecef_m: (f64, f64, f64),
    /// Antenna height [m] (1006 only)
    pub antenna_height_m: Option<f64>,
}

impl StationPosition {
    /// True for a non physical (virtual) reference station
    pub fn is_non_physical(&self) -> bool {
        self.non_physical_id.is_some() || self.indicators & 0x01 == 1
    }

    fn decode(msg_type: u16, r: &mut BitReader) -> Result<Self, Error> {
        let rtcm = msg_type != 1032;
        let non_physical_id = if rtcm { None } else { Some(r.read_u16(12)?) };
        let reference_id = r.read_u16(12)?;
        let itrf_year = r.read_u8(6)?;
        let indicators = if rtcm { r.read_u8(4)? } else { 0 };
        let x = r.read_scaled(38, ECEF_SCALE)?;
        let oscillator = if rtcm { r.read_u8(2)? } else { 0 };
        let y = r.read_scaled(38, ECEF_SCALE)?;
        let quarter_cycle = if rtcm { r.read_u8(2)? } else { 0 };
        let z = r.read_scaled(38, ECEF_SCALE)?;
        let antenna_height_m = if msg_type == 1006 {
            Some(r.read_uscaled(16, ECEF_SCALE)?)
        } else {
            None
        };
        Ok(Self {
            non_physical_id,
            reference_id,
            itrf_year,
            indicators,
            oscillator,
            quarter_cycle,
            ecef_m: (x, y, z),
            antenna_height_m,
        })
    }

    fn encode(&self, msg_type: u16, w: &mut BitWriter) -> Result<(), Error> {
        let rtcm = msg_type != 1032;
        if rtcm == self.non_physical_id.is_some()
            || (msg_type == 1006) != self.antenna_height_m.is_some()
        {
            return Err(Error::RecordMismatch(msg_type));
        }
        if let Some(id) = self.non_physical_id {
            w.write_u64(12, id as u64)?;
        }
        w.write_u64(12, self.reference_id as u64)?;
        w.write_u64(6, self.itrf_year as u64)?;
        if rtcm {
            w.write_u64(4, self.indicators as u64)?;
        }
        w.write_scaled(38, self.ecef_m.0, ECEF_SCALE)?;
        if rtcm {
            w.write_u64(2, self.oscillator as u64)?;
        }
        w.write_scaled(38, self.ecef_m.1, ECEF_SCALE)?;
        if rtcm {
            w.write_u64(2, self.quarter_cycle as u64)?;
        }
        w.write_scaled(38, self.ecef_m.2, ECEF_SCALE)?;
        if let Some(height) = self.antenna_height_m {
            w.write_uscaled(16, height, ECEF_SCALE)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReceiverDescriptor {
    pub model: String,
    pub firmware: String,
    pub serial_number: String,
}

/// Antenna (1007, 1008) and receiver (1033) descriptors
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AntennaDescriptor {
    pub reference_id: u16,
    pub antenna: String,
    pub setup_id: u8,
    /// 1008 and 1033 only
    pub serial_number: Option<String>,
    /// 1033 only
    pub receiver: Option<ReceiverDescriptor>,
}

fn read_string(r: &mut BitReader) -> Result<String, Error> {
    let len = r.read_u8(8)?;
    let bytes = r.read_bytes(len as usize)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_string(w: &mut BitWriter, s: &str) -> Result<(), Error> {
    w.write_u64(8, s.len() as u64)?;
    w.write_bytes(s.as_bytes());
    Ok(())
}

impl AntennaDescriptor {
    fn decode(msg_type: u16, r: &mut BitReader) -> Result<Self, Error> {
        let reference_id = r.read_u16(12)?;
        let antenna = read_string(r)?;
        let setup_id = r.read_u8(8)?;
        let serial_number = if msg_type != 1007 {
            Some(read_string(r)?)
        } else {
            None
        };
        let receiver = if msg_type == 1033 {
            Some(ReceiverDescriptor {
                model: read_string(r)?,
                firmware: read_string(r)?,
                serial_number: read_string(r)?,
            })
        } else {
            None
        };
        Ok(Self {
            reference_id,
            antenna,
            setup_id,
            serial_number,
            receiver,
        })
    }

    fn encode(&self, msg_type: u16, w: &mut BitWriter) -> Result<(), Error> {
        if (msg_type == 1007) == self.serial_number.is_some()
            || (msg_type == 1033) != self.receiver.is_some()
        {
            return Err(Error::RecordMismatch(msg_type));
        }
        w.write_u64(12, self.reference_id as u64)?;
        write_string(w, &self.antenna)?;
        w.write_u64(8, self.setup_id as u64)?;
        if let Some(serial) = &self.serial_number {
            write_string(w, serial)?;
        }
        if let Some(receiver) = &self.receiver {
            write_string(w, &receiver.model)?;
            write_string(w, &receiver.firmware)?;
            write_string(w, &receiver.serial_number)?;
        }
        Ok(())
    }
}

/// Glonass code-phase biases
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassBias {
    pub reference_id: u16,
    /// Code and phase aligned
    pub aligned: bool,
    /// L1 C/A, L1 P, L2 C/A and L2 P biases [m]
    pub biases_m: [Option<f64>; 4],
}

impl GlonassBias {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let reference_id = r.read_u16(12)?;
        let aligned = r.read_bool()?;
        r.skip(3)?;
        let mask = r.read_u8(4)?;
        let mut biases_m = [None; 4];
        for (k, bias) in biases_m.iter_mut().enumerate() {
            if (mask >> (3 - k)) & 0x01 == 1 {
                *bias = Some(r.read_scaled(16, 0.02)?);
            }
        }
        Ok(Self {
            reference_id,
            aligned,
            biases_m,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(12, self.reference_id as u64)?;
        w.write_bool(self.aligned)?;
        w.skip(3);
        let mask = self
            .biases_m
            .iter()
            .enumerate()
            .filter(|(_, bias)| bias.is_some())
            .fold(0u64, |mask, (k, _)| mask | (1 << (3 - k)));
        w.write_u64(4, mask)?;
        for bias in self.biases_m.iter().flatten() {
            w.write_scaled(16, *bias, 0.02)?;
        }
        Ok(())
    }
}

/// Free text message
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnicodeText {
    pub reference_id: u16,
    /// Modified julian day (UTC)
    pub mjd: u16,
    /// Seconds of day (UTC)
    pub seconds_of_day: u32,
    pub text: String,
}

impl UnicodeText {
    /// Epoch of this message
    pub fn epoch(&self) -> Epoch {
        let t = Epoch::from_mjd_utc(self.mjd as f64)
            + Duration::from_seconds(self.seconds_of_day as f64);
        t.to_time_scale(TimeScale::GPST)
    }

    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        let reference_id = r.read_u16(12)?;
        let mjd = r.read_u16(16)?;
        let seconds_of_day = r.read_u32(17)?;
        let _characters = r.read_u8(7)?;
        let units = r.read_u8(8)?;
        let text = String::from_utf8(r.read_bytes(units as usize)?)?;
        Ok(Self {
            reference_id,
            mjd,
            seconds_of_day,
            text,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_u64(12, self.reference_id as u64)?;
        w.write_u64(16, self.mjd as u64)?;
        w.write_u64(17, self.seconds_of_day as u64)?;
        w.write_u64(7, self.text.chars().count() as u64)?;
        w.write_u64(8, self.text.len() as u64)?;
        w.write_bytes(self.text.as_bytes());
        Ok(())
    }
}

/// Interpolation residual statistics of one satellite
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkResidual {
    /// Non dispersive constant term [m]
    pub geometric_constant_m: f64,
    /// Non dispersive distance dependent term
    pub geometric_distance: f64,
    /// Non dispersive height dependent term
    pub geometric_height: f64,
    /// Dispersive constant term [m]
    pub ionospheric_constant_m: f64,
    /// Dispersive distance dependent term
    pub ionospheric_distance: f64,
}

impl NetworkResidual {
    fn decode(r: &mut BitReader) -> Result<Self, Error> {
        Ok(Self {
            geometric_constant_m: r.read_uscaled(8, 5.0E-4)?,
            geometric_distance: r.read_uscaled(9, 1.0E-8)?,
            geometric_height: r.read_uscaled(6, 1.0E-7)?,
            ionospheric_constant_m: r.read_uscaled(10, 5.0E-4)?,
            ionospheric_distance: r.read_uscaled(10, 1.0E-8)?,
        })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<(), Error> {
        w.write_uscaled(8, self.geometric_constant_m, 5.0E-4)?;
        w.write_uscaled(9, self.geometric_distance, 1.0E-8)?;
        w.write_uscaled(6, self.geometric_height, 1.0E-7)?;
        w.write_uscaled(10, self.ionospheric_constant_m, 5.0E-4)?;
        w.write_uscaled(10, self.ionospheric_distance, 1.0E-8)
    }
}

/// Network RTK residuals
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkResiduals {
    pub constellation: Constellation,
    pub epoch: Epoch,
    pub reference_id: u16,
    /// Number of reference stations used
    pub reference_count: u8,
    pub satellites: Vec<(SV, NetworkResidual)>,
}

/// Network RTK residual message types
const NETWORK_RTK: [(u16, Constellation); 5] = [
    (1030, Constellation::GPS),
    (1031, Constellation::Glonass),
    (1303, Constellation::BeiDou),
    (1304, Constellation::Galileo),
    (1305, Constellation::QZSS),
];

fn network_constellation(msg_type: u16) -> Option<Constellation> {
    NETWORK_RTK
        .iter()
        .find(|(mt, _)| *mt == msg_type)
        .map(|(_, c)| *c)
}

fn svid_width(constellation: Constellation) -> u32 {
    if constellation == Constellation::QZSS {
        4
    } else {
        6
    }
}

impl NetworkResiduals {
    fn decode(
        constellation: Constellation,
        r: &mut BitReader,
        reference: Epoch,
    ) -> Result<Self, Error> {
        let epoch = match constellation {
            Constellation::Glonass => resolve_glonass_tod(reference, r.read_u32(17)? as f64),
            Constellation::BeiDou => resolve_tow(reference, r.read_u32(20)? as f64, TimeScale::BDT),
            _ => resolve_tow(reference, r.read_u32(20)? as f64, TimeScale::GPST),
        };
        let reference_id = r.read_u16(12)?;
        let reference_count = r.read_u8(7)?;
        let nsat = r.read_u8(5)?;
        let mut satellites = Vec::with_capacity(nsat as usize);
        for _ in 0..nsat {
            let svid = r.read_u8(svid_width(constellation))?;
            let sv = sv_from_svid(constellation, svid)?;
            satellites.push((sv, NetworkResidual::decode(r)?));
        }
        Ok(Self {
            constellation,
            epoch,
            reference_id,
            reference_count,
            satellites,
        })
    }

    fn encode(&self, msg_type: u16, w: &mut BitWriter) -> Result<(), Error> {
        if network_constellation(msg_type) != Some(self.constellation) {
            return Err(Error::RecordMismatch(msg_type));
        }
        match self.constellation {
            Constellation::Glonass => {
                let (_, tod) = glonass_dow_tod(self.epoch);
                w.write_u64(17, tod.round() as u64)?;
            },
            Constellation::BeiDou => {
                let (_, tow) = week_tow(self.epoch, TimeScale::BDT);
                w.write_u64(20, tow.round() as u64)?;
            },
            _ => {
                let (_, tow) = week_tow(self.epoch, TimeScale::GPST);
                w.write_u64(20, tow.round() as u64)?;
            },
        }
        w.write_u64(12, self.reference_id as u64)?;
        w.write_u64(7, self.reference_count as u64)?;
        w.write_u64(5, self.satellites.len() as u64)?;
        for (sv, residual) in &self.satellites {
            let svid = svid_from_sv(*sv)?;
            w.write_u64(svid_width(self.constellation), svid as u64)?;
            residual.encode(w)?;
        }
        Ok(())
    }
}

/// Station and auxiliary records
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StationRecord {
    /// 1005, 1006, 1032
    Position(StationPosition),
    /// 1007, 1008, 1033
    Antenna(AntennaDescriptor),
    /// 1230
    GlonassBias(GlonassBias),
    /// 1029
    Text(UnicodeText),
    /// 1030, 1031, 1303, 1304, 1305
    NetworkRtk(NetworkResiduals),
}

impl StationRecord {
    /// Epoch carried by this record, if any
    pub fn epoch(&self) -> Option<Epoch> {
        match self {
            Self::Text(text) => Some(text.epoch()),
            Self::NetworkRtk(residuals) => Some(residuals.epoch),
            _ => None,
        }
    }
}

pub(crate) fn decode(
    msg_type: u16,
    r: &mut BitReader,
    reference: Epoch,
) -> Result<StationRecord, Error> {
    match msg_type {
        1005 | 1006 | 1032 => Ok(StationRecord::Position(StationPosition::decode(
            msg_type, r,
        )?)),
        1007 | 1008 | 1033 => Ok(StationRecord::Antenna(AntennaDescriptor::decode(
            msg_type, r,
        )?)),
        1230 => Ok(StationRecord::GlonassBias(GlonassBias::decode(r)?)),
        1029 => Ok(StationRecord::Text(UnicodeText::decode(r)?)),
        _ => match network_constellation(msg_type) {
            Some(constellation) => Ok(StationRecord::NetworkRtk(NetworkResiduals::decode(
                constellation,
                r,
                reference,
            )?)),
            None => Err(Error::UnsupportedMessage(msg_type)),
        },
    }
}

pub(crate) fn encode(msg_type: u16, record: &StationRecord, w: &mut BitWriter) -> Result<(), Error> {
    match (msg_type, record) {
        (1005 | 1006 | 1032, StationRecord::Position(position)) => position.encode(msg_type, w),
        (1007 | 1008 | 1033, StationRecord::Antenna(antenna)) => antenna.encode(msg_type, w),
        (1230, StationRecord::GlonassBias(bias)) => bias.encode(w),
        (1029, StationRecord::Text(text)) => text.encode(w),
        (_, StationRecord::NetworkRtk(residuals)) => residuals.encode(msg_type, w),
        _ => Err(Error::RecordMismatch(msg_type)),
    }
}
