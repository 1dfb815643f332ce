//! Code and phase biases
use super::{read_count, read_sv, write_count, write_sv, SsrFlavor, SsrMessage};
use crate::{
    bits::{BitReader, BitWriter},
    constants::SC2RAD,
    signal::{ssr_signal, ssr_slot, SignalCode},
    Error,
};
use gnss_rs::prelude::SV;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CodeBias {
    pub signal: SignalCode,
    /// Code bias [m]
    pub bias_m: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseBias {
    pub signal: SignalCode,
    /// Signal integer property
    pub integer: bool,
    /// Widelane integer indicator. Compact SSR transmits it
    /// in the phase bias extension instead.
    pub widelane: Option<u8>,
    /// Discontinuity counter
    pub discontinuity: u8,
    /// Phase bias [m]
    pub bias_m: f64,
}

/// Phase biases of one satellite
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatPhaseBias {
    /// Yaw angle [rad] and yaw rate [rad/s]
    pub yaw: Option<(f64, f64)>,
    pub signals: Vec<PhaseBias>,
}

/// Flags transmitted ahead of the phase bias satellite list
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PhaseBiasFlags {
    /// RTCM and IGS SSR
    Consistency { dispersive: bool, melbourne_wubbena: bool },
    /// Compact SSR: yaw presence and property id of the extension
    Extended { yaw: bool, property_id: u8 },
}

const YAW_SCALE: f64 = SC2RAD / 256.0;
const YAW_RATE_SCALE: f64 = SC2RAD / 8192.0;

pub(crate) fn decode_code_biases(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<Vec<(SV, Vec<CodeBias>)>, Error> {
    let constellation = message.system();
    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        let nsig = r.read_u8(5)?;
        let mut biases = Vec::with_capacity(nsig as usize);
        for _ in 0..nsig {
            let signal = ssr_signal(constellation, r.read_u8(5)?)?;
            let bias_m = r.read_scaled(14, 0.01)?;
            biases.push(CodeBias { signal, bias_m });
        }
        satellites.push((sv, biases));
    }
    Ok(satellites)
}

pub(crate) fn encode_code_biases(
    w: &mut BitWriter,
    message: &SsrMessage,
    satellites: &[(SV, Vec<CodeBias>)],
) -> Result<(), Error> {
    let constellation = message.system();
    write_count(w, satellites.len())?;
    for (sv, biases) in satellites {
        write_sv(w, message, *sv)?;
        w.write_u64(5, biases.len() as u64)?;
        for bias in biases {
            w.write_u64(5, ssr_slot(constellation, bias.signal)? as u64)?;
            w.write_scaled(14, bias.bias_m, 0.01)?;
        }
    }
    Ok(())
}

pub(crate) fn decode_phase_biases(
    r: &mut BitReader,
    message: &SsrMessage,
) -> Result<(PhaseBiasFlags, Vec<(SV, SatPhaseBias)>), Error> {
    let constellation = message.system();
    let flags = if message.flavor == SsrFlavor::Test {
        PhaseBiasFlags::Extended {
            yaw: r.read_bool()?,
            property_id: r.read_u8(4)?,
        }
    } else {
        PhaseBiasFlags::Consistency {
            dispersive: r.read_bool()?,
            melbourne_wubbena: r.read_bool()?,
        }
    };
    let (has_yaw, has_widelane) = match flags {
        PhaseBiasFlags::Extended { yaw, .. } => (yaw, false),
        PhaseBiasFlags::Consistency { .. } => (true, true),
    };

    let nsat = read_count(r)?;
    let mut satellites = Vec::with_capacity(nsat);
    for _ in 0..nsat {
        let sv = read_sv(r, message)?;
        let nsig = r.read_u8(5)?;
        let yaw = if has_yaw {
            let angle = r.read_uscaled(9, YAW_SCALE)?;
            let rate = r.read_scaled(8, YAW_RATE_SCALE)?;
            Some((angle, rate))
        } else {
            None
        };
        let mut signals = Vec::with_capacity(nsig as usize);
        for _ in 0..nsig {
            let signal = ssr_signal(constellation, r.read_u8(5)?)?;
            let integer = r.read_bool()?;
            let widelane = if has_widelane {
                Some(r.read_u8(2)?)
            } else {
                None
            };
            let discontinuity = r.read_u8(4)?;
            let bias_m = r.read_scaled(20, 1.0E-4)?;
            signals.push(PhaseBias {
                signal,
                integer,
                widelane,
                discontinuity,
                bias_m,
            });
        }
        satellites.push((sv, SatPhaseBias { yaw, signals }));
    }
    Ok((flags, satellites))
}

pub(crate) fn encode_phase_biases(
    w: &mut BitWriter,
    message: &SsrMessage,
    flags: &PhaseBiasFlags,
    satellites: &[(SV, SatPhaseBias)],
) -> Result<(), Error> {
    let constellation = message.system();
    let (has_yaw, has_widelane) = match (message.flavor, flags) {
        (SsrFlavor::Test, PhaseBiasFlags::Extended { yaw, property_id }) => {
            w.write_bool(*yaw)?;
            w.write_u64(4, *property_id as u64)?;
            (*yaw, false)
        },
        (
            SsrFlavor::Rtcm | SsrFlavor::Igs,
            PhaseBiasFlags::Consistency {
                dispersive,
                melbourne_wubbena,
            },
        ) => {
            w.write_bool(*dispersive)?;
            w.write_bool(*melbourne_wubbena)?;
            (true, true)
        },
        _ => return Err(Error::RecordMismatch(message.message_type().unwrap_or(0))),
    };

    write_count(w, satellites.len())?;
    for (sv, sat) in satellites {
        write_sv(w, message, *sv)?;
        w.write_u64(5, sat.signals.len() as u64)?;
        if has_yaw {
            let (angle, rate) = sat.yaw.unwrap_or((0.0, 0.0));
            w.write_uscaled(9, angle, YAW_SCALE)?;
            w.write_scaled(8, rate, YAW_RATE_SCALE)?;
        }
        for bias in &sat.signals {
            w.write_u64(5, ssr_slot(constellation, bias.signal)? as u64)?;
            w.write_bool(bias.integer)?;
            if has_widelane {
                w.write_u64(2, bias.widelane.unwrap_or(0) as u64)?;
            }
            w.write_u64(4, bias.discontinuity as u64)?;
            w.write_scaled(20, bias.bias_m, 1.0E-4)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::Constellation;

    fn biases() -> Vec<(SV, SatPhaseBias)> {
        vec![(
            SV::new(Constellation::GPS, 17),
            SatPhaseBias {
                yaw: Some((SC2RAD / 2.0, -SC2RAD / 8192.0)),
                signals: vec![
                    PhaseBias {
                        signal: SignalCode::new(1, 'C'),
                        integer: true,
                        widelane: Some(2),
                        discontinuity: 5,
                        bias_m: 0.1234,
                    },
                    PhaseBias {
                        signal: SignalCode::new(2, 'W'),
                        integer: true,
                        widelane: Some(1),
                        discontinuity: 5,
                        bias_m: -0.5,
                    },
                ],
            },
        )]
    }

    #[test]
    fn rtcm_phase_bias() {
        let message = SsrMessage::from_message_type(1265).unwrap();
        let flags = PhaseBiasFlags::Consistency {
            dispersive: true,
            melbourne_wubbena: false,
        };
        let mut w = BitWriter::new();
        encode_phase_biases(&mut w, &message, &flags, &biases()).unwrap();
        assert_eq!(w.position(), 2 + 6 + 6 + 5 + 17 + 2 * 32);

        let buf = w.into_bytes();
        let (decoded_flags, decoded) =
            decode_phase_biases(&mut BitReader::new(&buf), &message).unwrap();
        assert_eq!(decoded_flags, flags);
        let (sv, sat) = &decoded[0];
        assert_eq!(sv.prn, 17);
        let (angle, rate) = sat.yaw.unwrap();
        assert!((angle - SC2RAD / 2.0).abs() < 1e-9);
        assert!((rate + SC2RAD / 8192.0).abs() < 1e-9);
        assert_eq!(sat.signals[1].signal, SignalCode::new(2, 'W'));
        assert_eq!(sat.signals[1].widelane, Some(1));
        assert!((sat.signals[0].bias_m - 0.1234).abs() < 1e-9);
    }

    #[test]
    fn compact_phase_bias_without_yaw() {
        let message = SsrMessage::from_message_type(85).unwrap();
        let flags = PhaseBiasFlags::Extended {
            yaw: false,
            property_id: 9,
        };
        let mut w = BitWriter::new();
        encode_phase_biases(&mut w, &message, &flags, &biases()).unwrap();
        assert_eq!(w.position(), 5 + 6 + 6 + 5 + 2 * 30);

        let buf = w.into_bytes();
        let (decoded_flags, decoded) =
            decode_phase_biases(&mut BitReader::new(&buf), &message).unwrap();
        assert_eq!(decoded_flags, flags);
        assert!(decoded[0].1.yaw.is_none());
        assert!(decoded[0].1.signals.iter().all(|s| s.widelane.is_none()));
    }

    #[test]
    fn mismatching_flags() {
        let message = SsrMessage::from_message_type(85).unwrap();
        let flags = PhaseBiasFlags::Consistency {
            dispersive: false,
            melbourne_wubbena: false,
        };
        let mut w = BitWriter::new();
        assert!(encode_phase_biases(&mut w, &message, &flags, &[]).is_err());
    }

    #[test]
    fn code_biases() {
        let message = SsrMessage::from_message_type(1242).unwrap();
        let satellites = vec![(
            SV::new(Constellation::Galileo, 11),
            vec![
                CodeBias {
                    signal: SignalCode::new(1, 'C'),
                    bias_m: 1.5,
                },
                CodeBias {
                    signal: SignalCode::new(5, 'Q'),
                    bias_m: -0.37,
                },
            ],
        )];
        let mut w = BitWriter::new();
        encode_code_biases(&mut w, &message, &satellites).unwrap();
        assert_eq!(w.position(), 6 + 6 + 5 + 2 * 19);
        let buf = w.into_bytes();
        let decoded = decode_code_biases(&mut BitReader::new(&buf), &message).unwrap();
        assert_eq!(decoded[0].1[1].signal, SignalCode::new(5, 'Q'));
        assert!((decoded[0].1[1].bias_m + 0.37).abs() < 1e-9);
    }
}
