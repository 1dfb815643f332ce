//! Stateful message decoding and encoding
use std::collections::BTreeMap;

use crate::{
    bits::{BitReader, BitWriter},
    config::Config,
    ephemeris::Ephemeris,
    frame::{encode_frame, find_frame},
    integrity::{self, IntegrityState},
    message::{Message, MessageKind, Record},
    observation::{self, LockTimeCache},
    ssr::{self, CorrectionKind, CorrectionState},
    station, Error,
};

use gnss_rs::prelude::SV;
use hifitime::{Epoch, TimeScale};

/// [Codec] decodes framed messages into [Message]s and encodes them back.
/// It owns every piece of state that spans several messages:
/// SSR corrections, integrity records, MSM lock times,
/// Glonass frequency channels and the reference [Epoch].
#[derive(Debug, Clone)]
pub struct Codec {
    config: Config,
    reference: Epoch,
    corrections: CorrectionState,
    integrity: IntegrityState,
    lock_times: LockTimeCache,
    glonass_channels: BTreeMap<SV, i8>,
}

fn system_time() -> Epoch {
    Epoch::now()
        .unwrap_or_else(|_| Epoch::from_gpst_seconds(0.0))
        .to_time_scale(TimeScale::GPST)
}

impl Codec {
    /// Creates a new [Codec] from [Config]
    pub fn new(config: Config) -> Self {
        let reference = config.reference.unwrap_or_else(system_time);
        Self {
            config,
            reference,
            corrections: CorrectionState::new(),
            integrity: IntegrityState::new(),
            lock_times: LockTimeCache::new(),
            glonass_channels: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current reference [Epoch]
    pub fn reference(&self) -> Epoch {
        self.reference
    }

    /// Accumulated SSR [CorrectionState]
    pub fn corrections(&self) -> &CorrectionState {
        &self.corrections
    }

    /// Latest integrity records
    pub fn integrity(&self) -> &IntegrityState {
        &self.integrity
    }

    pub fn lock_times(&self) -> &LockTimeCache {
        &self.lock_times
    }

    /// Glonass frequency channel learned from ephemerides
    pub fn frequency_channel(&self, sv: SV) -> Option<i8> {
        self.glonass_channels.get(&sv).copied()
    }

    /// Drops all accumulated state. The reference [Epoch] is preserved.
    pub fn reset(&mut self) {
        self.corrections.clear();
        self.integrity.clear();
        self.lock_times.clear();
        self.glonass_channels.clear();
    }

    /// Decodes the first valid frame found in `buf`.
    /// Returns the number of bytes consumed (up to the end of that frame)
    /// and the decoding result, or None when `buf` does not contain
    /// a complete valid frame.
    pub fn decode_one(&mut self, buf: &[u8]) -> Option<(usize, Result<Message, Error>)> {
        let frame = find_frame(buf, 0)?;
        Some((frame.end(), self.decode_payload(frame.payload)))
    }

    /// Decodes one message payload (without framing).
    /// State is only updated once the message is entirely decoded.
    pub fn decode_payload(&mut self, payload: &[u8]) -> Result<Message, Error> {
        let mut r = BitReader::new(payload);
        let msg_type = r.read_u16(12)?;
        let unhandled = || Message::new(msg_type, Record::Unhandled(payload.to_vec()));

        if self.config.skipped(msg_type) {
            return Ok(unhandled());
        }

        let record = match MessageKind::from(msg_type) {
            MessageKind::Msm(constellation, variant) => {
                let mut block = observation::decode(&mut r, constellation, variant, self.reference)?;
                let channels = &self.glonass_channels;
                block.resolve_carriers(|sv| channels.get(&sv).copied());
                block.apply_lock_times(&mut self.lock_times);
                Record::Observation(block)
            },
            MessageKind::Ephemeris(_) => {
                let eph = Ephemeris::decode(msg_type, &mut r, self.reference)?;
                if let Ephemeris::Glonass(glo) = &eph {
                    self.glonass_channels.insert(glo.sv, glo.frequency_channel);
                }
                Record::Ephemeris(eph)
            },
            kind if kind.is_ssr() => {
                let update = ssr::decode(msg_type, &mut r, self.reference, &self.corrections)?;
                let phase_bias = matches!(
                    update.message.kind,
                    CorrectionKind::PhaseBias | CorrectionKind::PhaseBiasExtension
                );
                if phase_bias && self.config.mask_phase_bias {
                    return Ok(unhandled());
                }
                self.corrections.apply(&update, self.config.iod_policy)?;
                Record::Correction(update)
            },
            kind if kind.is_integrity() => {
                let update = integrity::decode(msg_type, &mut r, self.reference)?;
                self.integrity.apply(&update.record);
                Record::Integrity(update)
            },
            kind if kind.is_station() => {
                Record::Station(station::decode(msg_type, &mut r, self.reference)?)
            },
            _ => return Ok(unhandled()),
        };

        if self.config.track_reference && record.as_ephemeris().is_none() {
            if let Some(t) = record.epoch() {
                self.reference = t;
            }
        }

        Ok(Message::new(msg_type, record))
    }

    /// Encodes [Message] into a complete frame.
    pub fn encode_one(&self, msg: &Message) -> Result<Vec<u8>, Error> {
        let msg_type = msg.message_type;
        let mut w = BitWriter::new();
        match &msg.record {
            Record::Unhandled(payload) => return encode_frame(payload),
            Record::Ephemeris(eph) => {
                w.write_u64(12, msg_type as u64)?;
                eph.encode(msg_type, &mut w)?;
            },
            Record::Observation(block) => {
                if block.message_type() != Some(msg_type) {
                    return Err(Error::RecordMismatch(msg_type));
                }
                w.write_u64(12, msg_type as u64)?;
                observation::encode(block, &mut w)?;
            },
            Record::Correction(update) => {
                if update.message_type() != Some(msg_type) {
                    return Err(Error::RecordMismatch(msg_type));
                }
                w.write_u64(12, msg_type as u64)?;
                ssr::encode(update, &mut w)?;
            },
            Record::Integrity(update) => {
                w.write_u64(12, msg_type as u64)?;
                integrity::encode(msg_type, update, &mut w)?;
            },
            Record::Station(record) => {
                w.write_u64(12, msg_type as u64)?;
                station::encode(msg_type, record, &mut w)?;
            },
        }
        encode_frame(&w.into_bytes())
    }
}
