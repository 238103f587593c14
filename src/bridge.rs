//! Turns one inbound JSON payload into one note pulse on a MIDI output.
//!
//! Both front ends call [`Bridge::handle`]; they differ only in how they
//! report the outcome.

use crate::{
    message::NoteMessage,
    registry::{PortHandle, PortRegistry},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{borrow::Cow, fmt};
use thiserror::Error;

pub const DEFAULT_CHANNEL: i64 = 1;
pub const DEFAULT_NOTE: i64 = 127;

const CHANNEL_RANGE: std::ops::RangeInclusive<i128> = 0..=15;
const NOTE_RANGE: std::ops::RangeInclusive<i128> = 0..=127;

/// Why a payload did not produce any MIDI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Could not parse message as JSON: {0}")]
    MalformedPayload(String),

    #[error("Unknown device name {0}")]
    UnknownDevice(String),

    #[error("Open MIDI port {0} failed for an unknown reason")]
    PortOpenFailure(String),

    #[error(
        "Invalid data - Channel and Note should be integers: channel 0-15 and note 0-127"
    )]
    TypeMismatch,

    #[error("Invalid channel: {0} - Channel should be an int 0-15")]
    ChannelOutOfRange(String),

    #[error("Invalid note: {0} - Note should be an int 0-127")]
    NoteOutOfRange(String),

    #[error("Sending to MIDI port {device} failed: {reason}")]
    SendFailure { device: String, reason: String },
}

/// What was sent, for logs and the HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentNote {
    pub channel: u8,
    pub note: u8,
    pub device: String,
}

impl fmt::Display for SentNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device:{} Ch:{} Note:{}",
            self.device, self.channel, self.note
        )
    }
}

/// A request that passed every check, bound to its open port.
#[derive(Debug)]
pub struct ValidatedRequest {
    pub device: String,
    pub channel: u8,
    pub note: u8,
    pub handle: PortHandle,
}

pub struct Bridge {
    registry: PortRegistry,
    default_device: String,
}

impl Bridge {
    pub fn new(registry: PortRegistry, default_device: impl Into<String>) -> Self {
        Self {
            registry,
            default_device: default_device.into(),
        }
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    /// Validates `payload` and sends the note pulse it asks for.
    pub fn handle(&self, payload: &[u8]) -> Result<SentNote, BridgeError> {
        let request = self.validate(payload)?;
        send_note(&request)?;
        Ok(SentNote {
            channel: request.channel,
            note: request.note,
            device: request.device,
        })
    }

    /// Checks run in a fixed order and the first failure wins. The port is
    /// opened before channel and note are looked at.
    pub fn validate(&self, payload: &[u8]) -> Result<ValidatedRequest, BridgeError> {
        let fields = parse_object(payload)?;
        let raw = RawRequest::extract(&fields, &self.default_device);

        let device = match &*raw.device {
            Value::String(name) if self.registry.is_known(name) => name.clone(),
            Value::String(name) => return Err(BridgeError::UnknownDevice(name.clone())),
            other => return Err(BridgeError::UnknownDevice(other.to_string())),
        };

        let handle = self.registry.get_or_open(&device);
        if !handle.is_usable() {
            return Err(BridgeError::PortOpenFailure(device));
        }

        let (Some(channel), Some(note)) = (as_integer(&raw.channel), as_integer(&raw.note))
        else {
            return Err(BridgeError::TypeMismatch);
        };
        let channel = in_range(channel, &CHANNEL_RANGE)
            .ok_or_else(|| BridgeError::ChannelOutOfRange(raw.channel.to_string()))?;
        let note = in_range(note, &NOTE_RANGE)
            .ok_or_else(|| BridgeError::NoteOutOfRange(raw.note.to_string()))?;

        Ok(ValidatedRequest {
            device,
            channel,
            note,
            handle,
        })
    }
}

/// Sends note-on then note-off for the same channel and note, back to back.
pub fn send_note(request: &ValidatedRequest) -> Result<(), BridgeError> {
    let [on, off] = NoteMessage::pulse(request.channel, request.note).map(NoteMessage::to_bytes);
    log::info!(
        "Sending MIDI - Device:{} Ch:{} Note:{}",
        request.device,
        request.channel,
        request.note
    );
    request
        .handle
        .send_all(&[&on[..], &off[..]])
        .map_err(|e| BridgeError::SendFailure {
            device: request.device.clone(),
            reason: e.to_string(),
        })
}

// ─────────────────────────── helpers ─────────────────────────────────────── //

fn parse_object(payload: &[u8]) -> Result<Map<String, Value>, BridgeError> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(BridgeError::MalformedPayload(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(BridgeError::MalformedPayload(e.to_string())),
    }
}

/// The three fields with defaults applied. A key that is present is taken
/// as-is, `null` included.
#[derive(Debug)]
struct RawRequest<'a> {
    device: Cow<'a, Value>,
    channel: Cow<'a, Value>,
    note: Cow<'a, Value>,
}

impl<'a> RawRequest<'a> {
    fn extract(fields: &'a Map<String, Value>, default_device: &str) -> Self {
        let field = |key: &str, default: Value| match fields.get(key) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(default),
        };
        Self {
            device: field("midi_device", Value::from(default_device)),
            channel: field("channel", Value::from(DEFAULT_CHANNEL)),
            note: field("note", Value::from(DEFAULT_NOTE)),
        }
    }
}

/// Integers only: booleans and floats (even `2.0`) are rejected. Numbers
/// keep their literal text, so any integer literal counts, clamped to the
/// `i128` range when it is wider.
fn as_integer(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    let literal = n.to_string();
    if literal.contains(['.', 'e', 'E']) {
        return None;
    }
    match literal.parse::<i128>() {
        Ok(int) => Some(int),
        Err(_) if literal.starts_with('-') => Some(i128::MIN),
        Err(_) => Some(i128::MAX),
    }
}

fn in_range(value: i128, range: &std::ops::RangeInclusive<i128>) -> Option<u8> {
    if range.contains(&value) {
        u8::try_from(value).ok()
    } else {
        None
    }
}
