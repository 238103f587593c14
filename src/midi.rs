//! The MIDI output subsystem as seen by the bridge: enumerate output ports by
//! name, open one for writing, push raw bytes at it.
//!
//! [`MidirBackend`] is the real thing. Anything else implementing
//! [`MidiOutputBackend`] (tests use an in-memory recorder) can stand in for it.

use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;

const CLIENT_NAME: &str = "midi-bridge";

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("MIDI subsystem unavailable: {0}")]
    Init(String),

    #[error("could not enumerate MIDI output ports: {0}")]
    Enumerate(String),

    #[error("no MIDI output port named {0}")]
    PortNotFound(String),

    #[error("connect {port}: {reason}")]
    Connect { port: String, reason: String },

    #[error("{0}")]
    Send(String),
}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::Init(e.to_string())
    }
}

/// An open, writable output port.
pub trait OutputPort: Send {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError>;

    /// Ports that can fail after opening report it here.
    fn is_closed(&self) -> bool {
        false
    }

    fn close(self: Box<Self>);
}

/// Source of output port names and open ports.
pub trait MidiOutputBackend: Send + Sync {
    /// Names of the output ports currently present, in enumeration order.
    fn port_names(&self) -> Result<Vec<String>, MidiError>;

    fn open(&self, name: &str) -> Result<Box<dyn OutputPort>, MidiError>;
}

// ─────────────────────────────── midir ───────────────────────────────────── //

/// Talks to the platform MIDI stack (ALSA, CoreMIDI, WinMM) through `midir`.
#[derive(Debug, Default)]
pub struct MidirBackend;

impl MidiOutputBackend for MidirBackend {
    fn port_names(&self) -> Result<Vec<String>, MidiError> {
        // New MidiOutput each call so the port list is up-to-date
        let out = MidiOutput::new(CLIENT_NAME)?;
        out.ports()
            .iter()
            .map(|port| {
                out.port_name(port)
                    .map_err(|e| MidiError::Enumerate(e.to_string()))
            })
            .collect()
    }

    fn open(&self, name: &str) -> Result<Box<dyn OutputPort>, MidiError> {
        let out = MidiOutput::new(CLIENT_NAME)?;
        let port = out
            .ports()
            .into_iter()
            .find(|p| out.port_name(p).is_ok_and(|n| n == name))
            .ok_or_else(|| MidiError::PortNotFound(name.to_string()))?;

        let conn = out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| MidiError::Connect {
                port: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(MidirPort { conn }))
    }
}

struct MidirPort {
    conn: MidiOutputConnection, // RAII – the port stays open while this lives
}

impl OutputPort for MidirPort {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        self.conn
            .send(message)
            .map_err(|e| MidiError::Send(e.to_string()))
    }

    fn close(self: Box<Self>) {
        self.conn.close();
    }
}
