//! In-memory MIDI backend that records everything done to it.

#![allow(dead_code)]

use midi_bridge::{
    bridge::Bridge,
    midi::{MidiError, MidiOutputBackend, OutputPort},
    registry::PortRegistry,
};
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc};

#[derive(Debug, Default)]
pub struct Journal {
    pub opened: Vec<String>,
    pub closed: Vec<String>,
    pub sent: Vec<(String, Vec<u8>)>,
}

#[derive(Clone, Default)]
pub struct RecordingBackend {
    names: Arc<Mutex<Vec<String>>>,
    refuse_open: Arc<Mutex<HashSet<String>>>,
    fail_send: Arc<Mutex<HashSet<String>>>,
    pub journal: Arc<Mutex<Journal>>,
}

impl RecordingBackend {
    pub fn with_ports(names: &[&str]) -> Self {
        let backend = Self::default();
        *backend.names.lock() = names.iter().map(|n| n.to_string()).collect();
        backend
    }

    pub fn set_ports(&self, names: &[&str]) {
        *self.names.lock() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn refuse_open(&self, name: &str) {
        self.refuse_open.lock().insert(name.to_string());
    }

    pub fn fail_send(&self, name: &str) {
        self.fail_send.lock().insert(name.to_string());
    }

    pub fn opened(&self) -> Vec<String> {
        self.journal.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.journal.lock().closed.clone()
    }

    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.journal.lock().sent.clone()
    }
}

impl MidiOutputBackend for RecordingBackend {
    fn port_names(&self) -> Result<Vec<String>, MidiError> {
        Ok(self.names.lock().clone())
    }

    fn open(&self, name: &str) -> Result<Box<dyn OutputPort>, MidiError> {
        self.journal.lock().opened.push(name.to_string());
        if self.refuse_open.lock().contains(name) {
            return Err(MidiError::Connect {
                port: name.to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(Box::new(RecordingPort {
            name: name.to_string(),
            fail_send: self.fail_send.lock().contains(name),
            journal: Arc::clone(&self.journal),
        }))
    }
}

struct RecordingPort {
    name: String,
    fail_send: bool,
    journal: Arc<Mutex<Journal>>,
}

impl OutputPort for RecordingPort {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        if self.fail_send {
            return Err(MidiError::Send("device unplugged".to_string()));
        }
        self.journal
            .lock()
            .sent
            .push((self.name.clone(), message.to_vec()));
        Ok(())
    }

    fn close(self: Box<Self>) {
        self.journal.lock().closed.push(self.name.clone());
    }
}

/// A bridge over `backend` with `default_device` as the fallback device.
pub fn bridge(backend: &RecordingBackend, default_device: &str) -> Bridge {
    let registry = PortRegistry::new(Arc::new(backend.clone())).unwrap();
    Bridge::new(registry, default_device)
}

pub fn note_on(device: &str, channel: u8, note: u8) -> (String, Vec<u8>) {
    (device.to_string(), vec![0x90 | channel, note, 64])
}

pub fn note_off(device: &str, channel: u8, note: u8) -> (String, Vec<u8>) {
    (device.to_string(), vec![0x80 | channel, note, 64])
}
