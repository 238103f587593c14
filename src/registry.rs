//! Keeps one lazily-opened output port per known device name.
//!
//! The set of names is captured once when the registry is built and never
//! changes; each name maps to either nothing yet or a [`PortHandle`]. A handle
//! whose open failed is kept as a closed handle, so that name stays unusable
//! for the rest of the process.

use crate::midi::{MidiError, MidiOutputBackend, OutputPort};
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc};

/// Shared reference to one open (or failed) output port.
#[derive(Clone)]
pub struct PortHandle {
    name: Arc<str>,
    port: Arc<Mutex<Option<Box<dyn OutputPort>>>>,
}

impl PortHandle {
    fn open(name: &str, port: Box<dyn OutputPort>) -> Self {
        Self {
            name: name.into(),
            port: Arc::new(Mutex::new(Some(port))),
        }
    }

    fn failed(name: &str) -> Self {
        Self {
            name: name.into(),
            port: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False once the port failed to open, reported itself closed, or was
    /// closed by [`PortRegistry::close_all`].
    pub fn is_usable(&self) -> bool {
        self.port.lock().as_ref().is_some_and(|p| !p.is_closed())
    }

    /// Sends each message in order while holding the port, so nothing from
    /// another request lands in between.
    pub fn send_all(&self, messages: &[&[u8]]) -> Result<(), MidiError> {
        let mut guard = self.port.lock();
        let port = guard
            .as_mut()
            .ok_or_else(|| MidiError::Send(format!("port {} is closed", self.name)))?;
        for message in messages {
            port.send(message)?;
        }
        Ok(())
    }

    /// Returns true if this call did the closing.
    fn close(&self) -> bool {
        match self.port.lock().take() {
            Some(port) => {
                port.close();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortHandle")
            .field("name", &self.name)
            .field("usable", &self.is_usable())
            .finish()
    }
}

pub struct PortRegistry {
    backend: Arc<dyn MidiOutputBackend>,
    known: Vec<String>,
    ports: Mutex<HashMap<String, Option<PortHandle>>>,
}

impl PortRegistry {
    /// Snapshots the backend's current output ports as the known device set.
    pub fn new(backend: Arc<dyn MidiOutputBackend>) -> Result<Self, MidiError> {
        let known = backend.port_names()?;
        let ports = known.iter().map(|name| (name.clone(), None)).collect();
        Ok(Self {
            backend,
            known,
            ports: Mutex::new(ports),
        })
    }

    /// Device names captured at startup, in enumeration order.
    pub fn known_devices(&self) -> &[String] {
        &self.known
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.iter().any(|known| known == name)
    }

    /// Asks the backend again; may differ from [`Self::known_devices`].
    pub fn current_devices(&self) -> Result<Vec<String>, MidiError> {
        self.backend.port_names()
    }

    /// Returns the handle for `name`, opening the port on first use.
    ///
    /// Callers check [`Self::is_known`] first; an unknown name gets a handle
    /// that is not usable and is not remembered.
    pub fn get_or_open(&self, name: &str) -> PortHandle {
        // Held across the open so concurrent first requests open once.
        let mut ports = self.ports.lock();
        let Some(slot) = ports.get_mut(name) else {
            log::warn!("get_or_open called for unknown device {name}");
            return PortHandle::failed(name);
        };

        slot.get_or_insert_with(|| match self.backend.open(name) {
            Ok(port) => {
                log::info!("🎹 Opened MIDI port [{name}]");
                PortHandle::open(name, port)
            }
            Err(e) => {
                log::error!("Open MIDI port {name} failed: {e}");
                PortHandle::failed(name)
            }
        })
        .clone()
    }

    /// Closes every opened port. Each port is closed at most once no matter
    /// how many times this runs.
    pub fn close_all(&self) {
        let ports = self.ports.lock();
        for handle in ports.values().flatten() {
            if handle.close() {
                log::info!("\tClosed MIDI port [{}]", handle.name());
            }
        }
    }
}

impl Drop for PortRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortRegistry")
            .field("known", &self.known)
            .finish_non_exhaustive()
    }
}
