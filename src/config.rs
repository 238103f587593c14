//! Command line and environment settings.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Forwards note requests from the network to a MIDI output", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Interface to listen on
    #[arg(long, global = true, env = "MIDI_BRIDGE_HOST", default_value = "localhost")]
    pub host: String,

    /// Port to listen on
    #[arg(long, global = true, env = "MIDI_BRIDGE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Output device used when a request names none (default: first device found)
    #[arg(long, global = true, env = "MIDI_BRIDGE_DEFAULT_DEVICE")]
    pub default_device: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Accept requests as WebSocket text frames
    Ws,
    /// Accept requests as HTTP POSTs to /midi
    Http,
    /// List MIDI output devices and exit
    Devices,
}

/// Which listener a serving subcommand runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    Ws,
    Http,
}

impl Command {
    /// `None` for subcommands that do not serve.
    pub fn front_end(self) -> Option<FrontEnd> {
        match self {
            Command::Ws => Some(FrontEnd::Ws),
            Command::Http => Some(FrontEnd::Http),
            Command::Devices => None,
        }
    }
}

/// Picks the device used when a request omits `midi_device`.
///
/// A configured name wins even if it is not present; requests relying on it
/// are then rejected as unknown.
pub fn resolve_default_device(configured: Option<&str>, known: &[String]) -> Result<String> {
    let Some(first) = known.first() else {
        bail!("no MIDI output devices found");
    };
    match configured {
        Some(name) => {
            if !known.iter().any(|k| k == name) {
                log::warn!("Default device {name:?} is not among the available outputs");
            }
            Ok(name.to_string())
        }
        None => Ok(first.clone()),
    }
}
