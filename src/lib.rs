//! Forwards note requests arriving over WebSocket or HTTP to a local MIDI
//! output as note-on / note-off pairs.

pub mod bridge;
pub mod config;
pub mod http;
pub mod message;
pub mod midi;
pub mod registry;
pub mod shutdown;
pub mod ws;
