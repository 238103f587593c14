//! Encodes the two channel-voice messages the bridge ever sends.

/// Velocity used for both halves of a note pulse.
pub const DEFAULT_VELOCITY: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMessage {
    NoteOn { channel: u8, key: u8, vel: u8 },
    NoteOff { channel: u8, key: u8, vel: u8 },
}

impl NoteMessage {
    /// The note-on / note-off pair for one pulse, in send order.
    pub fn pulse(channel: u8, key: u8) -> [NoteMessage; 2] {
        [
            NoteMessage::NoteOn {
                channel,
                key,
                vel: DEFAULT_VELOCITY,
            },
            NoteMessage::NoteOff {
                channel,
                key,
                vel: DEFAULT_VELOCITY,
            },
        ]
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let (status, channel, key, vel) = match self {
            NoteMessage::NoteOn { channel, key, vel } => (0x90, channel, key, vel),
            NoteMessage::NoteOff { channel, key, vel } => (0x80, channel, key, vel),
        };
        [status | (channel & 0x0F), key & 0x7F, vel & 0x7F]
    }
}
