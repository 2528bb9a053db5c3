//! Frame layout constants and message types.

/// Width of the frame length prefix in bytes (u16, little-endian).
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Width of the message type tag in bytes.
pub const TYPE_SIZE: usize = 1;

/// Type of a tagged payload
///
/// Only the handshake is tagged; post-authentication frames carry no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Authentication handshake
    Auth = 0x01,
}

impl MessageType {
    /// Parse a type tag
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Auth),
            _ => None,
        }
    }
}

/// The handshake payload naming the area and user of a connection
///
/// Payload format:
/// - Type: 1 byte (always [`MessageType::Auth`])
/// - Area length: 2 bytes (u16 LE)
/// - Area: variable (UTF-8)
/// - User length: 2 bytes (u16 LE)
/// - User: variable (UTF-8)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    /// Area the connection joins
    pub area: String,
    /// Self-declared user name
    pub user: String,
}

impl AuthPayload {
    /// Create a new auth payload
    #[must_use]
    pub fn new(area: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            user: user.into(),
        }
    }

    /// Encoded size in bytes, without the frame prefix
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        TYPE_SIZE + LENGTH_PREFIX_SIZE + self.area.len() + LENGTH_PREFIX_SIZE + self.user.len()
    }
}
