//! Codec for encoding and decoding frames and the auth handshake.

use crate::frame::{AuthPayload, MessageType, LENGTH_PREFIX_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Largest payload a u16 length prefix can describe.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

/// Error type for codec operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes available than the header or a length field declared
    #[error("Insufficient data: expected {expected} bytes, {available} available")]
    InsufficientData { expected: usize, available: usize },

    /// Declared frame length exceeds the configured ceiling
    #[error("Frame too large: {declared} bytes exceeds limit of {max}")]
    FrameTooLarge { declared: usize, max: usize },

    /// Payload cannot be described by a u16 length field
    #[error("Payload too large to encode: {0} bytes")]
    PayloadTooLarge(usize),

    /// First payload of a connection was not an auth message
    #[error("Unexpected message type: {0}")]
    UnexpectedMessageType(u8),

    /// A name field was not valid UTF-8
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
}

fn ensure_remaining(data: &impl Buf, expected: usize) -> Result<(), CodecError> {
    let available = data.remaining();
    if available < expected {
        return Err(CodecError::InsufficientData {
            expected,
            available,
        });
    }
    Ok(())
}

fn len_to_u16(len: usize) -> Result<u16, CodecError> {
    u16::try_from(len).map_err(|_| CodecError::PayloadTooLarge(len))
}

/// Encode a payload as a length-prefixed frame
///
/// # Errors
///
/// Returns [`CodecError::PayloadTooLarge`] if the payload is longer than
/// [`MAX_FRAME_PAYLOAD`]
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, CodecError> {
    let len = len_to_u16(payload.len())?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u16_le(len);
    buf.extend_from_slice(payload);

    Ok(buf.freeze())
}

/// Decode one frame from the front of `data`
///
/// The declared length is checked against `max_payload` before any payload
/// bytes are consumed, so an oversized announcement never causes an
/// allocation.
///
/// # Errors
///
/// Returns an error if the prefix or payload is truncated, or if the declared
/// length exceeds `max_payload`
pub fn decode_frame(data: &mut impl Buf, max_payload: usize) -> Result<Bytes, CodecError> {
    ensure_remaining(&*data, LENGTH_PREFIX_SIZE)?;
    let declared = usize::from(data.get_u16_le());

    if declared > max_payload {
        return Err(CodecError::FrameTooLarge {
            declared,
            max: max_payload,
        });
    }

    ensure_remaining(&*data, declared)?;
    Ok(data.copy_to_bytes(declared))
}

/// Iterator over the frames packed into one transport message
///
/// Stops after the first error.
#[derive(Debug)]
pub struct FrameIter {
    data: Bytes,
    max_payload: usize,
    failed: bool,
}

impl Iterator for FrameIter {
    type Item = Result<Bytes, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.data.has_remaining() {
            return None;
        }

        let result = decode_frame(&mut self.data, self.max_payload);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Split a transport message into its frames
#[must_use]
pub fn decode_frames(data: Bytes, max_payload: usize) -> FrameIter {
    FrameIter {
        data,
        max_payload,
        failed: false,
    }
}

/// Encode an auth payload (without the frame prefix)
///
/// # Errors
///
/// Returns [`CodecError::PayloadTooLarge`] if a name does not fit a u16 length
pub fn encode_auth(auth: &AuthPayload) -> Result<Bytes, CodecError> {
    let area_len = len_to_u16(auth.area.len())?;
    let user_len = len_to_u16(auth.user.len())?;

    let mut buf = BytesMut::with_capacity(auth.encoded_len());
    buf.put_u8(MessageType::Auth as u8);
    buf.put_u16_le(area_len);
    buf.extend_from_slice(auth.area.as_bytes());
    buf.put_u16_le(user_len);
    buf.extend_from_slice(auth.user.as_bytes());

    Ok(buf.freeze())
}

fn read_name(data: &mut &[u8], field: &'static str) -> Result<String, CodecError> {
    ensure_remaining(&*data, LENGTH_PREFIX_SIZE)?;
    let len = usize::from(data.get_u16_le());

    ensure_remaining(&*data, len)?;
    let remaining: &[u8] = *data;
    let (name, rest) = remaining.split_at(len);
    *data = rest;

    String::from_utf8(name.to_vec()).map_err(|_| CodecError::InvalidUtf8(field))
}

/// Decode an auth payload
///
/// Trailing bytes after the user name are ignored.
///
/// # Errors
///
/// Returns an error if the type tag is not [`MessageType::Auth`], a declared
/// name length exceeds the remaining bytes, or a name is not UTF-8
pub fn decode_auth(payload: &[u8]) -> Result<AuthPayload, CodecError> {
    let mut data = payload;

    ensure_remaining(&data, 1)?;
    let tag = data.get_u8();
    if MessageType::from_u8(tag) != Some(MessageType::Auth) {
        return Err(CodecError::UnexpectedMessageType(tag));
    }

    let area = read_name(&mut data, "area")?;
    let user = read_name(&mut data, "user")?;

    Ok(AuthPayload { area, user })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_prefix_is_little_endian() {
        let frame = encode_frame(&[0xAA; 0x0102]).unwrap();
        assert_eq!(frame[0], 0x02);
        assert_eq!(frame[1], 0x01);
        assert_eq!(frame.len(), 2 + 0x0102);
    }

    #[test]
    fn test_frame_roundtrip() {
        for len in [0usize, 1, 2, 255, 256, 4096, MAX_FRAME_PAYLOAD] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut encoded = encode_frame(&payload).unwrap();
            let decoded = decode_frame(&mut encoded, MAX_FRAME_PAYLOAD).unwrap();
            assert_eq!(&decoded[..], &payload[..], "payload of length {len}");
            assert!(!encoded.has_remaining());
        }
    }

    #[test]
    fn test_encode_frame_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert_eq!(
            encode_frame(&payload),
            Err(CodecError::PayloadTooLarge(MAX_FRAME_PAYLOAD + 1))
        );
    }

    #[test]
    fn test_decode_frame_short_payload() {
        // Declares 5 bytes, carries 3
        let mut data = Bytes::from_static(&[0x05, 0x00, 0x01, 0x02, 0x03]);
        let result = decode_frame(&mut data, MAX_FRAME_PAYLOAD);
        assert_eq!(
            result,
            Err(CodecError::InsufficientData {
                expected: 5,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_frame_short_prefix() {
        let mut data = Bytes::from_static(&[0x05]);
        assert!(matches!(
            decode_frame(&mut data, MAX_FRAME_PAYLOAD),
            Err(CodecError::InsufficientData { expected: 2, .. })
        ));

        let mut empty = Bytes::new();
        assert!(decode_frame(&mut empty, MAX_FRAME_PAYLOAD).is_err());
    }

    #[test]
    fn test_decode_frame_rejects_length_over_ceiling() {
        // Declares 0x1000 bytes but the ceiling is 16; nothing after the prefix
        let mut data = Bytes::from_static(&[0x00, 0x10]);
        let result = decode_frame(&mut data, 16);
        assert_eq!(
            result,
            Err(CodecError::FrameTooLarge {
                declared: 0x1000,
                max: 16
            })
        );
    }

    #[test]
    fn test_decode_frame_leaves_trailing_bytes() {
        let mut data = Bytes::from_static(&[0x01, 0x00, 0xAB, 0xCD]);
        let frame = decode_frame(&mut data, MAX_FRAME_PAYLOAD).unwrap();
        assert_eq!(&frame[..], &[0xAB]);
        assert_eq!(&data[..], &[0xCD]);
    }

    #[test]
    fn test_decode_frames_coalesced() {
        let mut packed = BytesMut::new();
        packed.extend_from_slice(&encode_frame(b"one").unwrap());
        packed.extend_from_slice(&encode_frame(b"").unwrap());
        packed.extend_from_slice(&encode_frame(b"three").unwrap());

        let frames: Vec<Bytes> = decode_frames(packed.freeze(), MAX_FRAME_PAYLOAD)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0][..], b"one");
        assert!(frames[1].is_empty());
        assert_eq!(&frames[2][..], b"three");
    }

    #[test]
    fn test_decode_frames_stops_after_error() {
        let mut packed = BytesMut::new();
        packed.extend_from_slice(&encode_frame(b"ok").unwrap());
        packed.extend_from_slice(&[0x09, 0x00, 0x01]);

        let mut iter = decode_frames(packed.freeze(), MAX_FRAME_PAYLOAD);
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_auth_roundtrip() {
        let cases = [
            AuthPayload::new("room1", "alice"),
            AuthPayload::new("", ""),
            AuthPayload::new("комната", "ユーザー"),
            AuthPayload::new("a".repeat(300), "b"),
        ];

        for auth in cases {
            let encoded = encode_auth(&auth).unwrap();
            assert_eq!(encoded.len(), auth.encoded_len());
            let decoded = decode_auth(&encoded).unwrap();
            assert_eq!(decoded, auth);
        }
    }

    #[test]
    fn test_auth_wire_layout() {
        let encoded = encode_auth(&AuthPayload::new("ab", "c")).unwrap();
        assert_eq!(&encoded[..], &[0x01, 0x02, 0x00, b'a', b'b', 0x01, 0x00, b'c']);
    }

    #[test]
    fn test_decode_auth_wrong_type() {
        let mut encoded = encode_auth(&AuthPayload::new("room1", "alice"))
            .unwrap()
            .to_vec();
        encoded[0] = 2;
        assert_eq!(
            decode_auth(&encoded),
            Err(CodecError::UnexpectedMessageType(2))
        );
    }

    #[test]
    fn test_decode_auth_empty_payload() {
        assert!(matches!(
            decode_auth(&[]),
            Err(CodecError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_decode_auth_area_length_exceeds_payload() {
        // Area claims 10 bytes, 3 present
        let data = [0x01, 0x0A, 0x00, b'a', b'b', b'c'];
        assert_eq!(
            decode_auth(&data),
            Err(CodecError::InsufficientData {
                expected: 10,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_auth_user_length_exceeds_payload() {
        let data = [0x01, 0x01, 0x00, b'a', 0x04, 0x00, b'x'];
        assert!(matches!(
            decode_auth(&data),
            Err(CodecError::InsufficientData { expected: 4, .. })
        ));
    }

    #[test]
    fn test_decode_auth_missing_user_length() {
        let data = [0x01, 0x01, 0x00, b'a'];
        assert!(matches!(
            decode_auth(&data),
            Err(CodecError::InsufficientData { expected: 2, .. })
        ));
    }

    #[test]
    fn test_decode_auth_invalid_utf8() {
        let data = [0x01, 0x01, 0x00, 0xFF, 0x00, 0x00];
        assert_eq!(decode_auth(&data), Err(CodecError::InvalidUtf8("area")));
    }

    #[test]
    fn test_decode_auth_ignores_trailing_bytes() {
        let mut data = encode_auth(&AuthPayload::new("a", "b")).unwrap().to_vec();
        data.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(decode_auth(&data).unwrap(), AuthPayload::new("a", "b"));
    }
}
