#![no_main]

use area_protocol::codec::{decode_auth, decode_frame, MAX_FRAME_PAYLOAD};
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary peer input must only ever produce Err, never a panic
    let mut buf = Bytes::copy_from_slice(data);
    let _ = decode_frame(&mut buf, MAX_FRAME_PAYLOAD);

    // The auth parser sees raw payloads too
    let _ = decode_auth(data);
});
