#![no_main]

use libfuzzer_sys::fuzz_target;
use keel_core::base58;

fuzz_target!(|data: &[u8]| {
    // Token decoding must never panic, and any token that decodes must
    // re-encode to the same text
    if let Ok(token) = std::str::from_utf8(data) {
        if let Ok(key) = base58::decode_node_public(token) {
            let reencoded = base58::encode_node_public(&key);
            let redecoded = base58::decode_node_public(&reencoded).unwrap();
            assert_eq!(key, redecoded);
        }
    }
});
