#![no_main]

use libfuzzer_sys::fuzz_target;
use keel_core::Manifest;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, and anything that decodes must verify and
    // round-trip byte-exactly
    if let Ok(manifest) = Manifest::decode(data) {
        assert!(manifest.verify());
        assert_eq!(manifest.serialized(), data);

        let again = Manifest::decode(manifest.serialized()).unwrap();
        assert_eq!(manifest, again);
    }
});
