#![no_main]

use automation_core::parse_manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        match parse_manifest(s) {
            Ok(manifest) => assert!(!manifest.main_class.contains('\n')),
            Err(err) => {
                let _ = err.to_string();
            }
        }
    }
});
