#![no_main]

use libfuzzer_sys::fuzz_target;
use scenebridge_config::parse_gateway_config;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, ignore invalid UTF-8.
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        // We don't care whether parsing succeeds, only that malformed YAML
        // never panics the loader.
        let _ = parse_gateway_config(yaml_str);
    }
});
