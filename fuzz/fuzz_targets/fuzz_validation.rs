#![no_main]

use libfuzzer_sys::fuzz_target;
use scenebridge_runtime::framing::{JsonFrameScanner, ScanOutcome};

fuzz_target!(|data: &[u8]| {
    // Feed the whole input through the incremental frame scanner; it must
    // never panic, regardless of how malformed or truncated the input is.
    let mut scanner = JsonFrameScanner::new();
    match scanner.scan(data) {
        ScanOutcome::NeedMore | ScanOutcome::Complete(_) | ScanOutcome::Invalid => {}
    }
});
