#![no_main]

use libfuzzer_sys::fuzz_target;
use scenebridge_runtime::host::InMemoryHost;
use scenebridge_runtime::persist::PersistStore;
use scenebridge_runtime::router::{self, parse_request};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // A well-formed request (any shape this interface accepts) must never
    // panic the router or the in-memory host it dispatches against.
    if let Ok(request) = parse_request(&value) {
        let mut host = InMemoryHost::new();
        let persist = PersistStore::new();
        let _ = router::dispatch(request, &mut host, &persist, "fuzz");
    }
});
