#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(config) = dynform::parse(&s) {
        let once = dynform::normalize(config);
        let twice = dynform::normalize(once.clone());
        let a = serde_json::to_value(&once).unwrap();
        let b = serde_json::to_value(&twice).unwrap();
        assert_eq!(a, b, "normalize must be idempotent");
    }
});
