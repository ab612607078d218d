#![no_main]

use dynform::resolve::resolve_visible;
use dynform::store::ValueLookup;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

struct JsonValues(Value);

impl ValueLookup for JsonValues {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|o| o.get(key))
    }
}

// Input: a JSON document `{ "config": <page>, "values": <object> }`.
// Resolution must never panic and must be restartable.
fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let Ok(input) = serde_json::from_str::<Value>(&s) else {
        return;
    };
    let Some(config_value) = input.get("config") else {
        return;
    };
    let Ok(config) = dynform::parse(&config_value.to_string()) else {
        return;
    };
    let values = JsonValues(input.get("values").cloned().unwrap_or(Value::Null));

    for section in config.sections() {
        let first = resolve_visible(&section.elements, &values);
        let second = resolve_visible(&section.elements, &values);
        assert_eq!(first.len(), second.len());
    }
});
