//! Layered option merging
//!
//! Generated files are assembled from layers applied left to right: built-in
//! defaults, computed values, caller-supplied overrides, then forced values.
//! Later layers win. Objects merge recursively; every other value replaces
//! what was there. A `null` in a later layer removes the key.

use serde_json::{Map, Value};

/// Merge `overlay` into `base` in place
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => merge_maps(base_map, overlay_map),
        (base, overlay) => *base = overlay.clone(),
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if value.is_null() {
            base.remove(key);
            continue;
        }
        match base.get_mut(key) {
            Some(existing) if existing.is_object() && value.is_object() => deep_merge(existing, value),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge layers in precedence order, lowest first
pub fn merge_layers<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut result = Value::Object(Map::new());
    for layer in layers {
        deep_merge(&mut result, layer);
    }
    result
}
