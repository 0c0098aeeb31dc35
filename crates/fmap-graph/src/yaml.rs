//! Canonical YAML emission for raw resource documents.
//!
//! Every raw document carried by a node is stripped of volatile server
//! metadata and serialized with a fixed key order (`name` first,
//! `namespace` second, everything else lexicographic) so that rebuilding
//! the same topology yields byte-identical YAML. The per-document line
//! offsets recorded during emission are what lets the editor surface jump
//! from a node to its YAML block.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::warn;

/// Server-managed metadata stripped before serialization, at any depth.
const VOLATILE_KEYS: [&str; 7] = [
    "creationTimestamp",
    "selfLink",
    "status",
    "uid",
    "annotations",
    "livenessProbe",
    "resourceVersion",
];

/// Remove volatile metadata keys recursively through the whole document.
pub fn strip_volatile(doc: &mut Value) {
    match doc {
        Value::Object(map) => {
            map.retain(|key, _| !VOLATILE_KEYS.contains(&key.as_str()));
            for value in map.values_mut() {
                strip_volatile(value);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_volatile(item);
            }
        }
        _ => {}
    }
}

/// Canonical key order: `name`, then `namespace`, then lexicographic.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a, b) {
        ("name", "name") | ("namespace", "namespace") => Ordering::Equal,
        ("name", _) => Ordering::Less,
        (_, "name") => Ordering::Greater,
        ("namespace", _) => Ordering::Less,
        (_, "namespace") => Ordering::Greater,
        _ => a.cmp(b),
    }
}

/// Rebuild a JSON document as a YAML value with canonical key order.
///
/// `serde_yaml`'s mapping preserves insertion order, so inserting keys in
/// sorted order fixes the emitted order.
fn to_sorted_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else {
                serde_yaml::Value::Number(n.as_f64().unwrap_or(0.0).into())
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.iter().map(to_sorted_yaml).collect())
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| compare_keys(a, b));
            let mut mapping = serde_yaml::Mapping::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    mapping.insert(serde_yaml::Value::String(key.clone()), to_sorted_yaml(v));
                }
            }
            serde_yaml::Value::Mapping(mapping)
        }
    }
}

/// Serialize one cleaned document to its canonical YAML block.
///
/// The block always ends with a newline. Serialization failures (which
/// would require a non-finite float smuggled through JSON) degrade to an
/// empty block rather than failing the build.
#[must_use]
pub fn canonical_yaml(doc: &Value) -> String {
    let sorted = to_sorted_yaml(doc);
    match serde_yaml::to_string(&sorted) {
        Ok(yaml) => yaml,
        Err(err) => {
            warn!(%err, "failed to serialize resource document");
            String::new()
        }
    }
}

/// Join per-node YAML blocks with `---` separators.
///
/// Offsets line up with the `row` recorded on each node: each document
/// contributes its line count plus one for the separator line.
#[must_use]
pub fn join_documents(blocks: &[String]) -> String {
    blocks.join("---\n")
}
