// crates/translatable-core/src/core/paths.rs
// ============================================================================
// Module: Dotted Path Utilities
// Description: Recursive get/set by dotted path over structured JSON values.
// Purpose: Splice translated leaves into and out of structured attributes.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Translatable keys may address paths inside structured (object or array
//! valued) attributes, for example `address.city`. This module walks such
//! paths over [`serde_json::Value`] trees: objects are indexed by key and
//! arrays by numeric segment. Writes create missing intermediate objects;
//! out-of-range array writes are dropped rather than growing the array.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Read
// ============================================================================

/// Returns the value at a dotted `path` below `root`, if present.
#[must_use]
pub fn value_at<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

// ============================================================================
// SECTION: Write
// ============================================================================

/// Sets `value` at a dotted `path` below `root`.
///
/// Missing intermediate segments are created as objects. Scalar values in the
/// way of a deeper path are replaced by objects. Array segments descend only
/// into existing indexes; writes past the end of an array are dropped.
pub fn set_value_at(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_at_segments(root, &segments, value);
}

/// Recursive worker for [`set_value_at`].
fn set_at_segments(target: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    if let Value::Array(items) = target {
        if let Ok(index) = head.parse::<usize>()
            && let Some(slot) = items.get_mut(index)
        {
            set_at_segments(slot, rest, value);
        }
        return;
    }
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(map) = target {
        let slot = map.entry((*head).to_string()).or_insert(Value::Null);
        set_at_segments(slot, rest, value);
    }
}
