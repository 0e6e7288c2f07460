//! Shot-list normalization at the breakdown/prompts boundary.

use serde_json::Value;
use sk_protocol::{BreakdownItem, Shot, SHOT_LIST_KEYS};

/// Extract the shot list of a breakdown item.
///
/// Generators expose the list under one of several keys; the first key in
/// [`SHOT_LIST_KEYS`] holding a non-empty array wins. Anything else yields an
/// empty list, which means the scene is skipped.
pub fn normalize_shots(item: &BreakdownItem) -> Vec<Shot> {
    SHOT_LIST_KEYS
        .iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_array))
        .find(|shots| !shots.is_empty())
        .cloned()
        .unwrap_or_default()
}
