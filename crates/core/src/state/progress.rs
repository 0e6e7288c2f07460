//! Sub-item progress for fan-out stages.

use serde_json::Value;
use sk_protocol::{PipelineStage, ProgressInfo, SceneHeading};

/// Maximum length of a progress label, in characters.
pub const SCENE_LABEL_MAX_CHARS: usize = 40;

/// Builds progress for the items of one fan-out stage.
///
/// The reporter only lives for the duration of the fan-out; the orchestrator
/// clears `RunState::progress` when the stage ends.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    stage: PipelineStage,
    total: usize,
    label_max_chars: usize,
}

impl ProgressReporter {
    /// Start reporting for `stage`. Returns `None` for stages that do not
    /// fan out.
    pub fn begin(stage: PipelineStage, total: usize, label_max_chars: usize) -> Option<Self> {
        stage.is_fan_out().then_some(Self {
            stage,
            total,
            label_max_chars,
        })
    }

    /// Move to item `index` (zero-based) and return the new progress.
    pub fn advance(&self, index: usize, label: &str) -> ProgressInfo {
        ProgressInfo {
            stage: self.stage,
            current: index + 1,
            total: self.total,
            label: truncate_label(label, self.label_max_chars),
        }
    }
}

/// Label for the scene at `index`: its location, or `Scene {n}`.
pub fn scene_label(index: usize, heading: Option<&SceneHeading>) -> String {
    heading
        .and_then(|h| h.location.as_deref())
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .map_or_else(|| format!("Scene {}", index + 1), str::to_string)
}

/// Label for a breakdown item whose heading is not known locally.
pub fn breakdown_label(index: usize, item: &Value) -> String {
    let location = ["location", "heading", "sceneHeading"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty());
    location.map_or_else(|| format!("Scene {}", index + 1), str::to_string)
}

/// Truncate to `max_chars` characters, never splitting a character.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    label.chars().take(max_chars).collect()
}
