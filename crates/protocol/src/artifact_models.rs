//! Artifact payloads exchanged with the generation collaborators.
//!
//! Most artifacts are opaque JSON: the orchestrator stores and forwards them
//! without interpreting their content. The exceptions are the parsed script
//! (the orchestrator iterates its scenes) and the shot list inside a
//! breakdown item (the orchestrator decides whether a scene is skipped).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Outline produced by the outline generator.
pub type Outline = Value;

/// Breakdown of a single scene; carries its shot list under an alias key.
pub type BreakdownItem = Value;

/// A single shot inside a scene breakdown.
pub type Shot = Value;

/// Keys under which a breakdown item may expose its shot list, highest
/// priority first.
pub const SHOT_LIST_KEYS: [&str; 4] = ["suggestedShots", "shots", "shot_list", "shotList"];

/// A screenplay slugline such as `INT. LIGHTHOUSE - NIGHT`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct SceneHeading {
    /// The raw slugline text.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

/// Result of parsing a script: headings and texts are index-aligned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct ParsedScript {
    pub scene_headings: Vec<SceneHeading>,
    pub scene_texts: Vec<String>,
}

impl ParsedScript {
    /// Number of scenes that have both a heading and a text.
    pub fn scene_count(&self) -> usize {
        self.scene_headings.len().min(self.scene_texts.len())
    }

    /// Iterate `(index, heading, text)` in script order.
    pub fn scenes(&self) -> impl Iterator<Item = (usize, &SceneHeading, &str)> {
        self.scene_headings
            .iter()
            .zip(self.scene_texts.iter())
            .enumerate()
            .map(|(idx, (heading, text))| (idx, heading, text.as_str()))
    }
}

/// Prompt generator output: either a bare list or a `{prompts: [...]}`
/// wrapper.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(untagged)]
pub enum PromptBatch {
    List(Vec<Value>),
    Wrapped { prompts: Vec<Value> },
}

impl PromptBatch {
    pub fn into_prompts(self) -> Vec<Value> {
        match self {
            PromptBatch::List(prompts) | PromptBatch::Wrapped { prompts } => prompts,
        }
    }
}

/// A generated prompt annotated with where it came from and how long the
/// resulting shot should run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ScenePrompt {
    /// Index of the source scene in the parsed script.
    pub scene_index: usize,
    #[serde(default)]
    pub scene_heading: String,
    /// Opaque prompt payload returned by the generator.
    pub prompt: Value,
    /// Shot duration in seconds.
    pub duration: u32,
}
