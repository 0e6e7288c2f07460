//! Pipeline stage models.
//!
//! This module defines the fixed stage order of a storyboard run and the
//! per-stage status records the orchestrator maintains.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use ts_rs::TS;

/// One of the six fixed pipeline phases.
///
/// The declaration order is the execution order and is never changed:
/// `Concept -> Outline -> Script -> Breakdown -> Prompts -> Complete`.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS,
)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    /// Validate the creative brief.
    Concept,
    /// Generate the act outline.
    Outline,
    /// Generate the screenplay text.
    Script,
    /// Parse the script and break every scene down into shots.
    Breakdown,
    /// Turn every shot into a generation prompt.
    Prompts,
    /// Terminal marker stage.
    Complete,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Concept,
        PipelineStage::Outline,
        PipelineStage::Script,
        PipelineStage::Breakdown,
        PipelineStage::Prompts,
        PipelineStage::Complete,
    ];

    /// The stage that follows this one, or `None` for `Complete`.
    pub fn next(self) -> Option<PipelineStage> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// All stages strictly before this one.
    pub fn predecessors(self) -> impl Iterator<Item = PipelineStage> {
        Self::ALL.into_iter().take_while(move |s| *s < self)
    }

    /// Whether this stage iterates over sub-items.
    pub fn is_fan_out(self) -> bool {
        matches!(self, PipelineStage::Breakdown | PipelineStage::Prompts)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Concept => "concept",
            PipelineStage::Outline => "outline",
            PipelineStage::Script => "script",
            PipelineStage::Breakdown => "breakdown",
            PipelineStage::Prompts => "prompts",
            PipelineStage::Complete => "complete",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single stage: `Pending -> InProgress -> {Complete | Error}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    #[default]
    Pending,
    InProgress,
    Complete,
    Error,
}

impl StageState {
    /// `Complete` and `Error` are terminal until the next run resets them.
    pub fn is_terminal(self) -> bool {
        matches!(self, StageState::Complete | StageState::Error)
    }
}

/// Status record for one stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct StageStatus {
    pub status: StageState,

    /// Artifact produced by the stage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure message when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageStatus {
    /// A fresh `Pending` status with no data.
    pub fn pending() -> Self {
        Self::default()
    }

    /// A `Complete` status carrying `data`.
    pub fn complete(data: Value) -> Self {
        Self {
            status: StageState::Complete,
            data: Some(data),
            error: None,
        }
    }

    /// The bypass sentinel: complete, with `{"skipped": true}` as payload.
    pub fn skipped() -> Self {
        Self::complete(serde_json::json!({ "skipped": true }))
    }

    /// Whether this status carries the bypass sentinel.
    pub fn is_skipped(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("skipped"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Partial update merged into an existing [`StageStatus`].
///
/// Fields left as `None` keep whatever the existing status holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageStatusUpdate {
    pub status: Option<StageState>,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl StageStatusUpdate {
    pub fn status(status: StageState) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Sub-item progress, present only while a fan-out stage runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProgressInfo {
    /// `Breakdown` or `Prompts`.
    pub stage: PipelineStage,
    /// One-based index of the item being processed.
    pub current: usize,
    pub total: usize,
    pub label: String,
}
