//! Runtime run state models.
//!
//! This module defines the aggregate state of one storyboard run and the
//! artifacts a caller hands back when resuming an interrupted run.

use crate::artifact_models::{BreakdownItem, Outline, SceneHeading, ScenePrompt};
use crate::config_models::RunConfig;
use crate::pipeline_models::{PipelineStage, ProgressInfo, StageState, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

/// Run-level lifecycle.
///
/// `Idle -> Running -> {Completed | Stopped | Errored}`. Stopped and errored
/// runs go back to `Running` only through an explicit resume.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
    Errored,
}

/// A non-fatal failure of one fan-out item, kept for diagnostics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ItemFailure {
    pub stage: PipelineStage,
    pub scene_index: usize,
    pub error: String,
}

/// The aggregate state of a run.
///
/// Owned and mutated exclusively by the orchestrator; everyone else reads
/// cloned snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RunState {
    /// Identifier of the active run, `None` when idle.
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,

    /// The brief the active run was started with.
    pub config: Option<RunConfig>,

    pub is_running: bool,
    pub phase: RunPhase,
    pub current_stage: PipelineStage,

    /// One status per stage, keyed by stage.
    pub stages: BTreeMap<PipelineStage, StageStatus>,

    /// Present only while a fan-out stage is running.
    pub progress: Option<ProgressInfo>,

    pub outline: Option<Outline>,
    pub script: Option<String>,

    /// Breakdown items in parsed-script scene order.
    pub scenes: Vec<BreakdownItem>,

    /// Headings of the parsed scenes, index-aligned with `scenes` when the
    /// breakdown ran in this process. Empty when scenes were resumed.
    #[serde(default)]
    pub scene_headings: Vec<SceneHeading>,

    /// Generated prompts in scene order.
    pub prompts: Vec<ScenePrompt>,

    /// Per-scene prompt failures that did not halt the run.
    #[serde(default)]
    pub item_errors: Vec<ItemFailure>,

    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Bumped whenever a run replaces or clears this state. A run only
    /// writes while the generation it started with is still current.
    #[serde(skip)]
    pub generation: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            run_id: None,
            config: None,
            is_running: false,
            phase: RunPhase::Idle,
            current_stage: PipelineStage::Concept,
            stages: PipelineStage::ALL
                .into_iter()
                .map(|stage| (stage, StageStatus::pending()))
                .collect(),
            progress: None,
            outline: None,
            script: None,
            scenes: Vec::new(),
            scene_headings: Vec::new(),
            prompts: Vec::new(),
            item_errors: Vec::new(),
            started_at: None,
            finished_at: None,
            generation: 0,
        }
    }
}

impl RunState {
    /// Status of `stage`; every stage always has an entry.
    pub fn stage(&self, stage: PipelineStage) -> StageState {
        self.stages
            .get(&stage)
            .map(|s| s.status)
            .unwrap_or_default()
    }

    /// Stages currently marked `Error`.
    pub fn failed_stages(&self) -> Vec<PipelineStage> {
        self.stages
            .iter()
            .filter(|(_, s)| s.status == StageState::Error)
            .map(|(stage, _)| *stage)
            .collect()
    }

    /// Error message of the failed stage, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.stages.values().find_map(|s| s.error.as_deref())
    }
}

/// Artifacts supplied by the caller when resuming a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
#[serde(default)]
pub struct ResumeArtifacts {
    pub outline: Option<Outline>,
    pub script: Option<String>,
    pub scenes: Vec<BreakdownItem>,
    pub prompts: Vec<Value>,
}

/// Which artifacts are present, as seen by the resume planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResumeFlags {
    pub has_outline: bool,
    pub has_script: bool,
    pub has_scenes: bool,
    pub has_prompts: bool,
}

impl ResumeArtifacts {
    /// Derive presence flags. Null outlines, blank scripts and empty lists
    /// count as absent.
    pub fn flags(&self) -> ResumeFlags {
        ResumeFlags {
            has_outline: self.outline.as_ref().is_some_and(|o| !o.is_null()),
            has_script: self.script.as_deref().is_some_and(|s| !s.trim().is_empty()),
            has_scenes: !self.scenes.is_empty(),
            has_prompts: !self.prompts.is_empty(),
        }
    }
}
