//! Orchestrator error and outcome types.

use sk_protocol::PipelineStage;
use thiserror::Error;

/// Errors that end a run (or prevent it from starting).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The brief is malformed; no stage was started.
    #[error("Invalid run configuration: {0}")]
    Validation(String),

    /// A collaborator failed during a fatal stage. The stage is marked
    /// `error` in the run state and later stages stay `pending`.
    #[error("Stage {stage} failed: {message}")]
    StageExecution {
        stage: PipelineStage,
        message: String,
    },
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage completed.
    Completed { prompt_count: usize },

    /// A stop request was observed before `stage` could finish.
    Stopped { stage: PipelineStage },

    /// Resume found prompts already present; nothing ran.
    AlreadyComplete,

    /// Another run replaced this one (or the state was reset) while it was
    /// in flight. Its late results were discarded.
    Superseded,
}
