//! Events emitted by the orchestrator.
//!
//! Presentation layers (a web front end, the CLI) subscribe to these to
//! follow a run as it progresses. Events mirror state transitions; the
//! authoritative state is always the orchestrator's `RunState` snapshot.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "stageStatusUpdate",
//!   "payload": {
//!     "run_id": "uuid-here",
//!     "stage": "breakdown",
//!     "status": "in_progress"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::pipeline_models::{PipelineStage, ProgressInfo, StageState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A run has started (or resumed) at `start_stage`.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        start_stage: PipelineStage,
        resumed: bool,
    },

    /// A stage changed status.
    StageStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: PipelineStage,
        status: StageState,
    },

    /// A fan-out stage moved on to its next item.
    ProgressUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        progress: ProgressInfo,
    },

    /// One scene failed without halting the run.
    ItemFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: PipelineStage,
        scene_index: usize,
        error: String,
    },

    /// Every stage completed.
    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        prompt_count: usize,
    },

    /// The run observed a stop request and halted.
    RunStopped {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: PipelineStage,
    },

    /// A stage failed and the run halted.
    RunFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: PipelineStage,
        error: String,
    },
}

impl Event {
    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::StageStatusUpdate { run_id, .. }
            | Event::ProgressUpdate { run_id, .. }
            | Event::ItemFailed { run_id, .. }
            | Event::RunCompleted { run_id, .. }
            | Event::RunStopped { run_id, .. }
            | Event::RunFailed { run_id, .. } => *run_id,
        }
    }

    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::RunCompleted { .. } | Event::RunStopped { .. } | Event::RunFailed { .. }
        )
    }
}
