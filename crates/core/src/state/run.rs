//! Run state machine transitions.
//!
//! Each function applies one transition to a [`RunState`] and returns the
//! event(s) describing it. The orchestrator applies them under the state
//! lock and publishes the events afterwards.

use crate::state::planner::{seed_statuses, ResumePlan};
use crate::state::tracker::update_stage_status;
use chrono::Utc;
use serde_json::Value;
use sk_protocol::{
    Event, ItemFailure, PipelineStage, ProgressInfo, ResumeArtifacts, RunConfig, RunPhase,
    RunState, StageState, StageStatusUpdate,
};
use uuid::Uuid;

fn run_id(state: &RunState) -> Uuid {
    state.run_id.unwrap_or_else(Uuid::nil)
}

fn stage_event(state: &RunState, stage: PipelineStage) -> Event {
    Event::StageStatusUpdate {
        run_id: run_id(state),
        stage,
        status: state.stage(stage),
    }
}

/// Build the state a run starts from.
///
/// Nothing from a previous run survives: the result is a fresh state seeded
/// only from `plan`, `artifacts` and the brief.
pub fn create_run(
    run_id: Uuid,
    generation: u64,
    config: RunConfig,
    plan: &ResumePlan,
    artifacts: ResumeArtifacts,
) -> RunState {
    let stages = seed_statuses(plan, &artifacts);
    let script = if plan.bypass {
        config.bypass_script().map(str::to_string)
    } else {
        artifacts.script.filter(|s| !s.trim().is_empty())
    };

    RunState {
        run_id: Some(run_id),
        is_running: true,
        phase: RunPhase::Running,
        current_stage: plan.start.unwrap_or(PipelineStage::Complete),
        stages,
        outline: artifacts.outline.filter(|o| !o.is_null()),
        script,
        scenes: artifacts.scenes,
        started_at: Some(Utc::now()),
        generation,
        config: Some(config),
        ..RunState::default()
    }
}

/// Mark `stage` in progress and make it the current stage.
pub fn begin_stage(state: &mut RunState, stage: PipelineStage) -> Event {
    state.current_stage = stage;
    update_stage_status(
        &mut state.stages,
        stage,
        StageStatusUpdate::status(StageState::InProgress),
    );
    stage_event(state, stage)
}

/// Mark `stage` complete with its artifact.
pub fn complete_stage(state: &mut RunState, stage: PipelineStage, data: Value) -> Event {
    update_stage_status(
        &mut state.stages,
        stage,
        StageStatusUpdate::status(StageState::Complete).with_data(data),
    );
    stage_event(state, stage)
}

pub fn set_progress(state: &mut RunState, progress: ProgressInfo) -> Event {
    state.progress = Some(progress.clone());
    Event::ProgressUpdate {
        run_id: run_id(state),
        progress,
    }
}

/// Record a non-fatal failure of one scene.
pub fn record_item_failure(
    state: &mut RunState,
    stage: PipelineStage,
    scene_index: usize,
    error: String,
) -> Event {
    state.item_errors.push(ItemFailure {
        stage,
        scene_index,
        error: error.clone(),
    });
    Event::ItemFailed {
        run_id: run_id(state),
        stage,
        scene_index,
        error,
    }
}

/// Finish a run whose every stage succeeded.
pub fn complete_run(state: &mut RunState) -> Vec<Event> {
    state.progress = None;
    state.current_stage = PipelineStage::Complete;
    let prompt_count = state.prompts.len();
    let status_event = complete_stage(
        state,
        PipelineStage::Complete,
        serde_json::json!({ "prompt_count": prompt_count }),
    );
    finish(state, RunPhase::Completed);

    vec![
        status_event,
        Event::RunCompleted {
            run_id: run_id(state),
            prompt_count,
        },
    ]
}

/// Halt after an observed stop request.
///
/// Stage statuses are left as they are: the interrupted stage stays
/// `InProgress` and no stage is marked `Error`.
pub fn stop_run(state: &mut RunState, stage: PipelineStage) -> Vec<Event> {
    state.progress = None;
    finish(state, RunPhase::Stopped);

    vec![Event::RunStopped {
        run_id: run_id(state),
        stage,
    }]
}

/// Halt after a fatal stage failure. Later stages stay `Pending`.
pub fn fail_run(state: &mut RunState, stage: PipelineStage, error: String) -> Vec<Event> {
    update_stage_status(
        &mut state.stages,
        stage,
        StageStatusUpdate::status(StageState::Error).with_error(error.clone()),
    );
    state.progress = None;
    finish(state, RunPhase::Errored);

    vec![
        stage_event(state, stage),
        Event::RunFailed {
            run_id: run_id(state),
            stage,
            error,
        },
    ]
}

fn finish(state: &mut RunState, phase: RunPhase) {
    state.is_running = false;
    state.phase = phase;
    state.finished_at = Some(Utc::now());
}
