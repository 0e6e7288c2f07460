//! Custom assertion helpers over run state and events.

use sk_protocol::{Event, PipelineStage, RunState, StageState};

/// Assert every stage in `stages` has `expected` status.
#[allow(dead_code)]
pub fn assert_stages(state: &RunState, stages: &[PipelineStage], expected: StageState) {
    for stage in stages {
        assert_eq!(
            state.stage(*stage),
            expected,
            "stage {stage} should be {expected:?}, state: {:?}",
            state.stages
        );
    }
}

/// Assert no stage is in `error`.
#[allow(dead_code)]
pub fn assert_no_errors(state: &RunState) {
    assert!(
        state.failed_stages().is_empty(),
        "Expected no failed stages, got {:?}",
        state.failed_stages()
    );
}

/// Stages that entered `in_progress`, in event order.
#[allow(dead_code)]
pub fn started_stages(events: &[Event]) -> Vec<PipelineStage> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageStatusUpdate {
                stage,
                status: StageState::InProgress,
                ..
            } => Some(*stage),
            _ => None,
        })
        .collect()
}

/// `(current, total)` of every progress event for `stage`.
#[allow(dead_code)]
pub fn progress_positions(events: &[Event], stage: PipelineStage) -> Vec<(usize, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ProgressUpdate { progress, .. } if progress.stage == stage => {
                Some((progress.current, progress.total))
            }
            _ => None,
        })
        .collect()
}

/// Assert the last event is the run's single terminal event.
#[allow(dead_code)]
pub fn assert_single_terminal_event(events: &[Event]) {
    let terminal = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminal, 1, "Expected one terminal event, got {events:?}");
    assert!(
        events.last().is_some_and(Event::is_terminal),
        "Last event should be terminal, got: {:?}",
        events.last()
    );
}
