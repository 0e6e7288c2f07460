//! Stage status bookkeeping.
//!
//! Pure data mutation over the per-stage status map; no control flow lives
//! here.

use sk_protocol::{PipelineStage, StageState, StageStatus, StageStatusUpdate};
use std::collections::BTreeMap;

pub type StageMap = BTreeMap<PipelineStage, StageStatus>;

/// A map with every stage `Pending`.
pub fn reset_stages() -> StageMap {
    PipelineStage::ALL
        .into_iter()
        .map(|stage| (stage, StageStatus::pending()))
        .collect()
}

/// Merge `update` into the status of `stage`.
///
/// Only the fields present in the update are written; e.g. updating just
/// `status` keeps previously stored `data`.
pub fn update_stage_status(stages: &mut StageMap, stage: PipelineStage, update: StageStatusUpdate) {
    let entry = stages.entry(stage).or_default();
    if let Some(status) = update.status {
        entry.status = status;
    }
    if let Some(data) = update.data {
        entry.data = Some(data);
    }
    if let Some(error) = update.error {
        entry.error = Some(error);
    }
}

/// Whether every `Complete` stage is preceded only by `Complete` stages.
pub fn is_prefix_consistent(stages: &StageMap) -> bool {
    PipelineStage::ALL.into_iter().all(|stage| {
        let complete = stages
            .get(&stage)
            .is_some_and(|s| s.status == StageState::Complete);
        !complete
            || stage.predecessors().all(|earlier| {
                stages
                    .get(&earlier)
                    .is_some_and(|s| s.status == StageState::Complete)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_stages() {
        let stages = reset_stages();
        assert_eq!(stages.len(), PipelineStage::ALL.len());
        assert!(stages.values().all(|s| *s == StageStatus::pending()));
    }

    #[test]
    fn test_update_preserves_absent_fields() {
        let mut stages = reset_stages();
        update_stage_status(
            &mut stages,
            PipelineStage::Outline,
            StageStatusUpdate::status(StageState::Complete).with_data(json!({"acts": 3})),
        );

        // Status-only update keeps the stored data
        update_stage_status(
            &mut stages,
            PipelineStage::Outline,
            StageStatusUpdate::status(StageState::InProgress),
        );

        let outline = &stages[&PipelineStage::Outline];
        assert_eq!(outline.status, StageState::InProgress);
        assert_eq!(outline.data, Some(json!({"acts": 3})));
        assert!(outline.error.is_none());
    }

    #[test]
    fn test_update_error_keeps_status_when_absent() {
        let mut stages = reset_stages();
        update_stage_status(
            &mut stages,
            PipelineStage::Script,
            StageStatusUpdate::default().with_error("timeout"),
        );

        let script = &stages[&PipelineStage::Script];
        assert_eq!(script.status, StageState::Pending);
        assert_eq!(script.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_prefix_consistency() {
        let mut stages = reset_stages();
        assert!(is_prefix_consistent(&stages));

        update_stage_status(
            &mut stages,
            PipelineStage::Script,
            StageStatusUpdate::status(StageState::Complete),
        );
        assert!(!is_prefix_consistent(&stages));

        for stage in [PipelineStage::Concept, PipelineStage::Outline] {
            stages.insert(stage, StageStatus::skipped());
        }
        assert!(is_prefix_consistent(&stages));
    }
}
