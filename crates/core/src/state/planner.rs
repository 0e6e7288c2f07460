//! Resume planning.
//!
//! Maps "which artifacts already exist" to "the earliest stage that still
//! has to run". Everything here is a pure function of its inputs, so calling
//! it twice with the same artifacts always yields the same plan.

use crate::state::tracker::{reset_stages, StageMap};
use serde_json::{json, Value};
use sk_protocol::{PipelineStage, ResumeArtifacts, ResumeFlags, RunConfig, StageStatus};

/// Where a run should begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    /// First stage to execute; `None` when the run is already complete.
    pub start: Option<PipelineStage>,
    /// The script comes from the brief rather than from generation.
    pub bypass: bool,
}

impl ResumePlan {
    pub fn already_complete() -> Self {
        Self {
            start: None,
            bypass: false,
        }
    }

    pub fn at(stage: PipelineStage) -> Self {
        Self {
            start: Some(stage),
            bypass: false,
        }
    }

    pub fn bypass() -> Self {
        Self {
            start: Some(PipelineStage::Breakdown),
            bypass: true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_none()
    }
}

/// Plan for a fresh run: start at `Concept`, or at `Breakdown` in bypass
/// mode.
pub fn plan_start(config: &RunConfig) -> ResumePlan {
    if config.use_provided_script {
        ResumePlan::bypass()
    } else {
        ResumePlan::at(PipelineStage::Concept)
    }
}

/// Plan a resumed run.
///
/// Later-stage artifacts win: supplied scenes or a supplied script take
/// priority over a pre-authored script in the brief, which in turn takes
/// priority over an outline and over generation.
pub fn plan_resume(flags: ResumeFlags, bypass: bool) -> ResumePlan {
    if flags.has_prompts {
        ResumePlan::already_complete()
    } else if flags.has_scenes {
        ResumePlan::at(PipelineStage::Prompts)
    } else if flags.has_script {
        ResumePlan::at(PipelineStage::Breakdown)
    } else if bypass {
        ResumePlan::bypass()
    } else if flags.has_outline {
        ResumePlan::at(PipelineStage::Script)
    } else {
        ResumePlan::at(PipelineStage::Outline)
    }
}

/// Stage statuses a run starts from under `plan`.
///
/// Every stage before the start stage is `Complete`; stages whose artifact
/// was not supplied carry the `skipped` sentinel so the ordering invariant
/// holds. Everything from the start stage on is `Pending`.
pub fn seed_statuses(plan: &ResumePlan, artifacts: &ResumeArtifacts) -> StageMap {
    let mut stages = reset_stages();
    let Some(start) = plan.start else {
        return stages;
    };

    for stage in start.predecessors() {
        let data = match stage {
            PipelineStage::Concept if !plan.bypass => Some(json!({ "validated": true })),
            PipelineStage::Outline => artifacts.outline.clone().filter(|o| !o.is_null()),
            PipelineStage::Script => artifacts
                .script
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| Value::String(s.to_string())),
            PipelineStage::Breakdown if !artifacts.scenes.is_empty() => {
                Some(json!({ "scene_count": artifacts.scenes.len() }))
            }
            _ => None,
        };
        let status = data.map_or_else(StageStatus::skipped, StageStatus::complete);
        stages.insert(stage, status);
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tracker::is_prefix_consistent;
    use sk_protocol::StageState;

    fn flags(outline: bool, script: bool, scenes: bool, prompts: bool) -> ResumeFlags {
        ResumeFlags {
            has_outline: outline,
            has_script: script,
            has_scenes: scenes,
            has_prompts: prompts,
        }
    }

    #[test]
    fn test_plan_resume_table() {
        assert!(plan_resume(flags(true, true, true, true), false).is_complete());
        assert!(plan_resume(flags(false, false, false, true), false).is_complete());
        assert_eq!(
            plan_resume(flags(false, false, true, false), false).start,
            Some(PipelineStage::Prompts)
        );
        assert_eq!(
            plan_resume(flags(true, true, false, false), false).start,
            Some(PipelineStage::Breakdown)
        );
        assert_eq!(
            plan_resume(flags(true, false, false, false), false).start,
            Some(PipelineStage::Script)
        );
        assert_eq!(
            plan_resume(ResumeFlags::default(), false).start,
            Some(PipelineStage::Outline)
        );
    }

    #[test]
    fn test_plan_resume_is_deterministic() {
        let artifacts = ResumeArtifacts {
            script: Some("INT. ROOM - DAY...".to_string()),
            ..ResumeArtifacts::default()
        };
        let first = plan_resume(artifacts.flags(), false);
        let second = plan_resume(artifacts.flags(), false);
        assert_eq!(first, second);
        assert_eq!(
            seed_statuses(&first, &artifacts),
            seed_statuses(&second, &artifacts)
        );
    }

    #[test]
    fn test_bypass_priority() {
        // Brief script beats an outline artifact
        let plan = plan_resume(flags(true, false, false, false), true);
        assert_eq!(plan, ResumePlan::bypass());

        // Supplied scenes beat the brief script
        let plan = plan_resume(flags(false, false, true, false), true);
        assert_eq!(plan.start, Some(PipelineStage::Prompts));
        assert!(!plan.bypass);
    }

    #[test]
    fn test_plan_start() {
        let config = RunConfig::new("c", "drama");
        assert_eq!(plan_start(&config).start, Some(PipelineStage::Concept));

        let config = config.with_provided_script("INT. ROOM - DAY");
        assert_eq!(plan_start(&config), ResumePlan::bypass());
    }

    #[test]
    fn test_seed_statuses_script_only() {
        let artifacts = ResumeArtifacts {
            script: Some("INT. ROOM - DAY...".to_string()),
            ..ResumeArtifacts::default()
        };
        let plan = plan_resume(artifacts.flags(), false);
        let stages = seed_statuses(&plan, &artifacts);

        for stage in [
            PipelineStage::Concept,
            PipelineStage::Outline,
            PipelineStage::Script,
        ] {
            assert_eq!(stages[&stage].status, StageState::Complete, "{stage}");
        }
        assert!(stages[&PipelineStage::Outline].is_skipped());
        assert_eq!(
            stages[&PipelineStage::Script].data,
            Some(Value::String("INT. ROOM - DAY...".to_string()))
        );
        assert_eq!(stages[&PipelineStage::Breakdown].status, StageState::Pending);
        assert!(is_prefix_consistent(&stages));
    }

    #[test]
    fn test_seed_statuses_bypass_marks_skipped() {
        let stages = seed_statuses(&ResumePlan::bypass(), &ResumeArtifacts::default());
        for stage in [
            PipelineStage::Concept,
            PipelineStage::Outline,
            PipelineStage::Script,
        ] {
            assert!(stages[&stage].is_skipped(), "{stage}");
        }
        assert_eq!(stages[&PipelineStage::Breakdown].status, StageState::Pending);
    }

    #[test]
    fn test_seed_statuses_scenes() {
        let artifacts = ResumeArtifacts {
            scenes: vec![json!({"shots": [1]}), json!({"shots": [2]})],
            ..ResumeArtifacts::default()
        };
        let plan = plan_resume(artifacts.flags(), false);
        let stages = seed_statuses(&plan, &artifacts);

        assert_eq!(
            stages[&PipelineStage::Breakdown].data,
            Some(json!({"scene_count": 2}))
        );
        assert_eq!(stages[&PipelineStage::Prompts].status, StageState::Pending);
        assert!(is_prefix_consistent(&stages));
    }

    #[test]
    fn test_seed_statuses_complete_plan_is_untouched() {
        let stages = seed_statuses(&ResumePlan::already_complete(), &ResumeArtifacts::default());
        assert_eq!(stages, reset_stages());
    }
}
