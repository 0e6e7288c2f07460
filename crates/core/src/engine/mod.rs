//! Pipeline execution engine.
//!
//! The [`PipelineOrchestrator`] drives one storyboard run at a time through
//! `concept -> outline -> script -> breakdown -> prompts -> complete`,
//! delegating every generation step to a [`StoryCollaborator`].
//!
//! Run state lives in a `watch` channel: readers take cloned snapshots with
//! [`PipelineOrchestrator::get_state`] or follow changes with
//! [`PipelineOrchestrator::subscribe`]. Every write is tagged with the
//! generation of the run that made it, so a run that was replaced or reset
//! can never touch the state of its successor.

pub mod error;
pub mod shots;

pub use error::{PipelineError, RunOutcome};

use crate::collaborators::{
    BreakdownRequest, CallContext, CollaboratorError, OutlineRequest, PromptRequest,
    ScriptRequest, StoryCollaborator,
};
use crate::config::Settings;
use crate::engine::shots::normalize_shots;
use crate::state::cancellation::CancellationGate;
use crate::state::planner::{plan_resume, plan_start, ResumePlan};
use crate::state::progress::{breakdown_label, scene_label, ProgressReporter};
use crate::state::run::{
    begin_stage, complete_run, complete_stage, create_run, fail_run, record_item_failure,
    set_progress, stop_run,
};
use serde_json::{json, Value};
use sk_protocol::{
    BreakdownItem, Event, PipelineStage, ResumeArtifacts, RunConfig, RunState, SceneHeading,
    ScenePrompt,
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

/// Why execution left the stage loop early.
#[derive(Debug)]
enum Interrupt {
    Stopped(PipelineStage),
    Superseded,
    Failed {
        stage: PipelineStage,
        message: String,
    },
}

type StepResult<T = ()> = Result<T, Interrupt>;

/// Identity and inputs of the run being executed.
#[derive(Debug, Clone)]
struct ActiveRun {
    run_id: Uuid,
    generation: u64,
    gate: CancellationGate,
    ctx: CallContext,
    config: RunConfig,
}

/// A run whose state has been seeded but whose stages have not started.
///
/// Produced by [`PipelineOrchestrator::prepare_start`] and
/// [`PipelineOrchestrator::prepare_resume`]; executed by
/// [`PipelineOrchestrator::drive`].
#[derive(Debug)]
pub struct PreparedRun {
    run: ActiveRun,
    start: PipelineStage,
}

impl PreparedRun {
    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }

    /// First stage that will execute.
    pub fn start_stage(&self) -> PipelineStage {
        self.start
    }
}

/// Drives storyboard runs and owns their state.
pub struct PipelineOrchestrator {
    collaborator: Arc<dyn StoryCollaborator>,
    settings: Settings,
    state: watch::Sender<RunState>,
    gate: Mutex<CancellationGate>,
    events_tx: Option<mpsc::UnboundedSender<Event>>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator with an idle state.
    ///
    /// # Arguments
    ///
    /// * `collaborator` - Generator used for every stage
    /// * `settings` - Orchestrator tuning loaded from `config.toml`
    pub fn new(collaborator: Arc<dyn StoryCollaborator>, settings: Settings) -> Self {
        let (state, _) = watch::channel(RunState::default());
        Self {
            collaborator,
            settings,
            state,
            gate: Mutex::new(CancellationGate::new()),
            events_tx: None,
        }
    }

    /// Also publish every transition as an [`Event`] on `events_tx`.
    pub fn with_events(mut self, events_tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a fresh run and execute it to a terminal state.
    ///
    /// Any previous state is discarded, including that of a run still in
    /// flight; the earlier run is asked to stop and its late results are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Validation` for a malformed brief (the state is
    /// left untouched) or `PipelineError::StageExecution` when a stage fails.
    pub async fn start_run(&self, config: RunConfig) -> Result<RunOutcome, PipelineError> {
        let prepared = self.prepare_start(config)?;
        self.drive(prepared).await
    }

    /// Continue a run from the artifacts the caller already holds.
    ///
    /// When the artifacts include prompts the run is already complete and
    /// nothing happens.
    pub async fn resume_run(
        &self,
        config: RunConfig,
        artifacts: ResumeArtifacts,
    ) -> Result<RunOutcome, PipelineError> {
        match self.prepare_resume(config, artifacts)? {
            Some(prepared) => self.drive(prepared).await,
            None => Ok(RunOutcome::AlreadyComplete),
        }
    }

    /// Validate `config` and seed the state of a fresh run.
    ///
    /// The state is `running` once this returns, so callers that spawn
    /// [`Self::drive`] in the background never observe a stale snapshot.
    pub fn prepare_start(&self, config: RunConfig) -> Result<PreparedRun, PipelineError> {
        let plan = plan_start(&config);
        validate(&config, &plan)?;
        Ok(self.launch(config, plan, ResumeArtifacts::default(), false))
    }

    /// Plan and seed a resumed run. Returns `None` when the artifacts show
    /// the run is already complete; the state is then left as it is.
    pub fn prepare_resume(
        &self,
        config: RunConfig,
        artifacts: ResumeArtifacts,
    ) -> Result<Option<PreparedRun>, PipelineError> {
        let plan = plan_resume(artifacts.flags(), config.use_provided_script);
        if plan.is_complete() {
            tracing::info!("Resume artifacts include prompts; nothing to do");
            return Ok(None);
        }
        validate(&config, &plan)?;
        Ok(Some(self.launch(config, plan, artifacts, true)))
    }

    /// Execute a prepared run until it completes, stops, fails, or is
    /// superseded.
    pub async fn drive(&self, prepared: PreparedRun) -> Result<RunOutcome, PipelineError> {
        let PreparedRun { run, start } = prepared;

        let interrupt = match self.execute(&run, start).await {
            Ok(prompt_count) => {
                tracing::info!(run_id = %run.run_id, prompt_count, "Run completed");
                return Ok(RunOutcome::Completed { prompt_count });
            }
            Err(interrupt) => interrupt,
        };

        match interrupt {
            Interrupt::Superseded => {
                tracing::debug!(run_id = %run.run_id, "Run superseded; discarding results");
                Ok(RunOutcome::Superseded)
            }
            Interrupt::Stopped(stage) => {
                match self.update(&run, |state| stop_run(state, stage)) {
                    Ok(()) => {
                        tracing::warn!(run_id = %run.run_id, %stage, "Run stopped");
                        Ok(RunOutcome::Stopped { stage })
                    }
                    Err(_) => Ok(RunOutcome::Superseded),
                }
            }
            Interrupt::Failed { stage, message } => {
                let error = message.clone();
                match self.update(&run, |state| fail_run(state, stage, error)) {
                    Ok(()) => {
                        tracing::error!(run_id = %run.run_id, %stage, "Stage failed: {message}");
                        Err(PipelineError::StageExecution { stage, message })
                    }
                    Err(_) => Ok(RunOutcome::Superseded),
                }
            }
        }
    }

    /// Ask the current run to stop at its next check.
    ///
    /// A collaborator call already in flight is allowed to finish.
    pub fn stop_run(&self) {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if !gate.is_requested() {
            tracing::info!("Stop requested");
        }
        gate.request();
    }

    /// Clear the state back to idle. A run in flight is stopped and none of
    /// its remaining results are kept.
    pub fn reset_run(&self) {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        gate.request();
        self.state.send_modify(|state| {
            *state = RunState {
                generation: state.generation + 1,
                ..RunState::default()
            };
        });
        tracing::debug!("Run state reset");
    }

    /// Snapshot of the current state.
    pub fn get_state(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// The state as a stream of snapshots, starting with the current one.
    pub fn watch_stream(&self) -> WatchStream<RunState> {
        WatchStream::new(self.state.subscribe())
    }

    /// Replace the state with a freshly seeded run and arm a new gate.
    fn launch(
        &self,
        config: RunConfig,
        plan: ResumePlan,
        artifacts: ResumeArtifacts,
        resumed: bool,
    ) -> PreparedRun {
        let start = plan.start.unwrap_or(PipelineStage::Complete);
        let run_id = Uuid::new_v4();
        let gate = CancellationGate::new();

        let mut slot = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        slot.request();
        *slot = gate.clone();

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = state.generation + 1;
            *state = create_run(run_id, generation, config.clone(), &plan, artifacts);
        });
        drop(slot);

        tracing::info!(%run_id, start_stage = %start, resumed, bypass = plan.bypass, "Run started");
        self.publish(vec![Event::RunStarted {
            run_id,
            start_stage: start,
            resumed,
        }]);

        PreparedRun {
            run: ActiveRun {
                run_id,
                generation,
                ctx: CallContext::new(run_id, gate.token()),
                gate,
                config,
            },
            start,
        }
    }

    /// Run every stage from `start` on; returns the prompt count.
    async fn execute(&self, run: &ActiveRun, start: PipelineStage) -> StepResult<usize> {
        for stage in PipelineStage::ALL
            .into_iter()
            .filter(|stage| *stage >= start && *stage != PipelineStage::Complete)
        {
            self.check(run, stage)?;
            match stage {
                PipelineStage::Concept => self.run_concept(run).await?,
                PipelineStage::Outline => self.run_outline(run).await?,
                PipelineStage::Script => self.run_script(run).await?,
                PipelineStage::Breakdown => self.run_breakdown(run).await?,
                PipelineStage::Prompts => self.run_prompts(run).await?,
                PipelineStage::Complete => {}
            }
        }

        self.check(run, PipelineStage::Complete)?;
        let mut prompt_count = 0;
        self.update(run, |state| {
            prompt_count = state.prompts.len();
            complete_run(state)
        })?;
        Ok(prompt_count)
    }

    async fn run_concept(&self, run: &ActiveRun) -> StepResult {
        let stage = PipelineStage::Concept;
        self.enter(run, stage)?;

        let delay = self.settings.concept_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.settle(run, stage, Ok(()))?;

        self.update(run, |state| {
            vec![complete_stage(state, stage, json!({ "validated": true }))]
        })
    }

    async fn run_outline(&self, run: &ActiveRun) -> StepResult {
        let stage = PipelineStage::Outline;
        self.enter(run, stage)?;

        let request = OutlineRequest::from_config(&run.config);
        let result = self
            .collaborator
            .generate_outline(&request, &run.ctx)
            .await;
        let outline = self.settle(run, stage, result)?;

        self.update(run, |state| {
            state.outline = Some(outline.clone());
            vec![complete_stage(state, stage, outline)]
        })
    }

    async fn run_script(&self, run: &ActiveRun) -> StepResult {
        let stage = PipelineStage::Script;
        self.enter(run, stage)?;

        let outline = self.state.borrow().outline.clone().unwrap_or(Value::Null);
        let request = ScriptRequest::new(outline, &run.config);
        let result = self.collaborator.generate_script(&request, &run.ctx).await;
        let script = self.settle(run, stage, result)?;

        self.update(run, |state| {
            state.script = Some(script.clone());
            vec![complete_stage(state, stage, Value::String(script))]
        })
    }

    async fn run_breakdown(&self, run: &ActiveRun) -> StepResult {
        let stage = PipelineStage::Breakdown;
        self.enter(run, stage)?;

        let script = self.state.borrow().script.clone().unwrap_or_default();
        let result = self.collaborator.parse_script(&script, &run.ctx).await;
        let parsed = self.settle(run, stage, result)?;
        tracing::debug!(scenes = parsed.scene_count(), "Script parsed");

        let headings = parsed.scene_headings.clone();
        self.update(run, |state| {
            state.scene_headings = headings;
            state.scenes.clear();
            Vec::new()
        })?;

        let reporter = ProgressReporter::begin(
            stage,
            parsed.scene_count(),
            self.settings.label_max_chars,
        );
        let pace = run.config.pace_config();

        for (index, heading, text) in parsed.scenes() {
            self.check(run, stage)?;
            tracing::debug!(scene_index = index, slug = %heading.slug, "Breaking down scene");
            self.report(run, reporter.as_ref(), index, scene_label(index, Some(heading)))?;

            let request = BreakdownRequest {
                scene_index: index,
                heading: heading.clone(),
                scene_text: text.to_string(),
                genre: run.config.genre.clone(),
                pace,
            };
            let item = match self
                .collaborator
                .generate_breakdown(&request, &run.ctx)
                .await
            {
                Ok(item) => item,
                Err(_) if run.gate.is_requested() => return Err(Interrupt::Stopped(stage)),
                Err(e) => {
                    return Err(Interrupt::Failed {
                        stage,
                        message: e.to_string(),
                    })
                }
            };

            // Kept even if a stop arrived during the call; the next
            // iteration's check halts the loop.
            self.update(run, |state| {
                state.scenes.push(item);
                Vec::new()
            })?;
        }

        self.update(run, |state| {
            state.progress = None;
            let scene_count = state.scenes.len();
            vec![complete_stage(
                state,
                stage,
                json!({ "scene_count": scene_count }),
            )]
        })
    }

    async fn run_prompts(&self, run: &ActiveRun) -> StepResult {
        let stage = PipelineStage::Prompts;
        self.enter(run, stage)?;

        let (scenes, headings) = {
            let state = self.state.borrow();
            (state.scenes.clone(), state.scene_headings.clone())
        };
        let reporter =
            ProgressReporter::begin(stage, scenes.len(), self.settings.label_max_chars);
        let shot_duration = run.config.effective_shot_duration();
        let mut failed_scenes = 0usize;

        for (index, item) in scenes.iter().enumerate() {
            self.check(run, stage)?;

            let label = match headings.get(index) {
                Some(heading) => scene_label(index, Some(heading)),
                None => breakdown_label(index, item),
            };
            self.report(run, reporter.as_ref(), index, label)?;

            let shots = normalize_shots(item);
            if shots.is_empty() {
                tracing::debug!(scene_index = index, "Scene has no shots; skipping");
                continue;
            }

            let scene_heading = prompt_heading(index, item, headings.get(index));
            tracing::debug!(scene_index = index, shots = shots.len(), "Generating prompts");
            let request = PromptRequest {
                scene_index: index,
                shots,
                scene_heading: scene_heading.clone(),
                genre: run.config.genre.clone(),
                style: run.config.style.clone(),
                content_policy: run.config.content_policy,
                shot_duration,
                characters: run.config.characters.clone(),
            };

            match self.collaborator.generate_prompts(&request, &run.ctx).await {
                Ok(_) if run.gate.is_requested() => return Err(Interrupt::Stopped(stage)),
                Ok(batch) => {
                    let prompts: Vec<ScenePrompt> = batch
                        .into_prompts()
                        .into_iter()
                        .map(|prompt| ScenePrompt {
                            scene_index: index,
                            scene_heading: scene_heading.clone(),
                            prompt,
                            duration: shot_duration,
                        })
                        .collect();
                    self.update(run, |state| {
                        state.prompts.extend(prompts);
                        Vec::new()
                    })?;
                }
                Err(_) if run.gate.is_requested() => return Err(Interrupt::Stopped(stage)),
                Err(e) => {
                    failed_scenes += 1;
                    tracing::warn!(
                        scene_index = index,
                        "Prompt generation failed; continuing: {e}"
                    );
                    let error = e.to_string();
                    self.update(run, |state| {
                        vec![record_item_failure(state, stage, index, error)]
                    })?;
                }
            }
        }

        self.update(run, |state| {
            state.progress = None;
            let prompt_count = state.prompts.len();
            vec![complete_stage(
                state,
                stage,
                json!({ "prompt_count": prompt_count, "failed_scenes": failed_scenes }),
            )]
        })
    }

    /// Mark `stage` in progress.
    fn enter(&self, run: &ActiveRun, stage: PipelineStage) -> StepResult {
        tracing::info!(run_id = %run.run_id, %stage, "Stage started");
        self.update(run, |state| vec![begin_stage(state, stage)])
    }

    fn report(
        &self,
        run: &ActiveRun,
        reporter: Option<&ProgressReporter>,
        index: usize,
        label: String,
    ) -> StepResult {
        let Some(reporter) = reporter else {
            return Ok(());
        };
        let info = reporter.advance(index, &label);
        self.update(run, |state| vec![set_progress(state, info)])
    }

    /// Poll the gate before a unit of work.
    fn check(&self, run: &ActiveRun, stage: PipelineStage) -> StepResult {
        if self.state.borrow().generation != run.generation {
            return Err(Interrupt::Superseded);
        }
        if run.gate.is_requested() {
            return Err(Interrupt::Stopped(stage));
        }
        Ok(())
    }

    /// Resolve the result of a single-call stage. Once a stop has been
    /// requested the result is discarded, whether it succeeded or not.
    fn settle<T>(
        &self,
        run: &ActiveRun,
        stage: PipelineStage,
        result: Result<T, CollaboratorError>,
    ) -> StepResult<T> {
        self.check(run, stage)?;
        result.map_err(|e| Interrupt::Failed {
            stage,
            message: e.to_string(),
        })
    }

    /// Apply `f` to the state if `run` still owns it, then publish the
    /// events it returned.
    fn update<F>(&self, run: &ActiveRun, f: F) -> StepResult
    where
        F: FnOnce(&mut RunState) -> Vec<Event>,
    {
        let mut emitted = None;
        self.state.send_if_modified(|state| {
            if state.generation != run.generation {
                return false;
            }
            emitted = Some(f(state));
            true
        });

        match emitted {
            Some(events) => {
                self.publish(events);
                Ok(())
            }
            None => Err(Interrupt::Superseded),
        }
    }

    fn publish(&self, events: Vec<Event>) {
        if let Some(tx) = &self.events_tx {
            for event in events {
                // A dropped receiver only means nobody is listening.
                let _ = tx.send(event);
            }
        }
    }
}

/// Reject briefs the planned run cannot execute.
fn validate(config: &RunConfig, plan: &ResumePlan) -> Result<(), PipelineError> {
    if plan.bypass && config.bypass_script().is_none() {
        return Err(PipelineError::Validation(
            "use_provided_script is set but provided_script is empty".to_string(),
        ));
    }

    let generates_outline = plan
        .start
        .is_some_and(|start| start <= PipelineStage::Outline);
    if generates_outline && config.concept.trim().is_empty() {
        return Err(PipelineError::Validation(
            "concept must not be empty".to_string(),
        ));
    }
    if generates_outline && config.act_count == 0 {
        return Err(PipelineError::Validation(
            "act_count must be at least 1".to_string(),
        ));
    }

    if config.shot_duration == Some(0) {
        return Err(PipelineError::Validation(
            "shot_duration must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Heading passed to the prompt generator: the parsed slugline, else the
/// heading the breakdown carries, else `Scene {n}`.
fn prompt_heading(index: usize, item: &BreakdownItem, heading: Option<&SceneHeading>) -> String {
    heading
        .map(|h| h.slug.trim())
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
        .or_else(|| {
            ["heading", "sceneHeading"]
                .iter()
                .find_map(|key| item.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Scene {}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::OfflineCollaborator;
    use sk_protocol::{RunPhase, StageState};

    fn orchestrator() -> PipelineOrchestrator {
        PipelineOrchestrator::new(Arc::new(OfflineCollaborator::new()), Settings::immediate())
    }

    #[test]
    fn test_new_orchestrator_is_idle() {
        let orchestrator = orchestrator();
        let state = orchestrator.get_state();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(state.run_id.is_none());
    }

    #[tokio::test]
    async fn test_offline_run_completes() {
        let orchestrator = orchestrator();
        let outcome = orchestrator
            .start_run(RunConfig::new("A lonely lighthouse keeper", "drama"))
            .await
            .expect("run should succeed");

        let state = orchestrator.get_state();
        assert!(matches!(outcome, RunOutcome::Completed { prompt_count } if prompt_count == state.prompts.len()));
        assert!(!state.prompts.is_empty());
        assert_eq!(state.phase, RunPhase::Completed);
        assert!(PipelineStage::ALL
            .into_iter()
            .all(|stage| state.stage(stage) == StageState::Complete));
        assert!(state.progress.is_none());
    }

    #[test]
    fn test_prepare_start_seeds_running_state() {
        let orchestrator = orchestrator();
        let prepared = orchestrator
            .prepare_start(RunConfig::new("c", "drama"))
            .expect("valid brief");

        let state = orchestrator.get_state();
        assert!(state.is_running);
        assert_eq!(state.run_id, Some(prepared.run_id()));
        assert_eq!(prepared.start_stage(), PipelineStage::Concept);
    }

    #[test]
    fn test_validation() {
        let plan = ResumePlan::at(PipelineStage::Concept);
        assert!(validate(&RunConfig::new("", "drama"), &plan).is_err());

        let mut config = RunConfig::new("c", "drama");
        config.act_count = 0;
        assert!(validate(&config, &plan).is_err());
        // Outline not generated: act count is irrelevant
        assert!(validate(&config, &ResumePlan::at(PipelineStage::Breakdown)).is_ok());

        let mut config = RunConfig::new("c", "drama");
        config.shot_duration = Some(0);
        assert!(validate(&config, &ResumePlan::at(PipelineStage::Prompts)).is_err());

        let mut config = RunConfig::new("", "drama");
        config.use_provided_script = true;
        assert!(matches!(
            validate(&config, &ResumePlan::bypass()),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_prompt_heading_fallbacks() {
        let heading = SceneHeading {
            slug: "INT. LAMP ROOM - NIGHT".to_string(),
            ..SceneHeading::default()
        };
        let item = json!({"heading": "EXT. CLIFF - DAY"});

        assert_eq!(prompt_heading(0, &item, Some(&heading)), "INT. LAMP ROOM - NIGHT");
        assert_eq!(prompt_heading(0, &item, None), "EXT. CLIFF - DAY");
        assert_eq!(
            prompt_heading(1, &json!({"sceneHeading": "INT. HALL"}), None),
            "INT. HALL"
        );
        assert_eq!(prompt_heading(2, &json!({}), None), "Scene 3");
    }

    #[test]
    fn test_reset_clears_state() {
        let orchestrator = orchestrator();
        orchestrator
            .prepare_start(RunConfig::new("c", "drama"))
            .expect("valid brief");
        let before = orchestrator.get_state().generation;

        orchestrator.reset_run();

        let state = orchestrator.get_state();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(state.run_id.is_none());
        assert!(state.generation > before);
    }
}
