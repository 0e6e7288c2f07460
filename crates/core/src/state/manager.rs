//! Registry of storyboard runs, one per identifier.
//!
//! The RunRegistry is the entry point for callers that manage several
//! storyboards at once. Each identifier owns one [`PipelineOrchestrator`];
//! starting a run spawns its execution as a background task and returns
//! immediately, after the state has already been seeded.

use crate::collaborators::StoryCollaborator;
use crate::config::Settings;
use crate::engine::{PipelineError, PipelineOrchestrator, RunOutcome};
use anyhow::{anyhow, Result};
use sk_protocol::{Event, ResumeArtifacts, RunConfig, RunState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

struct Entry {
    orchestrator: Arc<PipelineOrchestrator>,
    /// Task executing the latest run for this identifier.
    handle: Option<JoinHandle<Result<RunOutcome, PipelineError>>>,
}

/// Manages storyboard runs keyed by a caller-chosen identifier.
///
/// Starting a run for an identifier that is already running replaces it: the
/// earlier run is asked to stop and its remaining results are discarded.
pub struct RunRegistry {
    /// Orchestrators indexed by run identifier.
    runs: Mutex<HashMap<String, Entry>>,

    collaborator: Arc<dyn StoryCollaborator>,
    settings: Settings,

    /// Shared by every orchestrator; events carry their run id.
    events_tx: Option<mpsc::UnboundedSender<Event>>,
}

impl RunRegistry {
    /// Create an empty registry.
    ///
    /// # Arguments
    ///
    /// * `collaborator` - Generator shared by every run
    /// * `settings` - Orchestrator tuning applied to every run
    pub fn new(collaborator: Arc<dyn StoryCollaborator>, settings: Settings) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            collaborator,
            settings,
            events_tx: None,
        }
    }

    /// Publish the events of every run on `events_tx`.
    pub fn with_events(mut self, events_tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Start a fresh run for `id` in the background.
    ///
    /// # Returns
    ///
    /// The UUID of the new run. Its state is already `running` when this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the brief fails validation; nothing is spawned,
    /// any existing run for `id` is left alone and an unknown `id` stays
    /// unregistered.
    pub async fn start_run(&self, id: &str, config: RunConfig) -> Result<Uuid> {
        let mut runs = self.runs.lock().await;
        let registered = runs.contains_key(id);
        let orchestrator = Arc::clone(&self.entry(&mut runs, id).orchestrator);

        let prepared = match orchestrator.prepare_start(config) {
            Ok(prepared) => prepared,
            Err(e) => {
                if !registered {
                    runs.remove(id);
                }
                return Err(e.into());
            }
        };
        let run_id = prepared.run_id();

        self.entry(&mut runs, id).handle = Some(tokio::spawn(async move {
            orchestrator.drive(prepared).await
        }));

        Ok(run_id)
    }

    /// Resume the run for `id` from `artifacts` in the background.
    ///
    /// # Returns
    ///
    /// The UUID of the resumed run, or `None` when the artifacts show the
    /// run is already complete. Like [`RunRegistry::start_run`], an `id`
    /// that was not registered before stays unregistered unless a run was
    /// actually spawned.
    pub async fn resume_run(
        &self,
        id: &str,
        config: RunConfig,
        artifacts: ResumeArtifacts,
    ) -> Result<Option<Uuid>> {
        let mut runs = self.runs.lock().await;
        let registered = runs.contains_key(id);
        let orchestrator = Arc::clone(&self.entry(&mut runs, id).orchestrator);

        let prepared = match orchestrator.prepare_resume(config, artifacts) {
            Ok(Some(prepared)) => prepared,
            result => {
                if !registered {
                    runs.remove(id);
                }
                return result.map(|_| None).map_err(Into::into);
            }
        };
        let run_id = prepared.run_id();

        self.entry(&mut runs, id).handle = Some(tokio::spawn(async move {
            orchestrator.drive(prepared).await
        }));

        Ok(Some(run_id))
    }

    /// Ask the run for `id` to stop at its next check.
    ///
    /// # Errors
    ///
    /// Returns an error if no run is registered under `id`.
    pub async fn stop_run(&self, id: &str) -> Result<()> {
        let runs = self.runs.lock().await;
        let entry = runs.get(id).ok_or_else(|| anyhow!("Run {id} not found"))?;
        entry.orchestrator.stop_run();
        Ok(())
    }

    /// Clear the state for `id` back to idle.
    pub async fn reset_run(&self, id: &str) -> Result<()> {
        let runs = self.runs.lock().await;
        let entry = runs.get(id).ok_or_else(|| anyhow!("Run {id} not found"))?;
        entry.orchestrator.reset_run();
        Ok(())
    }

    /// Stop the run for `id` and forget it.
    ///
    /// The run task is left to observe the stop on its own; its outcome can
    /// no longer be awaited through the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if no run is registered under `id`.
    pub async fn remove_run(&self, id: &str) -> Result<()> {
        let mut runs = self.runs.lock().await;
        let entry = runs.remove(id).ok_or_else(|| anyhow!("Run {id} not found"))?;
        entry.orchestrator.stop_run();
        Ok(())
    }

    /// Snapshot of the state for `id`, or `None` if unknown.
    pub async fn get_state(&self, id: &str) -> Option<RunState> {
        let runs = self.runs.lock().await;
        runs.get(id).map(|entry| entry.orchestrator.get_state())
    }

    /// Follow state changes for `id`.
    pub async fn subscribe(&self, id: &str) -> Option<watch::Receiver<RunState>> {
        let runs = self.runs.lock().await;
        runs.get(id).map(|entry| entry.orchestrator.subscribe())
    }

    /// Identifiers of every registered run, sorted.
    pub async fn run_ids(&self) -> Vec<String> {
        let runs = self.runs.lock().await;
        let mut ids: Vec<String> = runs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Wait for the latest run for `id` to finish and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown, has nothing in flight, the run
    /// failed, or its task panicked.
    pub async fn wait(&self, id: &str) -> Result<RunOutcome> {
        let handle = {
            let mut runs = self.runs.lock().await;
            let entry = runs
                .get_mut(id)
                .ok_or_else(|| anyhow!("Run {id} not found"))?;
            entry
                .handle
                .take()
                .ok_or_else(|| anyhow!("Run {id} has no execution in flight"))?
        };

        let outcome = handle
            .await
            .map_err(|e| anyhow!("Run {id} task failed: {e}"))??;
        Ok(outcome)
    }

    fn entry<'a>(&self, runs: &'a mut HashMap<String, Entry>, id: &str) -> &'a mut Entry {
        runs.entry(id.to_string()).or_insert_with(|| {
            let mut orchestrator =
                PipelineOrchestrator::new(Arc::clone(&self.collaborator), self.settings.clone());
            if let Some(tx) = &self.events_tx {
                orchestrator = orchestrator.with_events(tx.clone());
            }
            Entry {
                orchestrator: Arc::new(orchestrator),
                handle: None,
            }
        })
    }
}
