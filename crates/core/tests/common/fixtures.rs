//! Test fixtures for briefs, scripts and orchestrators.

use sk_core::collaborators::StoryCollaborator;
use sk_core::config::Settings;
use sk_core::engine::PipelineOrchestrator;
use sk_protocol::{Event, RunConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The brief used throughout the acceptance scenarios.
#[allow(dead_code)]
pub fn lighthouse_brief() -> RunConfig {
    RunConfig::new("A lonely lighthouse keeper", "drama")
}

/// A screenplay with one slugline per entry of `locations`.
#[allow(dead_code)]
pub fn screenplay(locations: &[&str]) -> String {
    locations
        .iter()
        .enumerate()
        .map(|(idx, location)| {
            format!("INT. {location} - NIGHT\n\nThe keeper moves through beat {idx}.\n\n")
        })
        .collect()
}

/// An orchestrator with no concept delay, publishing events on the
/// returned receiver.
#[allow(dead_code)]
pub fn orchestrator_with_events(
    collaborator: Arc<dyn StoryCollaborator>,
) -> (Arc<PipelineOrchestrator>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = PipelineOrchestrator::new(collaborator, Settings::immediate()).with_events(tx);
    (Arc::new(orchestrator), rx)
}

/// Drain every event published so far.
#[allow(dead_code)]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
