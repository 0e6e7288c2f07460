//! Terminal rendering of run events and results.

use colored::Colorize;
use serde_json::Value;
use sk_protocol::{Event, PipelineStage, RunState, StageState, StageStatus};

pub fn print_event(event: &Event) {
    match event {
        Event::RunStarted {
            start_stage,
            resumed,
            ..
        } => {
            let verb = if *resumed { "Resuming" } else { "Starting" };
            println!("{} at {}", verb.bold(), start_stage.to_string().cyan());
        }
        Event::StageStatusUpdate { stage, status, .. } => {
            println!("  {:<10} {}", stage.to_string(), status_label(*status));
        }
        Event::ProgressUpdate { progress, .. } => {
            println!(
                "    {}/{} {}",
                progress.current,
                progress.total,
                progress.label.dimmed()
            );
        }
        Event::ItemFailed {
            scene_index, error, ..
        } => {
            println!(
                "    {} scene {}: {}",
                "skipped".yellow(),
                scene_index + 1,
                error
            );
        }
        Event::RunCompleted { prompt_count, .. } => {
            println!("{} {prompt_count} prompts", "Completed:".green().bold());
        }
        Event::RunStopped { stage, .. } => {
            println!("{} during {stage}", "Stopped".yellow().bold());
        }
        Event::RunFailed { stage, error, .. } => {
            println!("{} {stage}: {error}", "Failed".red().bold());
        }
    }
}

fn status_label(status: StageState) -> colored::ColoredString {
    match status {
        StageState::Pending => "pending".dimmed(),
        StageState::InProgress => "in progress".cyan(),
        StageState::Complete => "complete".green(),
        StageState::Error => "error".red(),
    }
}

/// Human-readable summary of the prompts a run produced.
pub fn print_prompts(state: &RunState) {
    if state.prompts.is_empty() {
        return;
    }
    println!();
    for prompt in &state.prompts {
        println!(
            "[{}] {} ({}s)",
            prompt.scene_index + 1,
            prompt.scene_heading.bold(),
            prompt.duration
        );
        println!("    {}", prompt_text(&prompt.prompt));
    }
}

fn prompt_text(prompt: &Value) -> String {
    match prompt {
        Value::String(text) => text.clone(),
        other => other
            .get("text")
            .and_then(Value::as_str)
            .map_or_else(|| other.to_string(), str::to_string),
    }
}

pub fn print_plan(start: Option<PipelineStage>, stages: &[(PipelineStage, StageStatus)]) {
    match start {
        Some(stage) => println!("Start stage: {}", stage.to_string().cyan()),
        None => println!("{}", "Already complete; nothing to run".green()),
    }
    for (stage, status) in stages {
        let note = if status.is_skipped() { " (skipped)" } else { "" };
        println!(
            "  {:<10} {}{}",
            stage.to_string(),
            status_label(status.status),
            note.dimmed()
        );
    }
}
