mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use color_eyre::eyre::{eyre, Result, WrapErr};
use sk_core::collaborators::OfflineCollaborator;
use sk_core::config::loader::{load_artifacts, load_brief, load_config};
use sk_core::config::AppConfig;
use sk_core::engine::{PipelineOrchestrator, RunOutcome};
use sk_core::state::planner::{plan_resume, seed_statuses};
use sk_protocol::{ResumeArtifacts, RunConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "storyboard=debug,sk_core=debug".to_string()
        } else {
            "storyboard=info,sk_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            brief,
            script,
            json,
        } => {
            let config = load_config(&cli.root).await?;
            let mut brief = resolve_brief(&config, &brief)?;
            if let Some(path) = script {
                let text = std::fs::read_to_string(&path)
                    .wrap_err_with(|| format!("Failed to read script {}", path.display()))?;
                brief = brief.with_provided_script(text);
            }
            execute(config, brief, None, json).await
        }
        Commands::Resume {
            brief,
            artifacts,
            json,
        } => {
            let config = load_config(&cli.root).await?;
            let brief = resolve_brief(&config, &brief)?;
            let artifacts = load_artifacts(&artifacts)?;
            execute(config, brief, Some(artifacts), json).await
        }
        Commands::Plan { artifacts, bypass } => {
            let artifacts = load_artifacts(&artifacts)?;
            let plan = plan_resume(artifacts.flags(), bypass);
            let stages: Vec<_> = seed_statuses(&plan, &artifacts).into_iter().collect();
            output::print_plan(plan.start, &stages);
            Ok(())
        }
    }
}

/// A brief is either a file path or the name of a brief under
/// `.storyboard-kit/briefs/`.
fn resolve_brief(config: &AppConfig, brief: &str) -> Result<RunConfig> {
    let path = Path::new(brief);
    if path.is_file() {
        return Ok(load_brief(path)?);
    }
    config
        .briefs
        .get(brief)
        .cloned()
        .ok_or_else(|| eyre!("Brief '{brief}' is neither a file nor a named brief"))
}

async fn execute(
    config: AppConfig,
    brief: RunConfig,
    artifacts: Option<ResumeArtifacts>,
    json: bool,
) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let orchestrator =
        PipelineOrchestrator::new(Arc::new(OfflineCollaborator::new()), config.settings)
            .with_events(events_tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if !json {
                output::print_event(&event);
            }
        }
    });

    let result = {
        let run = async {
            match artifacts {
                Some(artifacts) => orchestrator.resume_run(brief, artifacts).await,
                None => orchestrator.start_run(brief).await,
            }
        };
        tokio::pin!(run);

        // Ctrl-C asks the run to stop once the current step finishes
        tokio::select! {
            result = &mut run => result,
            _ = tokio::signal::ctrl_c() => {
                orchestrator.stop_run();
                run.await
            }
        }
    };

    let state = orchestrator.get_state();
    drop(orchestrator);
    printer
        .await
        .map_err(|e| eyre!("Event printer failed: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    match result? {
        RunOutcome::Completed { .. } => {
            if !json {
                output::print_prompts(&state);
            }
            Ok(())
        }
        RunOutcome::AlreadyComplete => {
            if !json {
                println!("Artifacts already include prompts; nothing to do");
            }
            Ok(())
        }
        RunOutcome::Stopped { stage } => Err(eyre!("Run stopped during {stage}")),
        RunOutcome::Superseded => Err(eyre!("Run was superseded")),
    }
}
