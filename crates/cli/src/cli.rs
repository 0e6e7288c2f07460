use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "storyboard")]
#[command(author, version, about = "Turn a story concept into shot-level generation prompts")]
pub struct Cli {
    /// Project root containing `.storyboard-kit/`
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline for a brief
    Run {
        /// Brief file (.yaml, .yml, .toml) or the name of a brief in
        /// `.storyboard-kit/briefs/`
        #[arg(short, long)]
        brief: String,

        /// Pre-authored screenplay; skips concept, outline and script
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Print the final run state as JSON instead of progress
        #[arg(long)]
        json: bool,
    },

    /// Continue a run from previously produced artifacts
    Resume {
        /// Brief file or named brief
        #[arg(short, long)]
        brief: String,

        /// Artifacts file (.json, .yaml, .yml)
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Print the final run state as JSON instead of progress
        #[arg(long)]
        json: bool,
    },

    /// Show where a resume would start without running anything
    Plan {
        /// Artifacts file (.json, .yaml, .yml)
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Assume the brief carries a pre-authored script
        #[arg(long)]
        bypass: bool,
    },
}
