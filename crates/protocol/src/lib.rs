//! # sk-protocol
//!
//! Core protocol definitions and data models for storyboard-kit.
//!
//! This crate defines all shared data structures used for:
//! - Creative briefs (YAML/TOML run configuration)
//! - Pipeline stage status and run state snapshots
//! - Artifacts exchanged with generation collaborators
//! - Events streamed to presentation layers
//!
//! ## Modules
//!
//! - [`config_models`]: The creative brief and its defaults
//! - [`pipeline_models`]: Stage order, stage status, progress
//! - [`run_models`]: Run state aggregate and resume artifacts
//! - [`artifact_models`]: Outline, parsed script, breakdown and prompt payloads
//! - [`ipc`]: Events emitted while a run executes
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: snapshot types derive `TS` for front-end use
//! - Independent compilation: No dependencies on other storyboard-kit crates

pub mod artifact_models;
pub mod config_models;
pub mod ipc;
pub mod pipeline_models;
pub mod run_models;

// Re-export all public types for convenience
pub use artifact_models::*;
pub use config_models::*;
pub use ipc::*;
pub use pipeline_models::*;
pub use run_models::*;
