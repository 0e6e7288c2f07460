//! # sk-core
//!
//! Core storyboard pipeline orchestration for storyboard-kit.
//!
//! This crate provides:
//! - Configuration loading from the `.storyboard-kit/` directory
//! - The collaborator abstraction and an offline implementation
//! - The pipeline orchestrator
//! - Run state management, resume planning and cancellation
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`collaborators`]: Generation collaborator trait and implementations
//! - [`engine`]: Pipeline orchestrator
//! - [`state`]: Run state, planning, progress and cancellation

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod state;
