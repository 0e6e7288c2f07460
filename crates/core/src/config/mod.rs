//! Configuration loading and management.
//!
//! This module provides functionality to load orchestrator settings and
//! creative briefs from the `.storyboard-kit/` directory structure.

pub mod error;
pub mod loader;
pub mod models;

pub use models::{AppConfig, Settings};
