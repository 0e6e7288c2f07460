//! Configuration models that aggregate all settings.
//!
//! This module provides the orchestrator [`Settings`] and the unified
//! [`AppConfig`] that combines them with the named briefs found on disk.

use crate::state::progress::SCENE_LABEL_MAX_CHARS;
use serde::{Deserialize, Serialize};
use sk_protocol::RunConfig;
use std::collections::BTreeMap;
use std::time::Duration;

/// Orchestrator tuning from `.storyboard-kit/config.toml`.
///
/// # Example
///
/// ```toml
/// # .storyboard-kit/config.toml
/// concept_delay_ms = 250
/// label_max_chars = 32
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Pause between marking `concept` in progress and complete.
    pub concept_delay_ms: u64,

    /// Maximum length of a fan-out progress label, in characters.
    pub label_max_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concept_delay_ms: 500,
            label_max_chars: SCENE_LABEL_MAX_CHARS,
        }
    }
}

impl Settings {
    /// Settings with no concept delay, for tests and batch use.
    pub fn immediate() -> Self {
        Self {
            concept_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn concept_delay(&self) -> Duration {
        Duration::from_millis(self.concept_delay_ms)
    }
}

/// Unified application configuration loaded from `.storyboard-kit/`.
///
/// - `config.toml`: orchestrator settings
/// - `briefs/*.yaml`: named creative briefs, keyed by file stem
///
/// # Example
///
/// ```rust,no_run
/// use sk_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} briefs", config.briefs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub settings: Settings,
    pub briefs: BTreeMap<String, RunConfig>,
}
