//! Creative brief models.
//!
//! A [`RunConfig`] is the input to a pipeline run. Briefs are usually
//! written as YAML files under `.storyboard-kit/briefs/`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Shot duration used when a brief does not set one, in seconds.
pub const DEFAULT_SHOT_DURATION_SECS: u32 = 5;

/// Number of acts requested from the outline generator by default.
pub const DEFAULT_ACT_COUNT: u32 = 3;

/// Editing pace requested for the breakdown.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    #[default]
    Medium,
    Fast,
}

/// Pace parameters handed to the breakdown generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
pub struct PaceConfig {
    pub pace: Pace,
    /// Target length of a single shot, in seconds.
    pub shot_duration: u32,
    /// Upper bound on shots the generator should suggest per scene.
    pub max_shots_per_scene: u32,
}

impl PaceConfig {
    pub fn new(pace: Pace, shot_duration: u32) -> Self {
        let max_shots_per_scene = match pace {
            Pace::Slow => 4,
            Pace::Medium => 6,
            Pace::Fast => 10,
        };
        Self {
            pace,
            shot_duration,
            max_shots_per_scene,
        }
    }
}

/// Content policy forwarded to every generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum ContentPolicy {
    #[default]
    Standard,
    Mature,
}

/// A recurring character the prompt generator should keep consistent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The creative brief driving a run.
///
/// # Example
///
/// ```yaml
/// concept: "A lonely lighthouse keeper"
/// genre: drama
/// style: cinematic
/// pace: slow
/// target_duration: 180
/// shot_duration: 4
/// characters:
///   - name: Elias
///     description: weathered keeper in his sixties
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(default)]
pub struct RunConfig {
    /// One-line creative concept.
    pub concept: String,

    /// Bypass mode: skip concept/outline/script and use `provided_script`.
    pub use_provided_script: bool,

    /// Pre-authored screenplay, required when `use_provided_script` is set.
    pub provided_script: Option<String>,

    pub genre: String,
    pub style: String,
    pub pace: Pace,

    /// Target running time of the finished piece, in seconds.
    pub target_duration: u32,

    /// Per-shot duration in seconds; `None` falls back to
    /// [`DEFAULT_SHOT_DURATION_SECS`].
    pub shot_duration: Option<u32>,

    pub act_count: u32,
    pub content_policy: ContentPolicy,
    pub characters: Vec<Character>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concept: String::new(),
            use_provided_script: false,
            provided_script: None,
            genre: "drama".to_string(),
            style: "cinematic".to_string(),
            pace: Pace::default(),
            target_duration: 120,
            shot_duration: None,
            act_count: DEFAULT_ACT_COUNT,
            content_policy: ContentPolicy::default(),
            characters: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Brief with the given concept and genre, everything else defaulted.
    pub fn new(concept: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            genre: genre.into(),
            ..Self::default()
        }
    }

    /// Switch the brief to bypass mode with the given screenplay.
    pub fn with_provided_script(mut self, script: impl Into<String>) -> Self {
        self.use_provided_script = true;
        self.provided_script = Some(script.into());
        self
    }

    /// Effective per-shot duration.
    pub fn effective_shot_duration(&self) -> u32 {
        self.shot_duration.unwrap_or(DEFAULT_SHOT_DURATION_SECS)
    }

    pub fn pace_config(&self) -> PaceConfig {
        PaceConfig::new(self.pace, self.effective_shot_duration())
    }

    /// The pre-authored script when bypass mode is on and it is non-blank.
    pub fn bypass_script(&self) -> Option<&str> {
        if !self.use_provided_script {
            return None;
        }
        self.provided_script
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_duration_default() {
        let config = RunConfig::new("A lonely lighthouse keeper", "drama");
        assert_eq!(config.effective_shot_duration(), 5);

        let config = RunConfig {
            shot_duration: Some(8),
            ..config
        };
        assert_eq!(config.effective_shot_duration(), 8);
    }

    #[test]
    fn test_bypass_script_requires_flag_and_content() {
        let config = RunConfig::new("c", "drama");
        assert!(config.bypass_script().is_none());

        let config = config.with_provided_script("   ");
        assert!(config.bypass_script().is_none());

        let config = RunConfig::new("c", "drama").with_provided_script("INT. ROOM - DAY");
        assert_eq!(config.bypass_script(), Some("INT. ROOM - DAY"));
    }

    #[test]
    fn test_pace_config_scales_with_pace() {
        assert!(
            PaceConfig::new(Pace::Fast, 5).max_shots_per_scene
                > PaceConfig::new(Pace::Slow, 5).max_shots_per_scene
        );
    }
}
