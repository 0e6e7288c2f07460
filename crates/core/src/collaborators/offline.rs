//! Deterministic local collaborator.
//!
//! `OfflineCollaborator` produces plausible artifacts without any network
//! access. It backs the CLI rehearsal mode and gives tests a realistic
//! end-to-end collaborator. Script parsing is real; every other stage is
//! template-driven.

use crate::collaborators::base::{
    BreakdownRequest, CallContext, CollaboratorError, OutlineRequest, PromptRequest,
    ScriptRequest, StoryCollaborator,
};
use crate::collaborators::screenplay::parse_screenplay;
use async_trait::async_trait;
use serde_json::{json, Value};
use sk_protocol::{BreakdownItem, Outline, ParsedScript, PromptBatch};

const LOCATIONS: [(&str, &str, &str); 4] = [
    ("INT.", "MAIN ROOM", "DAY"),
    ("EXT.", "OPEN ROAD", "DUSK"),
    ("INT.", "HALLWAY", "NIGHT"),
    ("EXT.", "SHORELINE", "DAWN"),
];

const FRAMINGS: [&str; 3] = ["wide", "medium", "close-up"];

#[derive(Debug, Clone, Default)]
pub struct OfflineCollaborator;

impl OfflineCollaborator {
    pub fn new() -> Self {
        Self
    }
}

fn check(ctx: &CallContext) -> Result<(), CollaboratorError> {
    if ctx.is_cancelled() {
        Err(CollaboratorError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl StoryCollaborator for OfflineCollaborator {
    async fn generate_outline(
        &self,
        request: &OutlineRequest,
        ctx: &CallContext,
    ) -> Result<Outline, CollaboratorError> {
        check(ctx)?;
        let act_count = request.act_count.max(1);
        let act_seconds = request.target_duration / act_count;

        let acts: Vec<Value> = (1..=act_count)
            .map(|n| {
                let beat = match n {
                    1 => "setup",
                    n if n == act_count => "resolution",
                    _ => "confrontation",
                };
                json!({
                    "number": n,
                    "title": format!("Act {n}"),
                    "beat": beat,
                    "summary": format!("{} ({beat})", request.concept),
                    "target_seconds": act_seconds,
                })
            })
            .collect();

        Ok(json!({
            "logline": request.concept,
            "genre": request.genre,
            "acts": acts,
        }))
    }

    async fn generate_script(
        &self,
        request: &ScriptRequest,
        ctx: &CallContext,
    ) -> Result<String, CollaboratorError> {
        check(ctx)?;
        let acts = request
            .outline
            .get("acts")
            .and_then(Value::as_array)
            .ok_or_else(|| CollaboratorError::InvalidResponse("outline has no acts".to_string()))?;

        let mut script = String::new();
        for (idx, act) in acts.iter().enumerate() {
            let (prefix, location, time) = LOCATIONS[idx % LOCATIONS.len()];
            let summary = act
                .get("summary")
                .and_then(Value::as_str)
                .unwrap_or("The story continues");
            script.push_str(&format!("{prefix} {location} - {time}\n\n"));
            script.push_str(&format!("{summary}.\n\n"));
            script.push_str(&format!(
                "The {} mood settles over the {}.\n\n",
                request.genre,
                location.to_lowercase()
            ));
        }
        Ok(script)
    }

    async fn parse_script(
        &self,
        script: &str,
        ctx: &CallContext,
    ) -> Result<ParsedScript, CollaboratorError> {
        check(ctx)?;
        Ok(parse_screenplay(script))
    }

    async fn generate_breakdown(
        &self,
        request: &BreakdownRequest,
        ctx: &CallContext,
    ) -> Result<BreakdownItem, CollaboratorError> {
        check(ctx)?;
        let max_shots = request.pace.max_shots_per_scene as usize;
        let shots: Vec<Value> = request
            .scene_text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .take(max_shots)
            .enumerate()
            .map(|(idx, paragraph)| {
                json!({
                    "number": idx + 1,
                    "framing": FRAMINGS[idx % FRAMINGS.len()],
                    "description": paragraph.replace('\n', " "),
                    "duration": request.pace.shot_duration,
                })
            })
            .collect();

        Ok(json!({
            "sceneIndex": request.scene_index,
            "heading": request.heading.slug,
            "suggestedShots": shots,
        }))
    }

    async fn generate_prompts(
        &self,
        request: &PromptRequest,
        ctx: &CallContext,
    ) -> Result<PromptBatch, CollaboratorError> {
        check(ctx)?;
        let cast = request
            .characters
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let prompts = request
            .shots
            .iter()
            .enumerate()
            .map(|(idx, shot)| {
                let framing = shot.get("framing").and_then(Value::as_str).unwrap_or("medium");
                let description = shot
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("establishing view");
                let mut text = format!(
                    "{} {} shot, {framing}: {description}. Setting: {}.",
                    request.style, request.genre, request.scene_heading
                );
                if !cast.is_empty() {
                    text.push_str(&format!(" Characters: {cast}."));
                }
                json!({ "shot": idx + 1, "text": text })
            })
            .collect();

        Ok(PromptBatch::Wrapped { prompts })
    }
}
