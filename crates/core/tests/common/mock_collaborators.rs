//! Mock collaborators for deterministic testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use sk_core::collaborators::screenplay::parse_screenplay;
use sk_core::collaborators::{
    BreakdownRequest, CallContext, CollaboratorError, OutlineRequest, PromptRequest,
    ScriptRequest, StoryCollaborator,
};
use sk_protocol::{BreakdownItem, Outline, ParsedScript, PipelineStage, PromptBatch};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A collaborator whose outputs are fully determined by its fields.
///
/// The script has one scene per entry of `shot_counts`, and the breakdown of
/// scene `i` carries `shot_counts[i]` shots.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedCollaborator {
    pub shot_counts: Vec<usize>,
    /// Stage whose collaborator call fails.
    pub fail_stage: Option<PipelineStage>,
    /// Scenes whose prompt generation fails.
    pub failing_prompt_scenes: HashSet<usize>,
    /// Every call, in order, as `"{stage}:{index}"` or `"{stage}"`.
    pub calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedCollaborator {
    pub fn new(shot_counts: &[usize]) -> Self {
        Self {
            shot_counts: shot_counts.to_vec(),
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, stage: PipelineStage) -> Self {
        self.fail_stage = Some(stage);
        self
    }

    pub fn failing_prompts_for(mut self, scene_index: usize) -> Self {
        self.failing_prompt_scenes.insert(scene_index);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Calls made for `stage`.
    pub fn calls_for(&self, stage: PipelineStage) -> Vec<String> {
        let prefix = stage.as_str();
        self.calls()
            .into_iter()
            .filter(|call| call.split(':').next() == Some(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn fail_if(&self, stage: PipelineStage) -> Result<(), CollaboratorError> {
        if self.fail_stage == Some(stage) {
            return Err(CollaboratorError::ApiError(format!("{stage} quota exceeded")));
        }
        Ok(())
    }

    pub fn script(&self) -> String {
        (0..self.shot_counts.len())
            .map(|idx| format!("INT. ROOM {idx} - DAY\n\nBeat {idx}.\n\n"))
            .collect()
    }
}

#[async_trait]
impl StoryCollaborator for ScriptedCollaborator {
    async fn generate_outline(
        &self,
        request: &OutlineRequest,
        _ctx: &CallContext,
    ) -> Result<Outline, CollaboratorError> {
        self.record("outline".to_string());
        self.fail_if(PipelineStage::Outline)?;
        let acts: Vec<Value> = (1..=request.act_count)
            .map(|n| json!({ "act": n, "summary": request.concept }))
            .collect();
        Ok(json!({ "acts": acts }))
    }

    async fn generate_script(
        &self,
        _request: &ScriptRequest,
        _ctx: &CallContext,
    ) -> Result<String, CollaboratorError> {
        self.record("script".to_string());
        self.fail_if(PipelineStage::Script)?;
        Ok(self.script())
    }

    async fn parse_script(
        &self,
        script: &str,
        _ctx: &CallContext,
    ) -> Result<ParsedScript, CollaboratorError> {
        self.record("parse".to_string());
        Ok(parse_screenplay(script))
    }

    async fn generate_breakdown(
        &self,
        request: &BreakdownRequest,
        _ctx: &CallContext,
    ) -> Result<BreakdownItem, CollaboratorError> {
        self.record(format!("breakdown:{}", request.scene_index));
        self.fail_if(PipelineStage::Breakdown)?;
        let count = self
            .shot_counts
            .get(request.scene_index)
            .copied()
            .unwrap_or(1);
        let shots: Vec<Value> = (0..count)
            .map(|n| json!({ "shot": n, "framing": "wide" }))
            .collect();
        Ok(json!({ "heading": request.heading.slug, "suggestedShots": shots }))
    }

    async fn generate_prompts(
        &self,
        request: &PromptRequest,
        _ctx: &CallContext,
    ) -> Result<PromptBatch, CollaboratorError> {
        self.record(format!("prompts:{}", request.scene_index));
        if self.failing_prompt_scenes.contains(&request.scene_index) {
            return Err(CollaboratorError::InvalidResponse(
                "unparseable prompt list".to_string(),
            ));
        }
        let prompts = request
            .shots
            .iter()
            .map(|shot| json!({ "text": format!("{} {}", request.scene_heading, shot["shot"]) }))
            .collect();
        Ok(PromptBatch::Wrapped { prompts })
    }
}

/// Wraps a [`ScriptedCollaborator`] and parks one call until released.
///
/// The first call for `pause_stage` (and `pause_index` for fan-out stages)
/// signals `reached` and then waits for `release` before returning.
#[allow(dead_code)]
pub struct GatedCollaborator {
    pub inner: Arc<ScriptedCollaborator>,
    pub pause_stage: PipelineStage,
    pub pause_index: usize,
    pub reached: Arc<Notify>,
    pub release: Arc<Notify>,
    paused: AtomicBool,
}

#[allow(dead_code)]
impl GatedCollaborator {
    pub fn new(inner: ScriptedCollaborator, pause_stage: PipelineStage, pause_index: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            pause_stage,
            pause_index,
            reached: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            paused: AtomicBool::new(false),
        }
    }

    async fn maybe_pause(&self, stage: PipelineStage, index: usize) {
        if stage != self.pause_stage || index != self.pause_index {
            return;
        }
        if self.paused.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reached.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl StoryCollaborator for GatedCollaborator {
    async fn generate_outline(
        &self,
        request: &OutlineRequest,
        ctx: &CallContext,
    ) -> Result<Outline, CollaboratorError> {
        let result = self.inner.generate_outline(request, ctx).await;
        self.maybe_pause(PipelineStage::Outline, 0).await;
        result
    }

    async fn generate_script(
        &self,
        request: &ScriptRequest,
        ctx: &CallContext,
    ) -> Result<String, CollaboratorError> {
        let result = self.inner.generate_script(request, ctx).await;
        self.maybe_pause(PipelineStage::Script, 0).await;
        result
    }

    async fn parse_script(
        &self,
        script: &str,
        ctx: &CallContext,
    ) -> Result<ParsedScript, CollaboratorError> {
        self.inner.parse_script(script, ctx).await
    }

    async fn generate_breakdown(
        &self,
        request: &BreakdownRequest,
        ctx: &CallContext,
    ) -> Result<BreakdownItem, CollaboratorError> {
        let result = self.inner.generate_breakdown(request, ctx).await;
        self.maybe_pause(PipelineStage::Breakdown, request.scene_index)
            .await;
        result
    }

    async fn generate_prompts(
        &self,
        request: &PromptRequest,
        ctx: &CallContext,
    ) -> Result<PromptBatch, CollaboratorError> {
        let result = self.inner.generate_prompts(request, ctx).await;
        self.maybe_pause(PipelineStage::Prompts, request.scene_index)
            .await;
        result
    }
}
