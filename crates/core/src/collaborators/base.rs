//! Base collaborator trait and supporting types.
//!
//! The orchestrator never generates content itself. Every stage delegates to
//! a [`StoryCollaborator`], which is free to call a remote model, a local
//! heuristic, or a test double.

use async_trait::async_trait;
use sk_protocol::{
    BreakdownItem, Character, ContentPolicy, Outline, PaceConfig, ParsedScript, PromptBatch,
    RunConfig, SceneHeading, Shot,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Context threaded through every collaborator call.
///
/// The cancellation token is cooperative: a collaborator may watch it and
/// return [`CollaboratorError::Cancelled`] early, but the orchestrator never
/// aborts a call that is already in flight.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub run_id: Uuid,
    pub cancellation: CancellationToken,
}

impl CallContext {
    pub fn new(run_id: Uuid, cancellation: CancellationToken) -> Self {
        Self {
            run_id,
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRequest {
    pub concept: String,
    pub genre: String,
    pub act_count: u32,
    /// Seconds.
    pub target_duration: u32,
    pub content_policy: ContentPolicy,
}

impl OutlineRequest {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            concept: config.concept.clone(),
            genre: config.genre.clone(),
            act_count: config.act_count,
            target_duration: config.target_duration,
            content_policy: config.content_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    pub outline: Outline,
    pub genre: String,
    pub style: String,
    pub content_policy: ContentPolicy,
}

impl ScriptRequest {
    pub fn new(outline: Outline, config: &RunConfig) -> Self {
        Self {
            outline,
            genre: config.genre.clone(),
            style: config.style.clone(),
            content_policy: config.content_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRequest {
    pub scene_index: usize,
    pub heading: SceneHeading,
    pub scene_text: String,
    pub genre: String,
    pub pace: PaceConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub scene_index: usize,
    pub shots: Vec<Shot>,
    pub scene_heading: String,
    pub genre: String,
    pub style: String,
    pub content_policy: ContentPolicy,
    /// Seconds per shot.
    pub shot_duration: u32,
    pub characters: Vec<Character>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Collaborator not available: {0}")]
    NotAvailable(String),
    #[error("API call failed: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Execution failed: {0}")]
    ExecutionError(String),
    #[error("Cancelled")]
    Cancelled,
}

/// The five generation operations the orchestrator drives.
#[async_trait]
pub trait StoryCollaborator: Send + Sync {
    async fn generate_outline(
        &self,
        request: &OutlineRequest,
        ctx: &CallContext,
    ) -> Result<Outline, CollaboratorError>;

    async fn generate_script(
        &self,
        request: &ScriptRequest,
        ctx: &CallContext,
    ) -> Result<String, CollaboratorError>;

    /// Split a screenplay into index-aligned scene headings and texts.
    async fn parse_script(
        &self,
        script: &str,
        ctx: &CallContext,
    ) -> Result<ParsedScript, CollaboratorError>;

    async fn generate_breakdown(
        &self,
        request: &BreakdownRequest,
        ctx: &CallContext,
    ) -> Result<BreakdownItem, CollaboratorError>;

    async fn generate_prompts(
        &self,
        request: &PromptRequest,
        ctx: &CallContext,
    ) -> Result<PromptBatch, CollaboratorError>;
}
