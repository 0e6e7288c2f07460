//! Collaborator abstraction.
//!
//! This module provides the `StoryCollaborator` trait the orchestrator calls
//! for every generation step, and a deterministic offline implementation.

pub mod base;
pub mod offline;
pub mod screenplay;

pub use base::{
    BreakdownRequest, CallContext, CollaboratorError, OutlineRequest, PromptRequest,
    ScriptRequest, StoryCollaborator,
};
pub use offline::OfflineCollaborator;
