//! Common test utilities shared by the orchestrator integration tests.
//!
//! This module provides:
//! - Test fixtures (briefs, scripts, artifacts)
//! - Custom assertions over run state and events
//! - Scripted and gated collaborators

pub mod assertions;
pub mod fixtures;
pub mod mock_collaborators;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_collaborators::*;
