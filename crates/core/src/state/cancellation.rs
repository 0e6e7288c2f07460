//! Cooperative cancellation for a single run.

use tokio_util::sync::CancellationToken;

/// Stop flag polled by the orchestrator between units of work.
///
/// Requesting a stop never aborts a collaborator call in flight; the token
/// is handed to collaborators so they may finish early on their own.
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    token: CancellationToken,
}

impl CancellationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at its next check.
    pub fn request(&self) {
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token handed to collaborators through their call context.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
