//! Error types for the session layer.

use crate::SessionState;

/// Errors that can occur while changing the session's role or state.
///
/// None of these reach the public command surface of the controller; they
/// are logged there and turned into status messages.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The network backend could not start hosting or dialing.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },
}

impl SessionError {
    /// Wraps any backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
