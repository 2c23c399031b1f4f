//! Error types for hooktape.
//!
//! All errors are strongly typed using thiserror. Every variant is fatal to
//! the invocation that raised it: nothing is retried and nothing is silently
//! recovered, the error travels back to the caller of the wrapped function.

use thiserror::Error;

use crate::slot::SlotKind;

/// Top-level error type for hook evaluation and harness control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// A hook was called while no tape is active.
    #[error("Hook called outside of a wrapped function")]
    OutOfContext,

    /// The dispatcher reports an active context but has no tape bound.
    #[error("Dispatcher is active but no tape is bound")]
    ReaderViolation,

    /// The slot at the cursor holds a different kind than the calling hook expects.
    ///
    /// This means hook call order changed between invocations.
    #[error("Payload mismatch at position {position}: found {actual}, expected {expected}")]
    PayloadMismatch {
        actual: SlotKind,
        expected: SlotKind,
        position: usize,
    },

    /// The slot kind matched but the stored value has another Rust type.
    #[error("Slot {kind} at position {position} does not hold a value of type {expected}")]
    ValueTypeMismatch {
        kind: SlotKind,
        position: usize,
        expected: &'static str,
    },

    /// A wrapped function was called again from inside its own body.
    #[error("Wrapped function re-entered itself")]
    RecursiveCall,

    /// State setters kept requesting passes past the configured limit.
    #[error("Re-invocation limit exceeded: {limit} passes each requested another pass")]
    ReinvocationLimit {
        limit: usize,
    },

    /// Teardown was requested while the wrapped function was running.
    #[error("Teardown requested while the wrapped function is running")]
    TeardownWhileRunning,

    /// The harness configuration could not be parsed or is invalid.
    #[error("Invalid harness config: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl HookError {
    /// Creates a payload mismatch error.
    #[must_use]
    pub const fn mismatch(actual: SlotKind, expected: SlotKind, position: usize) -> Self {
        Self::PayloadMismatch {
            actual,
            expected,
            position,
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns true if this error was raised by a hook called outside any context.
    #[must_use]
    pub const fn is_out_of_context(&self) -> bool {
        matches!(self, Self::OutOfContext)
    }

    /// Returns true if this error signals a change in hook call order.
    #[must_use]
    pub const fn is_order_violation(&self) -> bool {
        matches!(self, Self::PayloadMismatch { .. } | Self::ValueTypeMismatch { .. })
    }

    /// Returns true if this error is an internal invariant breach.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::ReaderViolation)
    }
}

/// Result type alias for hook operations.
pub type HookResult<T> = Result<T, HookError>;
