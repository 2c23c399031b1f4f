//! Hooks: functions that keep state on the active tape between calls.
//!
//! Every hook occupies a fixed number of consecutive tape positions and must
//! be called unconditionally, in the same order, on every invocation of the
//! wrapped function. All hooks fail with [`HookError::OutOfContext`] when no
//! wrapped function is running.
//!
//! | Hook | Slots |
//! |---|---|
//! | [`use_state`] | `STATE`, `SET_STATE` |
//! | [`use_effect`] | `EFFECT` / `EFFECT_CLEANUP`, `EFFECT_DEPENDENCY` |
//! | [`use_sync_effect`] | `SYNC_EFFECT_CLEANUP`, `SYNC_EFFECT_DEPENDENCY` |
//! | [`use_memo`] | `MEMO`, `MEMO_DEPENDENCY` |
//! | [`use_constant`] | `CONSTANT` |
//! | [`use_ref`] | `MUTABLE_REF` |
//! | [`use_previous`] | `PREVIOUS` |
//! | [`use_timeout`] | same as [`use_sync_effect`] |
//!
//! [`HookError::OutOfContext`]: crate::HookError::OutOfContext

mod cell;
mod constant;
mod effect;
mod memo;
mod previous;
mod protocol;
mod state;
mod timeout;

pub use cell::{use_ref, MutableRef};
pub use constant::use_constant;
pub use effect::{use_effect, use_sync_effect};
pub use memo::use_memo;
pub use previous::use_previous;
pub use protocol::dependencies_changed;
pub use state::{use_state, use_state_with, SetState};
pub use timeout::use_timeout;
