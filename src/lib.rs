//! # hooktape - hooks without a framework
//!
//! hooktape lets an ordinary function keep mutable state, memoized values and
//! managed side effects across repeated calls, with no rendering layer
//! around it.
//!
//! ## Core Concepts
//!
//! - **Tape**: per-function ordered memory of slots, addressed by hook call order
//! - **Dispatcher**: stack of active tapes, so wrapped functions can call each other
//! - **Hook protocol**: read, validate, decide, write, advance
//! - **Harness**: owns one tape, runs the function until its state settles
//!
//! Hooks must be called unconditionally and in the same order on every call;
//! a change in order is reported as [`HookError::PayloadMismatch`].
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use hooktape::{deps, use_effect, wrap};
//!
//! let printed = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&printed);
//!
//! let greet = wrap(move |msg: &&'static str| {
//!     let sink = Rc::clone(&sink);
//!     let msg = *msg;
//!     use_effect(move || {
//!         sink.borrow_mut().push(msg);
//!         None
//!     }, Some(deps![msg]))?;
//!     Ok(())
//! });
//!
//! for msg in ["a", "b", "a", "a"] {
//!     greet.call(&msg)?;
//! }
//! assert_eq!(*printed.borrow(), ["a", "b", "a"]);
//! # Ok::<(), hooktape::HookError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatcher;
pub mod error;
pub mod harness;
pub mod hooks;
pub mod slot;
pub mod tape;
pub mod timer;
pub mod value;

// Re-export primary types at crate root for convenience
pub use error::{HookError, HookResult};
pub use harness::{wrap, Harness, HarnessConfig};
pub use hooks::{
    use_constant, use_effect, use_memo, use_previous, use_ref, use_state, use_state_with,
    use_sync_effect, use_timeout, MutableRef, SetState,
};
pub use slot::{Cleanup, Slot, SlotKind};
pub use tape::{SharedTape, Tape};
pub use timer::{ManualTimers, TimerId, Timers};
pub use value::{Dep, SameValue};
