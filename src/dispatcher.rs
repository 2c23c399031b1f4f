//! Stack of active tapes.
//!
//! Hooks find their tape through the dispatcher instead of an explicit
//! argument. The stack is thread-local: there is exactly one dispatcher per
//! OS thread, and tapes are `!Send`, so a tape can only ever be active on the
//! thread that created it.
//!
//! Prefer [`DispatchGuard`] over the raw [`push`]/[`pop`] pair. The guard pops
//! on drop, which keeps the stack balanced on every exit path, including
//! early returns through `?`. A raw [`push`] left without its [`pop`] keeps a
//! stale tape active, so hooks called afterwards bind to it instead of failing
//! with `OutOfContext`; a guard dropped above such a tape removes it.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::warn;

use crate::tape::SharedTape;

thread_local! {
    static STACK: RefCell<Vec<SharedTape>> = const { RefCell::new(Vec::new()) };
}

/// Makes `tape` the active tape, keeping the previous one beneath it.
///
/// Every `push` must be matched by a [`pop`] on the same thread.
pub fn push(tape: SharedTape) {
    STACK.with(|stack| stack.borrow_mut().push(tape));
}

/// Removes the active tape, restoring the one beneath it.
pub fn pop() -> Option<SharedTape> {
    STACK.with(|stack| stack.borrow_mut().pop())
}

/// True iff any tape is currently pushed.
#[must_use]
pub fn is_active() -> bool {
    STACK.with(|stack| !stack.borrow().is_empty())
}

/// The active tape, if any.
#[must_use]
pub fn current() -> Option<SharedTape> {
    STACK.with(|stack| stack.borrow().last().map(Rc::clone))
}

/// Number of nested active contexts.
#[must_use]
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Scoped activation of a tape.
///
/// # Example
///
/// ```
/// use hooktape::dispatcher::{self, DispatchGuard};
/// use hooktape::Tape;
///
/// assert!(!dispatcher::is_active());
/// {
///     let _guard = DispatchGuard::enter(Tape::shared());
///     assert!(dispatcher::is_active());
/// }
/// assert!(!dispatcher::is_active());
/// ```
#[must_use = "the tape is popped as soon as the guard is dropped"]
pub struct DispatchGuard {
    tape: SharedTape,
    _not_send: PhantomData<*const ()>,
}

impl DispatchGuard {
    /// Pushes `tape` and returns a guard that pops it on drop.
    pub fn enter(tape: SharedTape) -> Self {
        push(Rc::clone(&tape));
        Self {
            tape,
            _not_send: PhantomData,
        }
    }

    /// The tape this guard activated.
    #[must_use]
    pub fn tape(&self) -> &SharedTape {
        &self.tape
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        // Unwinds to this guard's own entry, removing tapes pushed above it
        // and left unpopped. Removed tapes drop outside the stack borrow.
        let removed = STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.iter().rposition(|t| Rc::ptr_eq(t, &self.tape)) {
                Some(index) => stack.split_off(index),
                None => Vec::new(),
            }
        });
        match removed.len() {
            0 => warn!("dispatch guard found its tape already popped"),
            1 => {}
            n => warn!(stale = n - 1, "removed tapes pushed without a matching pop"),
        }
    }
}
