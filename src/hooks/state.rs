//! The state hook.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::error::HookResult;
use crate::slot::{Slot, SlotKind};
use crate::tape::Tape;

use super::protocol::{payload, Visit};

const STATE_SLOTS: usize = 2;

/// Writes a new value into the state slot it was created for.
///
/// A setter is bound to one fixed tape position and does not re-run the
/// wrapped function itself: it overwrites the state and records that another
/// pass is wanted. The harness honours the request at the end of the current
/// pass (or on the next call when the setter runs between calls).
///
/// Writes are never suppressed, even when the new value is the same as the
/// old one.
pub struct SetState<T> {
    tape: Weak<RefCell<Tape>>,
    index: usize,
    _value: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            tape: Weak::clone(&self.tape),
            index: self.index,
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState").field("index", &self.index).finish()
    }
}

impl<T: 'static> SetState<T> {
    /// Replaces the state.
    pub fn set(&self, value: T) {
        self.update(|_| value);
    }

    /// Replaces the state with the result of `transform` applied to the
    /// current value on the tape.
    pub fn update(&self, transform: impl FnOnce(&T) -> T) {
        let Some(tape) = self.tape.upgrade() else {
            warn!(index = self.index, "state setter outlived its harness; write ignored");
            return;
        };

        // Keep the tape unborrowed while `transform` runs and while replaced
        // values drop.
        let taken = tape.borrow_mut().take_at(self.index);
        let current = match taken {
            Some(Slot::State(value)) => value,
            other => {
                if let Some(slot) = other {
                    let displaced = tape.borrow_mut().write_at(self.index, slot);
                    drop(displaced);
                }
                warn!(index = self.index, "state slot is gone; write ignored");
                return;
            }
        };

        let next: Box<dyn std::any::Any> = match current.downcast_ref::<T>() {
            Some(value) => Box::new(transform(value)),
            None => {
                let displaced = tape.borrow_mut().write_at(self.index, Slot::State(current));
                drop(displaced);
                warn!(index = self.index, "state slot holds another type; write ignored");
                return;
            }
        };

        let displaced = {
            let mut tape = tape.borrow_mut();
            tape.request_rerun();
            tape.write_at(self.index, Slot::State(next))
        };
        drop(displaced);
        drop(current);
    }

    /// Tape position of the state this setter writes.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Returns the current state and its setter, seeding the state with
/// `initial` on the first call.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function,
/// and `HookError::PayloadMismatch` or `HookError::ValueTypeMismatch`
/// if the hook call order changed.
pub fn use_state<T: Clone + 'static>(initial: T) -> HookResult<(T, SetState<T>)> {
    use_state_with(move || initial)
}

/// Like [`use_state`], computing the initial value lazily.
///
/// `init` runs only on the first call at this position.
///
/// # Errors
///
/// Same as [`use_state`].
pub fn use_state_with<T, F>(init: F) -> HookResult<(T, SetState<T>)>
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    let visit = Visit::begin(STATE_SLOTS)?;
    let position = visit.position();

    let existing = visit.inspect(|tape| -> HookResult<Option<(T, Option<SetState<T>>)>> {
        let [state, setter] = tape.read::<STATE_SLOTS>();
        let Some(state) = state else {
            return Ok(None);
        };
        let value = payload::<T>(state, SlotKind::State, position)?.clone();
        let setter = match setter {
            Some(slot) => Some(payload::<SetState<T>>(slot, SlotKind::SetState, position + 1)?.clone()),
            None => None,
        };
        Ok(Some((value, setter)))
    })?;

    match existing {
        Some((value, Some(setter))) => {
            visit.skip();
            Ok((value, setter))
        }
        Some((value, None)) => {
            let setter = bind_setter(&visit, position);
            visit.commit([
                Slot::State(Box::new(value.clone())),
                Slot::SetState(Box::new(setter.clone())),
            ]);
            Ok((value, setter))
        }
        None => {
            let value = init();
            let setter = bind_setter(&visit, position);
            visit.commit([
                Slot::State(Box::new(value.clone())),
                Slot::SetState(Box::new(setter.clone())),
            ]);
            Ok((value, setter))
        }
    }
}

fn bind_setter<T>(visit: &Visit, index: usize) -> SetState<T> {
    SetState {
        tape: Rc::downgrade(visit.tape()),
        index,
        _value: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchGuard;
    use crate::error::HookError;

    fn pass<R>(tape: &Rc<RefCell<Tape>>, body: impl FnOnce() -> R) -> R {
        let _guard = DispatchGuard::enter(Rc::clone(tape));
        tape.borrow_mut().begin_pass();
        body()
    }

    #[test]
    fn test_initial_value_then_persisted() {
        let tape = Tape::shared();
        let (value, set) = pass(&tape, || use_state(1u32)).expect("state");
        assert_eq!(value, 1);

        set.set(5);
        let (value, _) = pass(&tape, || use_state(1u32)).expect("state");
        assert_eq!(value, 5);
    }

    #[test]
    fn test_lazy_init_runs_once() {
        let tape = Tape::shared();
        let mut runs = 0;
        for _ in 0..3 {
            pass(&tape, || {
                use_state_with(|| {
                    runs += 1;
                    String::from("x")
                })
            })
            .expect("state");
        }
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_update_sees_latest_value() {
        let tape = Tape::shared();
        let (_, set) = pass(&tape, || use_state(0i32)).expect("state");
        set.update(|v| v + 1);
        set.update(|v| v + 1);
        let (value, _) = pass(&tape, || use_state(0i32)).expect("state");
        assert_eq!(value, 2);
    }

    #[test]
    fn test_same_value_write_still_requests_rerun() {
        let tape = Tape::shared();
        let (_, set) = pass(&tape, || use_state(3u8)).expect("state");
        assert!(!tape.borrow_mut().take_rerun_request());
        set.set(3);
        assert!(tape.borrow_mut().take_rerun_request());
    }

    #[test]
    fn test_setter_identity_is_stable() {
        let tape = Tape::shared();
        let (_, first) = pass(&tape, || use_state(0u8)).expect("state");
        let (_, second) = pass(&tape, || use_state(0u8)).expect("state");
        assert_eq!(first.index(), second.index());
    }

    #[test]
    fn test_setter_after_tape_dropped_is_noop() {
        let tape = Tape::shared();
        let (_, set) = pass(&tape, || use_state(0u8)).expect("state");
        drop(tape);
        set.set(1);
    }

    #[test]
    fn test_setter_after_reset_is_noop() {
        let tape = Tape::shared();
        let (_, set) = pass(&tape, || use_state(0u8)).expect("state");
        tape.borrow_mut().reset();
        set.set(1);
        assert!(tape.borrow().is_empty());
        assert!(!tape.borrow_mut().take_rerun_request());
    }

    #[test]
    fn test_type_change_at_position() {
        let tape = Tape::shared();
        pass(&tape, || use_state(0u8)).expect("state");
        let err = pass(&tape, || use_state(String::new())).expect_err("type changed");
        assert!(matches!(err, HookError::ValueTypeMismatch { kind: SlotKind::State, .. }));
    }

    #[test]
    fn test_cursor_advances_by_two() {
        let tape = Tape::shared();
        pass(&tape, || {
            use_state(0u8).expect("first");
            use_state(0u8).expect("second");
        });
        assert_eq!(tape.borrow().position(), 4);
        assert_eq!(tape.borrow().len(), 4);
    }
}
