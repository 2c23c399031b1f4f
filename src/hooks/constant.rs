//! The constant hook.

use crate::error::HookResult;
use crate::slot::{Slot, SlotKind};

use super::protocol::{payload, Visit};

/// Computes a value on the first call at this position and returns the
/// stored value on every later call. Nothing ever triggers recomputation.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function,
/// and `HookError::PayloadMismatch` or `HookError::ValueTypeMismatch`
/// if the hook call order changed.
pub fn use_constant<T, F>(supplier: F) -> HookResult<T>
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    let visit = Visit::begin(1)?;
    let position = visit.position();

    let stored = visit.inspect(|tape| -> HookResult<Option<T>> {
        let [slot] = tape.read::<1>();
        slot.map(|slot| payload::<T>(slot, SlotKind::Constant, position).cloned())
            .transpose()
    })?;

    if let Some(value) = stored {
        visit.skip();
        return Ok(value);
    }

    let value = supplier();
    visit.commit([Slot::Constant(Box::new(value.clone()))]);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::dispatcher::DispatchGuard;
    use crate::error::HookError;
    use crate::tape::{SharedTape, Tape};

    fn pass<R>(tape: &SharedTape, body: impl FnOnce() -> R) -> R {
        let _guard = DispatchGuard::enter(Rc::clone(tape));
        tape.borrow_mut().begin_pass();
        body()
    }

    #[test]
    fn test_computed_once() {
        let tape = Tape::shared();
        assert_eq!(pass(&tape, || use_constant(|| "first")), Ok("first"));
        assert_eq!(pass(&tape, || use_constant(|| "second")), Ok("first"));
    }

    #[test]
    fn test_shared_value_keeps_identity() {
        let tape = Tape::shared();
        let a = pass(&tape, || use_constant(|| Rc::new(5))).expect("constant");
        let b = pass(&tape, || use_constant(|| Rc::new(5))).expect("constant");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_outside_context() {
        assert_eq!(use_constant(|| 1), Err(HookError::OutOfContext));
    }
}
