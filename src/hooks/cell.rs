//! The mutable cell hook.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::HookResult;
use crate::slot::{Slot, SlotKind};

use super::protocol::{payload, Visit};

/// A box with one mutable field whose identity is stable across calls.
///
/// Writing `current` never requests another pass of the wrapped function.
pub struct MutableRef<T>(Rc<RefCell<T>>);

impl<T> MutableRef<T> {
    fn new(initial: T) -> Self {
        Self(Rc::new(RefCell::new(initial)))
    }

    /// Borrows the current value.
    #[must_use]
    pub fn current(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the current value.
    #[must_use]
    pub fn current_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replaces the current value, returning the old one.
    pub fn set(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// True if both handles point at the same box.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> MutableRef<T> {
    /// Clones the current value out.
    #[must_use]
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for MutableRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableRef").field("current", &self.0).finish()
    }
}

/// Returns the box stored at this position, creating it with `initial` on the
/// first call. Later calls ignore `initial`.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function,
/// and `HookError::PayloadMismatch` or `HookError::ValueTypeMismatch`
/// if the hook call order changed.
pub fn use_ref<T: 'static>(initial: T) -> HookResult<MutableRef<T>> {
    let visit = Visit::begin(1)?;
    let position = visit.position();

    let stored = visit.inspect(|tape| -> HookResult<Option<MutableRef<T>>> {
        let [slot] = tape.read::<1>();
        slot.map(|slot| payload::<MutableRef<T>>(slot, SlotKind::MutableRef, position).cloned())
            .transpose()
    })?;

    if let Some(cell) = stored {
        visit.skip();
        return Ok(cell);
    }

    let cell = MutableRef::new(initial);
    visit.commit([Slot::MutableRef(Box::new(cell.clone()))]);
    Ok(cell)
}
