//! The algorithm every hook follows against the active tape.
//!
//! read S slots at the cursor -> initialize if the primary slot is absent ->
//! otherwise validate its kind -> decide recompute or reuse -> write -> land
//! the cursor on `position + S`.
//!
//! No borrow of the tape is held while user callbacks run, so callbacks may
//! invoke state setters or other wrapped functions.

use std::any::type_name;

use crate::dispatcher;
use crate::error::{HookError, HookResult};
use crate::slot::{Slot, SlotKind};
use crate::tape::{SharedTape, Tape};
use crate::value::{Dep, SameValue};

/// One hook's visit to its slots on the active tape.
pub(crate) struct Visit {
    tape: SharedTape,
    position: usize,
    size: usize,
}

impl Visit {
    /// Binds to the active tape at its cursor.
    pub(crate) fn begin(size: usize) -> HookResult<Self> {
        if !dispatcher::is_active() {
            return Err(HookError::OutOfContext);
        }
        let tape = dispatcher::current().ok_or(HookError::ReaderViolation)?;
        let position = tape.borrow().position();
        Ok(Self {
            tape,
            position,
            size,
        })
    }

    pub(crate) const fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn tape(&self) -> &SharedTape {
        &self.tape
    }

    /// Runs `f` with a shared borrow of the tape, cursor at this hook's position.
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&Tape) -> R) -> R {
        f(&self.tape.borrow())
    }

    /// Runs `f` with an exclusive borrow of the tape.
    pub(crate) fn modify<R>(&self, f: impl FnOnce(&mut Tape) -> R) -> R {
        f(&mut self.tape.borrow_mut())
    }

    /// Writes this hook's slots and moves the cursor past them.
    ///
    /// The replaced slots are dropped after the tape borrow is released, so a
    /// payload whose `Drop` calls back into the harness sees a free tape.
    pub(crate) fn commit(self, slots: impl IntoIterator<Item = Slot>) {
        let displaced = {
            let mut tape = self.tape.borrow_mut();
            tape.seek(self.position);
            let displaced = tape.write(slots);
            tape.seek(self.position + self.size);
            displaced
        };
        drop(displaced);
    }

    /// Moves the cursor past this hook's slots without writing.
    pub(crate) fn skip(self) {
        self.tape.borrow_mut().seek(self.position + self.size);
    }
}

/// Fails with a payload mismatch unless `slot` has the expected kind.
pub(crate) fn expect_kind(slot: &Slot, expected: SlotKind, position: usize) -> HookResult<()> {
    let actual = slot.kind();
    if actual == expected {
        Ok(())
    } else {
        Err(HookError::mismatch(actual, expected, position))
    }
}

/// Borrows the typed payload of a slot of the expected kind.
pub(crate) fn payload<'a, T: 'static>(
    slot: &'a Slot,
    expected: SlotKind,
    position: usize,
) -> HookResult<&'a T> {
    expect_kind(slot, expected, position)?;
    slot.payload()
        .and_then(|value| value.downcast_ref::<T>())
        .ok_or(HookError::ValueTypeMismatch {
            kind: expected,
            position,
            expected: type_name::<T>(),
        })
}

/// Reads the stored dependency list of a dependency slot.
///
/// Returns `None` both when the slot is absent and when the stored list was
/// absent; either way the hook recomputes.
pub(crate) fn stored_dependencies(
    slot: Option<&Slot>,
    expected: SlotKind,
    position: usize,
) -> HookResult<Option<&[Dep]>> {
    match slot {
        None => Ok(None),
        Some(slot) => {
            expect_kind(slot, expected, position)?;
            Ok(slot.dependencies().flatten())
        }
    }
}

/// The dependency-diff rule.
///
/// Recompute when either list is absent, when the lengths differ, or when any
/// paired element is not the same value.
///
/// ```
/// use hooktape::{deps, hooks::dependencies_changed};
///
/// let before = deps![1, "a"];
/// assert!(!dependencies_changed(Some(before.as_slice()), Some(deps![1, "a"].as_slice())));
/// assert!(dependencies_changed(Some(before.as_slice()), Some(deps![1, "b"].as_slice())));
/// assert!(dependencies_changed(Some(before.as_slice()), Some(deps![1].as_slice())));
/// assert!(dependencies_changed(Some(before.as_slice()), None));
/// assert!(dependencies_changed(None, Some(before.as_slice())));
/// ```
#[must_use]
pub fn dependencies_changed(previous: Option<&[Dep]>, next: Option<&[Dep]>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => {
            previous.len() != next.len()
                || previous.iter().zip(next).any(|(a, b)| !a.same_value(b))
        }
        _ => true,
    }
}
