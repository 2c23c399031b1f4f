//! The memo hook.

use crate::error::HookResult;
use crate::slot::{Slot, SlotKind};
use crate::value::Dep;

use super::protocol::{dependencies_changed, payload, stored_dependencies, Visit};

const MEMO_SLOTS: usize = 2;

/// Returns the value of `callback`, cached until the dependencies change.
///
/// On reuse the cached value is returned and `callback` is dropped without
/// running. `deps` of `None` recomputes on every call.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function,
/// `HookError::PayloadMismatch` if the memo or dependency slot holds another
/// kind, and `HookError::ValueTypeMismatch` if the cached value is not a `T`.
pub fn use_memo<T, F>(callback: F, deps: Option<Vec<Dep>>) -> HookResult<T>
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    let visit = Visit::begin(MEMO_SLOTS)?;
    let position = visit.position();

    let cached = visit.inspect(|tape| -> HookResult<Option<T>> {
        let [result, dependencies] = tape.read::<MEMO_SLOTS>();
        let Some(result) = result else {
            return Ok(None);
        };
        let value = payload::<T>(result, SlotKind::Memo, position)?;
        let previous = stored_dependencies(dependencies, SlotKind::MemoDependency, position + 1)?;
        Ok((!dependencies_changed(previous, deps.as_deref())).then(|| value.clone()))
    })?;

    if let Some(value) = cached {
        visit.skip();
        return Ok(value);
    }

    let value = callback();
    visit.commit([Slot::Memo(Box::new(value.clone())), Slot::MemoDependency(deps)]);
    Ok(value)
}
