//! The previous-value hook.

use crate::error::HookResult;
use crate::slot::{Slot, SlotKind};
use crate::value::SameValue;

use super::protocol::{payload, Visit};

/// `(older, newer)`; `older` is absent until the value first changes.
type Pair<T> = (Option<T>, T);

/// Returns the last distinct value seen at this position before `value`.
///
/// The first call returns `None`. When `value` is not the same value as the
/// one recorded last, the pair shifts and the recorded value is returned.
/// When it is the same, nothing shifts and the older recorded value is
/// returned again.
///
/// Sequence `a, b, b, c` yields `None, Some(a), Some(a), Some(b)`.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function,
/// and `HookError::PayloadMismatch` or `HookError::ValueTypeMismatch`
/// if the hook call order changed.
pub fn use_previous<T>(value: T) -> HookResult<Option<T>>
where
    T: SameValue + Clone + 'static,
{
    let visit = Visit::begin(1)?;
    let position = visit.position();

    let stored = visit.inspect(|tape| -> HookResult<Option<Pair<T>>> {
        let [slot] = tape.read::<1>();
        slot.map(|slot| payload::<Pair<T>>(slot, SlotKind::Previous, position).cloned())
            .transpose()
    })?;

    match stored {
        None => {
            visit.commit([Slot::Previous(Box::new((None::<T>, value)))]);
            Ok(None)
        }
        Some((older, newer)) if newer.same_value(&value) => {
            visit.skip();
            Ok(older)
        }
        Some((_, newer)) => {
            let previous = newer.clone();
            visit.commit([Slot::Previous(Box::new((Some(newer), value)))]);
            Ok(Some(previous))
        }
    }
}
