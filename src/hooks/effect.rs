//! Effect hooks.
//!
//! Both variants own a cleanup slot and a dependency slot. When the
//! dependency-diff rule says recompute, the previous disposer runs first and
//! only then is the new callback set up. They differ in when the callback
//! runs:
//!
//! - [`use_sync_effect`] runs it at the call site.
//! - [`use_effect`] leaves it on the tape as an `EFFECT` slot; the harness runs
//!   scheduled effects in tape order once the wrapped function body returns.

use crate::error::{HookError, HookResult};
use crate::slot::{Cleanup, Slot, SlotKind};
use crate::value::Dep;

use super::protocol::{dependencies_changed, expect_kind, stored_dependencies, Visit};

const EFFECT_SLOTS: usize = 2;

/// What an effect hook found at its position.
enum Decision {
    Reuse,
    /// Recompute; the disposer of the previous run must be called first.
    Recompute(Option<Cleanup>),
}

fn decide(
    visit: &Visit,
    deps: Option<&[Dep]>,
    accepts: impl Fn(SlotKind) -> bool,
    cleanup_kind: SlotKind,
    dependency_kind: SlotKind,
) -> HookResult<Decision> {
    let position = visit.position();
    let recompute = visit.inspect(|tape| -> HookResult<bool> {
        let [primary, dependencies] = tape.read::<EFFECT_SLOTS>();
        let Some(primary) = primary else {
            return Ok(true);
        };
        if !accepts(primary.kind()) {
            return Err(HookError::mismatch(primary.kind(), cleanup_kind, position));
        }
        // A scheduled callback that never ran has nothing to compare against.
        if primary.kind() == SlotKind::Effect {
            if let Some(dependencies) = dependencies {
                expect_kind(dependencies, dependency_kind, position + 1)?;
            }
            return Ok(true);
        }
        let previous = stored_dependencies(dependencies, dependency_kind, position + 1)?;
        Ok(dependencies_changed(previous, deps))
    })?;

    if !recompute {
        return Ok(Decision::Reuse);
    }
    let cleanup = visit.modify(|tape| tape.read_at_mut(position).and_then(Slot::take_cleanup));
    Ok(Decision::Recompute(cleanup))
}

/// Runs `callback` after the wrapped function body returns, whenever the
/// dependencies change.
///
/// `deps` of `None` re-runs on every call; `Some(vec![])` runs once. The value
/// returned by `callback` is kept as the disposer of this run and is called
/// before the next run and on harness teardown.
///
/// # Errors
///
/// Returns `HookError::OutOfContext` when called outside a wrapped function.
/// Returns `HookError::PayloadMismatch` if either slot at this position
/// holds another kind, which means the hook call order changed.
pub fn use_effect<F>(callback: F, deps: Option<Vec<Dep>>) -> HookResult<()>
where
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    let visit = Visit::begin(EFFECT_SLOTS)?;
    let decision = decide(
        &visit,
        deps.as_deref(),
        |kind| matches!(kind, SlotKind::EffectCleanup | SlotKind::Effect),
        SlotKind::EffectCleanup,
        SlotKind::EffectDependency,
    )?;

    match decision {
        Decision::Reuse => visit.skip(),
        Decision::Recompute(previous) => {
            if let Some(previous) = previous {
                previous.run();
            }
            visit.commit([Slot::Effect(Box::new(callback)), Slot::EffectDependency(deps)]);
        }
    }
    Ok(())
}

/// Runs `callback` immediately whenever the dependencies change.
///
/// Same dependency and disposer semantics as [`use_effect`].
///
/// # Errors
///
/// Same as [`use_effect`].
pub fn use_sync_effect<F>(callback: F, deps: Option<Vec<Dep>>) -> HookResult<()>
where
    F: FnOnce() -> Option<Cleanup>,
{
    let visit = Visit::begin(EFFECT_SLOTS)?;
    let decision = decide(
        &visit,
        deps.as_deref(),
        |kind| kind == SlotKind::SyncEffectCleanup,
        SlotKind::SyncEffectCleanup,
        SlotKind::SyncEffectDependency,
    )?;

    match decision {
        Decision::Reuse => visit.skip(),
        Decision::Recompute(previous) => {
            if let Some(previous) = previous {
                previous.run();
            }
            let cleanup = callback();
            visit.commit([Slot::SyncEffectCleanup(cleanup), Slot::SyncEffectDependency(deps)]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::deps;
    use crate::dispatcher::DispatchGuard;
    use crate::hooks::{use_state, SetState};
    use crate::tape::{SharedTape, Tape};

    type Log = Rc<RefCell<Vec<String>>>;

    fn pass<R>(tape: &SharedTape, body: impl FnOnce() -> R) -> R {
        let _guard = DispatchGuard::enter(Rc::clone(tape));
        tape.borrow_mut().begin_pass();
        body()
    }

    fn logging_effect(log: &Log, name: &str) -> impl FnOnce() -> Option<Cleanup> {
        let log = Rc::clone(log);
        let name = name.to_string();
        move || {
            log.borrow_mut().push(format!("setup {name}"));
            Some(Cleanup::new(move || log.borrow_mut().push(format!("cleanup {name}"))))
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_sync_effect_runs_at_call_site() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || {
            use_sync_effect(logging_effect(&log, "a"), Some(deps![1])).expect("effect");
            log.borrow_mut().push("after".to_string());
        });
        assert_eq!(entries(&log), ["setup a", "after"]);
    }

    #[test]
    fn test_sync_effect_skips_unchanged_dependencies() {
        let tape = Tape::shared();
        let log = Log::default();
        for _ in 0..3 {
            pass(&tape, || use_sync_effect(logging_effect(&log, "a"), Some(deps![1]))).expect("effect");
        }
        assert_eq!(entries(&log), ["setup a"]);
    }

    #[test]
    fn test_cleanup_precedes_setup() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_sync_effect(logging_effect(&log, "a"), Some(deps![1]))).expect("effect");
        pass(&tape, || use_sync_effect(logging_effect(&log, "b"), Some(deps![2]))).expect("effect");
        assert_eq!(entries(&log), ["setup a", "cleanup a", "setup b"]);
    }

    #[test]
    fn test_absent_dependencies_always_rerun() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_sync_effect(logging_effect(&log, "a"), None)).expect("effect");
        pass(&tape, || use_sync_effect(logging_effect(&log, "b"), None)).expect("effect");
        assert_eq!(entries(&log), ["setup a", "cleanup a", "setup b"]);
    }

    #[test]
    fn test_empty_dependencies_run_once() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_sync_effect(logging_effect(&log, "a"), Some(deps![]))).expect("effect");
        pass(&tape, || use_sync_effect(logging_effect(&log, "b"), Some(deps![]))).expect("effect");
        assert_eq!(entries(&log), ["setup a"]);
    }

    #[test]
    fn test_missing_cleanup_is_valid() {
        let tape = Tape::shared();
        let runs = Rc::new(RefCell::new(0));
        for dep in [1, 2, 3] {
            let runs = Rc::clone(&runs);
            pass(&tape, move || {
                use_sync_effect(
                    move || {
                        *runs.borrow_mut() += 1;
                        None
                    },
                    Some(deps![dep]),
                )
            })
            .expect("effect");
        }
        assert_eq!(*runs.borrow(), 3);
    }

    #[test]
    fn test_async_effect_is_left_scheduled() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_effect(logging_effect(&log, "a"), Some(deps![1]))).expect("effect");
        assert!(entries(&log).is_empty());
        assert_eq!(tape.borrow().read_at(0).map(Slot::kind), Some(SlotKind::Effect));
        assert_eq!(tape.borrow().read_at(1).map(Slot::kind), Some(SlotKind::EffectDependency));
    }

    #[test]
    fn test_async_effect_cleanup_runs_at_hook_time() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_effect(logging_effect(&log, "a"), Some(deps![1]))).expect("effect");
        let (index, callback) = tape.borrow_mut().take_scheduled_effect(0).expect("scheduled");
        let cleanup = callback();
        tape.borrow_mut().write_at(index, Slot::EffectCleanup(cleanup));

        pass(&tape, || use_effect(logging_effect(&log, "b"), Some(deps![2]))).expect("effect");
        // The new run is only scheduled; the old cleanup already happened.
        assert_eq!(entries(&log), ["setup a", "cleanup a"]);
    }

    #[test]
    fn test_unflushed_effect_is_rescheduled() {
        let tape = Tape::shared();
        let log = Log::default();
        pass(&tape, || use_effect(logging_effect(&log, "a"), Some(deps![1]))).expect("effect");
        pass(&tape, || use_effect(logging_effect(&log, "b"), Some(deps![1]))).expect("effect");

        let (_, callback) = tape.borrow_mut().take_scheduled_effect(0).expect("scheduled");
        callback();
        assert_eq!(entries(&log), ["setup b"]);
    }

    #[test]
    fn test_sync_and_async_kinds_do_not_mix() {
        let tape = Tape::shared();
        pass(&tape, || use_sync_effect(|| None, None)).expect("effect");
        let err = pass(&tape, || use_effect(|| None, None)).expect_err("kind changed");
        assert_eq!(
            err,
            HookError::mismatch(SlotKind::SyncEffectCleanup, SlotKind::EffectCleanup, 0)
        );
    }

    #[test]
    fn test_wrong_dependency_slot_kind() {
        let tape = Tape::shared();
        tape.borrow_mut().write_at(0, Slot::SyncEffectCleanup(None));
        tape.borrow_mut().write_at(1, Slot::MemoDependency(None));

        let err = pass(&tape, || use_sync_effect(|| None, Some(deps![1]))).expect_err("dependency kind");
        assert_eq!(
            err,
            HookError::mismatch(SlotKind::MemoDependency, SlotKind::SyncEffectDependency, 1)
        );
    }

    #[test]
    fn test_wrong_dependency_slot_kind_behind_pending_effect() {
        let tape = Tape::shared();
        tape.borrow_mut().write_at(0, Slot::Effect(Box::new(|| None)));
        tape.borrow_mut().write_at(1, Slot::SyncEffectDependency(None));

        let err = pass(&tape, || use_effect(|| None, None)).expect_err("dependency kind");
        assert_eq!(
            err,
            HookError::mismatch(SlotKind::SyncEffectDependency, SlotKind::EffectDependency, 1)
        );
    }

    /// Bumps a counter state when dropped.
    struct DropCounter(SetState<u32>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.update(|drops| drops + 1);
        }
    }

    #[test]
    fn test_replaced_pending_callback_may_write_state_on_drop() {
        let tape = Tape::shared();
        let (_, set_drops) = pass(&tape, || use_state(0u32)).expect("state");

        for _ in 0..2 {
            let counter = DropCounter(set_drops.clone());
            pass(&tape, move || {
                use_state(0u32)?;
                use_effect(
                    move || {
                        drop(counter);
                        None
                    },
                    Some(deps![]),
                )
            })
            .expect("effect");
        }

        // The first callback never ran and was replaced by the second one.
        let (drops, _) = pass(&tape, || use_state(0u32)).expect("state");
        assert_eq!(drops, 1);
        assert_eq!(tape.borrow().read_at(2).map(Slot::kind), Some(SlotKind::Effect));
    }
}
