//! The timeout hook, composed from the synchronous effect hook.

use std::rc::Rc;
use std::time::Duration;

use crate::error::HookResult;
use crate::slot::Cleanup;
use crate::timer::Timers;
use crate::value::Dep;

use super::effect::use_sync_effect;

/// Schedules `callback` on `timers` after `delay`.
///
/// The timer is keyed by `[delay, ...args]`: while those stay the same the
/// pending timer is left alone, when any changes the pending timer is
/// cancelled and a new one is scheduled. Teardown of the harness cancels a
/// timer that has not fired yet.
///
/// # Errors
///
/// Same as [`use_sync_effect`](crate::use_sync_effect).
pub fn use_timeout<F>(
    timers: &Rc<dyn Timers>,
    callback: F,
    delay: Duration,
    args: Vec<Dep>,
) -> HookResult<()>
where
    F: FnOnce() + 'static,
{
    let mut deps = Vec::with_capacity(args.len() + 1);
    deps.push(Dep::Duration(delay));
    deps.extend(args);

    let timers = Rc::clone(timers);
    use_sync_effect(
        move || {
            let id = timers.schedule(delay, Box::new(callback));
            Some(Cleanup::new(move || {
                timers.cancel(id);
            }))
        },
        Some(deps),
    )
}
