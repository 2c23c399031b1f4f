//! Harness: binds one persistent tape to a function.
//!
//! Each call of the wrapped function runs one or more passes:
//!
//! 1. push the tape and rewind its cursor
//! 2. run the function body (hooks read and write the tape)
//! 3. run the asynchronous effects the body scheduled, in tape order
//! 4. pop the tape
//!
//! If a state setter ran during the pass, another pass follows with the same
//! arguments, until a pass completes without a setter request.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::dispatcher::DispatchGuard;
use crate::error::{HookError, HookResult};
use crate::slot::{Slot, SlotKind};
use crate::tape::{SharedTape, Tape};

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Name attached to log events.
    pub name: String,
    /// Maximum passes per call before the fixed-point loop gives up.
    pub max_passes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            name: "harness".to_string(),
            max_passes: 50,
        }
    }
}

impl HarnessConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `HookError::InvalidConfig` if `json` does not parse or the
    /// parsed values fail [`HarnessConfig::validate`].
    pub fn from_json_str(json: &str) -> HookResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HookError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the harness cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `HookError::InvalidConfig` if `max_passes` is zero.
    pub fn validate(&self) -> HookResult<()> {
        if self.max_passes == 0 {
            return Err(HookError::invalid_config("max_passes must be at least 1"));
        }
        Ok(())
    }
}

type WrappedFn<A, R> = dyn Fn(&A) -> HookResult<R>;

/// A function with persistent hook state.
///
/// # Example
///
/// ```
/// use hooktape::{use_state, Harness};
///
/// let counter = Harness::new(|limit: &u32| {
///     let (count, set_count) = use_state(0u32)?;
///     if count < *limit {
///         set_count.update(|c| c + 1);
///     }
///     Ok(count)
/// });
///
/// // Setter requests re-run the body until the state settles.
/// assert_eq!(counter.call(&3), Ok(3));
/// assert_eq!(counter.call(&5), Ok(5));
/// ```
pub struct Harness<A, R> {
    func: Box<WrappedFn<A, R>>,
    tape: SharedTape,
    config: HarnessConfig,
    running: Cell<bool>,
}

/// Wraps `func` in a harness with the default configuration.
pub fn wrap<A, R, F>(func: F) -> Harness<A, R>
where
    F: Fn(&A) -> HookResult<R> + 'static,
{
    Harness::new(func)
}

impl<A, R> Harness<A, R> {
    /// Wraps `func` with the default configuration.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&A) -> HookResult<R> + 'static,
    {
        Self {
            func: Box::new(func),
            tape: Tape::shared(),
            config: HarnessConfig::default(),
            running: Cell::new(false),
        }
    }

    /// Wraps `func` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `HookError::InvalidConfig` if `config` fails validation.
    pub fn with_config<F>(func: F, config: HarnessConfig) -> HookResult<Self>
    where
        F: Fn(&A) -> HookResult<R> + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(func)
        })
    }

    /// Calls the wrapped function, repeating passes until no state setter
    /// asks for another one. Returns the output of the last pass.
    ///
    /// # Errors
    ///
    /// - `HookError::RecursiveCall` if called from inside its own body
    /// - `HookError::ReinvocationLimit` if state never settles within `max_passes`
    /// - any error returned by the wrapped function or its hooks
    pub fn call(&self, args: &A) -> HookResult<R> {
        if self.running.replace(true) {
            return Err(HookError::RecursiveCall);
        }
        let _running = RunningFlag(&self.running);

        let mut passes = 0;
        loop {
            if passes == self.config.max_passes {
                warn!(harness = %self.config.name, limit = passes, "state never settled");
                return Err(HookError::ReinvocationLimit { limit: passes });
            }
            passes += 1;
            trace!(harness = %self.config.name, pass = passes, "pass started");

            let output = self.pass(args)?;
            if !self.tape.borrow_mut().take_rerun_request() {
                debug!(harness = %self.config.name, passes, "call settled");
                return Ok(output);
            }
        }
    }

    fn pass(&self, args: &A) -> HookResult<R> {
        let _guard = DispatchGuard::enter(SharedTape::clone(&self.tape));
        self.tape.borrow_mut().begin_pass();
        let output = (self.func)(args)?;
        self.flush_effects();
        Ok(output)
    }

    /// Runs scheduled asynchronous effects in tape order, storing each
    /// returned disposer at the effect's position.
    fn flush_effects(&self) {
        let mut from = 0;
        loop {
            let Some((index, callback)) = self.tape.borrow_mut().take_scheduled_effect(from) else {
                break;
            };
            trace!(harness = %self.config.name, index, "running effect");
            let cleanup = callback();
            let displaced = self.tape.borrow_mut().write_at(index, Slot::EffectCleanup(cleanup));
            drop(displaced);
            from = index + 1;
        }
    }

    /// Runs every stored disposer in tape order and clears the tape.
    ///
    /// Scheduled effects that never ran are discarded. The harness can be
    /// called again afterwards and starts from an empty tape.
    ///
    /// # Errors
    ///
    /// Returns `HookError::TeardownWhileRunning` if called while the wrapped
    /// function is executing.
    pub fn teardown(&self) -> HookResult<()> {
        if self.running.get() {
            return Err(HookError::TeardownWhileRunning);
        }

        let slots = self.tape.borrow_mut().reset();
        let mut cleanups = 0;
        for mut slot in slots.into_iter().flatten() {
            if slot.kind() == SlotKind::Effect {
                warn!(harness = %self.config.name, "discarding effect that never ran");
                continue;
            }
            if let Some(cleanup) = slot.take_cleanup() {
                cleanup.run();
                cleanups += 1;
            }
        }
        debug!(harness = %self.config.name, cleanups, "harness torn down");
        Ok(())
    }

    /// Slot kind at every tape position.
    #[must_use]
    pub fn slot_kinds(&self) -> Vec<Option<SlotKind>> {
        self.tape.borrow().kinds()
    }

    /// Number of tape positions in use.
    #[must_use]
    pub fn tape_len(&self) -> usize {
        self.tape.borrow().len()
    }

    /// True while the wrapped function is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// The configuration this harness runs with.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }
}

impl<A, R> fmt::Debug for Harness<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("tape", &self.tape)
            .field("running", &self.running.get())
            .finish_non_exhaustive()
    }
}

struct RunningFlag<'a>(&'a Cell<bool>);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
