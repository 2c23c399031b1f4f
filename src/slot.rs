//! Tagged slots stored on a tape.
//!
//! Each hook owns a fixed number of consecutive slots. The slot kind is the
//! one runtime discriminant the protocol checks: a kind that differs from the
//! one the calling hook expects means the hook call order changed.

use std::any::Any;
use std::fmt;

use crate::value::Dep;

/// Discriminant of a [`Slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    State,
    SetState,
    Effect,
    EffectCleanup,
    EffectDependency,
    SyncEffectCleanup,
    SyncEffectDependency,
    Memo,
    MemoDependency,
    Constant,
    Previous,
    MutableRef,
}

impl SlotKind {
    /// Upper-case tag used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "STATE",
            Self::SetState => "SET_STATE",
            Self::Effect => "EFFECT",
            Self::EffectCleanup => "EFFECT_CLEANUP",
            Self::EffectDependency => "EFFECT_DEPENDENCY",
            Self::SyncEffectCleanup => "SYNC_EFFECT_CLEANUP",
            Self::SyncEffectDependency => "SYNC_EFFECT_DEPENDENCY",
            Self::Memo => "MEMO",
            Self::MemoDependency => "MEMO_DEPENDENCY",
            Self::Constant => "CONSTANT",
            Self::Previous => "PREVIOUS",
            Self::MutableRef => "MUTABLE_REF",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disposer returned by an effect callback.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wraps a disposer closure.
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self(Box::new(dispose))
    }

    /// Runs the disposer.
    pub fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup(..)")
    }
}

/// Effect callback held on the tape until the harness flushes it.
pub type EffectCallback = Box<dyn FnOnce() -> Option<Cleanup>>;

/// A tagged value cell at one tape position.
pub enum Slot {
    State(Box<dyn Any>),
    SetState(Box<dyn Any>),
    /// Scheduled asynchronous effect that has not run yet.
    Effect(EffectCallback),
    EffectCleanup(Option<Cleanup>),
    EffectDependency(Option<Vec<Dep>>),
    SyncEffectCleanup(Option<Cleanup>),
    SyncEffectDependency(Option<Vec<Dep>>),
    Memo(Box<dyn Any>),
    MemoDependency(Option<Vec<Dep>>),
    Constant(Box<dyn Any>),
    /// `(older, newer)` pair of the previous-value hook.
    Previous(Box<dyn Any>),
    MutableRef(Box<dyn Any>),
}

impl Slot {
    /// Returns the discriminant of this slot.
    #[must_use]
    pub const fn kind(&self) -> SlotKind {
        match self {
            Self::State(_) => SlotKind::State,
            Self::SetState(_) => SlotKind::SetState,
            Self::Effect(_) => SlotKind::Effect,
            Self::EffectCleanup(_) => SlotKind::EffectCleanup,
            Self::EffectDependency(_) => SlotKind::EffectDependency,
            Self::SyncEffectCleanup(_) => SlotKind::SyncEffectCleanup,
            Self::SyncEffectDependency(_) => SlotKind::SyncEffectDependency,
            Self::Memo(_) => SlotKind::Memo,
            Self::MemoDependency(_) => SlotKind::MemoDependency,
            Self::Constant(_) => SlotKind::Constant,
            Self::Previous(_) => SlotKind::Previous,
            Self::MutableRef(_) => SlotKind::MutableRef,
        }
    }

    /// The type-erased value of slots that carry one.
    pub(crate) fn payload(&self) -> Option<&dyn Any> {
        match self {
            Self::State(v)
            | Self::SetState(v)
            | Self::Memo(v)
            | Self::Constant(v)
            | Self::Previous(v)
            | Self::MutableRef(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// The dependency list of dependency slots.
    ///
    /// The outer `Option` is `None` for slots that are not dependency slots;
    /// the inner one is `None` when the dependency argument was absent.
    pub(crate) fn dependencies(&self) -> Option<Option<&[Dep]>> {
        match self {
            Self::EffectDependency(d) | Self::SyncEffectDependency(d) | Self::MemoDependency(d) => {
                Some(d.as_deref())
            }
            _ => None,
        }
    }

    /// Takes the stored disposer out of a cleanup slot, leaving it empty.
    pub(crate) fn take_cleanup(&mut self) -> Option<Cleanup> {
        match self {
            Self::EffectCleanup(c) | Self::SyncEffectCleanup(c) => c.take(),
            _ => None,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dependencies() {
            Some(deps) => f.debug_tuple(self.kind().as_str()).field(&deps).finish(),
            None => f.write_str(self.kind().as_str()),
        }
    }
}
