//! Call-order addressed slot storage.
//!
//! A tape is an ordered, growable sequence of optional slots with a movable
//! cursor. Positions mean "the Nth slot visited during one invocation" and
//! nothing else. The tape performs no validation: the hook protocol owns
//! kind checking.

use std::cell::RefCell;
use std::rc::Rc;

use crate::slot::{EffectCallback, Slot, SlotKind};

/// A tape shared between its harness, the dispatcher stack and state setters.
pub type SharedTape = Rc<RefCell<Tape>>;

/// Ordered slot storage with a cursor.
#[derive(Debug, Default)]
pub struct Tape {
    slots: Vec<Option<Slot>>,
    cursor: usize,
    rerun_requested: bool,
}

impl Tape {
    /// Creates an empty tape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tape ready to be shared.
    #[must_use]
    pub fn shared() -> SharedTape {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Current cursor position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Number of positions ever written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no position was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reads `N` slots starting at the cursor without moving it.
    ///
    /// Positions past the end read as absent.
    #[must_use]
    pub fn read<const N: usize>(&self) -> [Option<&Slot>; N] {
        std::array::from_fn(|offset| self.read_at(self.cursor + offset))
    }

    /// Overwrites slots starting at the cursor without moving it.
    ///
    /// Returns the displaced slots, one entry per written position. Their
    /// payloads are user values; drop them after releasing any borrow of a
    /// shared tape.
    pub fn write(&mut self, values: impl IntoIterator<Item = Slot>) -> Vec<Option<Slot>> {
        let cursor = self.cursor;
        values
            .into_iter()
            .enumerate()
            .map(|(offset, slot)| self.write_at(cursor + offset, slot))
            .collect()
    }

    /// Random-access read.
    #[must_use]
    pub fn read_at(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Random-access mutable read.
    pub fn read_at_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Random-access write, growing the tape with absent slots as needed.
    ///
    /// Returns the slot previously stored at `index`.
    pub fn write_at(&mut self, index: usize, slot: Slot) -> Option<Slot> {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index].replace(slot)
    }

    /// Removes the slot at `index`, leaving the position absent.
    pub fn take_at(&mut self, index: usize) -> Option<Slot> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Advances the cursor by `n` positions.
    pub fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    /// Places the cursor at an absolute position.
    pub fn seek(&mut self, position: usize) {
        self.cursor = position;
    }

    /// Rewinds the cursor to the first position.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Clears the cursor and all storage, returning the removed slots in
    /// position order.
    pub fn reset(&mut self) -> Vec<Option<Slot>> {
        self.cursor = 0;
        self.rerun_requested = false;
        std::mem::take(&mut self.slots)
    }

    /// Kind of every position, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<Option<SlotKind>> {
        self.slots.iter().map(|s| s.as_ref().map(Slot::kind)).collect()
    }

    /// Records that a state setter wants the wrapped function to run again.
    pub fn request_rerun(&mut self) {
        self.rerun_requested = true;
    }

    /// Returns and clears the re-invocation request.
    pub fn take_rerun_request(&mut self) -> bool {
        std::mem::take(&mut self.rerun_requested)
    }

    /// Prepares the tape for a new pass of the wrapped function.
    pub(crate) fn begin_pass(&mut self) {
        self.cursor = 0;
        self.rerun_requested = false;
    }

    /// Takes the first scheduled effect at or after `from`.
    ///
    /// The `EFFECT` slot is replaced by an empty `EFFECT_CLEANUP`; the caller
    /// writes the callback's disposer back once it has run.
    pub(crate) fn take_scheduled_effect(&mut self, from: usize) -> Option<(usize, EffectCallback)> {
        let index = (from..self.slots.len())
            .find(|&i| matches!(self.slots[i], Some(Slot::Effect(_))))?;
        match self.slots[index].replace(Slot::EffectCleanup(None)) {
            Some(Slot::Effect(callback)) => Some((index, callback)),
            _ => None,
        }
    }
}
