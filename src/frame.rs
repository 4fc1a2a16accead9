//! Binding frames: one slot per rule variable, indexed by the rule's
//! variable ordering.
//!
//! Frames are plain values. A failed merge never leaves the receiver
//! half-updated; take a clone first if the pre-merge value is needed
//! after a successful in-place merge.

use crate::rule::Distinct;
use crate::term::{TermId, TermStore};
use crate::unify::{match_with, Bindings};
use smallvec::SmallVec;
use std::fmt;

/// Slot storage. Most rules have only a handful of variables.
pub type Slots = SmallVec<[Option<TermId>; 8]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    slots: Slots,
}

/// Why two frames could not be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// Both frames bind `slot`, to different values.
    Conflict { slot: usize },
    /// The frames belong to rules with different variable counts.
    Width { expected: usize, found: usize },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::Conflict { slot } => write!(f, "conflicting bindings at slot {}", slot),
            MergeError::Width { expected, found } => {
                write!(f, "frame width mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for MergeError {}

impl Frame {
    /// An all-unbound frame with `width` slots.
    pub fn new(width: usize) -> Self {
        Self {
            slots: SmallVec::from_elem(None, width),
        }
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<TermId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Bind `slot`, overwriting any previous value.
    pub fn bind(&mut self, slot: usize, value: TermId) {
        self.slots[slot] = Some(value);
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Every slot is bound.
    pub fn is_valid(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Merge `other` into a copy of `self`.
    pub fn try_merge(&self, other: &Frame) -> Result<Frame, MergeError> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Merge `other` into `self`. On error `self` is unchanged.
    pub fn merge_from(&mut self, other: &Frame) -> Result<(), MergeError> {
        if other.width() != self.width() {
            return Err(MergeError::Width {
                expected: self.width(),
                found: other.width(),
            });
        }
        for (slot, (mine, theirs)) in self.slots.iter().zip(&other.slots).enumerate() {
            if let (Some(a), Some(b)) = (mine, theirs) {
                if a != b {
                    return Err(MergeError::Conflict { slot });
                }
            }
        }
        for (mine, theirs) in self.slots.iter_mut().zip(&other.slots) {
            if mine.is_none() {
                *mine = *theirs;
            }
        }
        Ok(())
    }

    /// Merge `frames` in order, checking `distincts` after each one.
    ///
    /// Returns the merged frame, or the index of the first frame whose
    /// merge conflicted or violated a distinct constraint. Every combination
    /// that shares that prefix fails the same way.
    pub fn merge_all<'a>(
        width: usize,
        frames: impl IntoIterator<Item = &'a Frame>,
        distincts: &[Distinct],
        terms: &TermStore,
    ) -> Result<Frame, usize> {
        let mut acc = Frame::new(width);
        for (i, frame) in frames.into_iter().enumerate() {
            if acc.merge_from(frame).is_err() {
                return Err(i);
            }
            if !distincts.iter().all(|d| d.holds(&acc, terms)) {
                return Err(i);
            }
        }
        Ok(acc)
    }

    /// Values at `slots`, in order, for use as a lookup key. Unbound slots
    /// are skipped.
    pub fn key(&self, slots: &[usize]) -> SmallVec<[TermId; 4]> {
        slots.iter().filter_map(|&s| self.get(s)).collect()
    }

    /// Match `pattern` against `ground`, binding only `vars` (slot `i` is
    /// `vars[i]`).
    pub fn unify(
        pattern: TermId,
        ground: TermId,
        vars: &[TermId],
        terms: &TermStore,
    ) -> Option<Frame> {
        let mut frame = Frame::new(vars.len());
        let ok = match_with(pattern, ground, terms, |p, g| {
            let slot = vars.iter().position(|&v| v == p)?;
            match frame.slots[slot] {
                Some(bound) => Some(bound == g),
                None => {
                    frame.slots[slot] = Some(g);
                    Some(true)
                }
            }
        });
        ok.then_some(frame)
    }

    pub fn from_bindings(bindings: &Bindings, vars: &[TermId]) -> Frame {
        Frame {
            slots: vars.iter().map(|v| bindings.get(v).copied()).collect(),
        }
    }

    /// Bound slots as a variable → value map.
    pub fn to_bindings(&self, vars: &[TermId]) -> Bindings {
        vars.iter()
            .zip(&self.slots)
            .filter_map(|(&var, slot)| slot.map(|value| (var, value)))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/frame.rs"]
mod tests;
