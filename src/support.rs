//! Supports: for each positive body atom of a rule, the ground terms that
//! might unify with it.

use crate::cover::Costs;
use crate::frame::Frame;
use crate::rule::Rule;
use crate::term::{TermId, TermStore};
use rustc_hash::{FxHashMap, FxHashSet};

/// The set of currently-true ground facts. The grounding engine only reads it.
pub type Facts = FxHashSet<TermId>;

/// Candidate grounds per body index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Support {
    candidates: FxHashMap<usize, Vec<TermId>>,
}

impl Support {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidates for the atom at `body_idx`, skipping ones already present.
    pub fn extend(&mut self, body_idx: usize, grounds: impl IntoIterator<Item = TermId>) {
        let entry = self.candidates.entry(body_idx).or_default();
        let mut seen: FxHashSet<TermId> = entry.iter().copied().collect();
        for g in grounds {
            if seen.insert(g) {
                entry.push(g);
            }
        }
    }

    /// Candidates for the atom at `body_idx`; empty if none were supplied.
    pub fn get(&self, body_idx: usize) -> &[TermId] {
        self.candidates
            .get(&body_idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidate count per atom, as costs for cover selection.
    pub fn sizes(&self) -> Costs {
        self.candidates
            .iter()
            .map(|(&idx, grounds)| (idx, grounds.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.values().all(Vec::is_empty)
    }
}

/// Every positive atom gets every fact. Cheap and imprecise.
pub fn naive_support(rule: &Rule, truths: &Facts) -> Support {
    let mut support = Support::new();
    for (idx, _) in rule.positives() {
        support.extend(idx, truths.iter().copied());
    }
    support
}

/// Every positive atom gets only the facts it actually unifies with, so
/// candidate counts are real costs.
pub fn filtered_support(rule: &Rule, truths: &Facts, terms: &TermStore) -> Support {
    let mut support = Support::new();
    for (idx, atom) in rule.positives() {
        support.extend(
            idx,
            truths
                .iter()
                .copied()
                .filter(|&g| Frame::unify(atom.term, g, &rule.vars, terms).is_some()),
        );
    }
    support
}

/// Per-expander candidate frames: entry `i` holds the frames obtained by
/// unifying `rule.body[expanders[i]]` with each of its candidates.
pub fn unification_space(
    rule: &Rule,
    support: &Support,
    expanders: &[usize],
    terms: &TermStore,
) -> Vec<Vec<Frame>> {
    expanders
        .iter()
        .map(|&idx| {
            let pattern = rule.body[idx].term;
            support
                .get(idx)
                .iter()
                .filter_map(|&g| Frame::unify(pattern, g, &rule.vars, terms))
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests;
