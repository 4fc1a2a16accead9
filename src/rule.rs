//! Atoms, distinct constraints, and rules.

use crate::frame::Frame;
use crate::term::{TermId, TermStore};
use crate::unify::{replace, Bindings};
use smallvec::SmallVec;
use std::fmt;

/// A term with a polarity: `truth == false` is a negated literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    pub term: TermId,
    pub truth: bool,
}

impl Atom {
    pub fn new(term: TermId, truth: bool) -> Self {
        Self { term, truth }
    }

    pub fn positive(term: TermId) -> Self {
        Self::new(term, true)
    }

    pub fn negative(term: TermId) -> Self {
        Self::new(term, false)
    }
}

/// A `(distinct left right)` constraint, with the rule slots of the
/// variables it mentions resolved up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Distinct {
    pub left: TermId,
    pub right: TermId,
    vars: SmallVec<[(usize, TermId); 4]>,
}

impl Distinct {
    fn compile(left: TermId, right: TermId, rule_vars: &[TermId], terms: &TermStore) -> Self {
        let mut vars: SmallVec<[(usize, TermId); 4]> = SmallVec::new();
        for t in terms.full_iter(left).chain(terms.full_iter(right)) {
            if let Some(slot) = rule_vars.iter().position(|&v| v == t) {
                if !vars.iter().any(|&(s, _)| s == slot) {
                    vars.push((slot, t));
                }
            }
        }
        Self { left, right, vars }
    }

    /// Slots of the rule variables this constraint mentions.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.vars.iter().map(|&(slot, _)| slot)
    }

    /// False only if both sides are fully ground under `frame` and equal.
    /// A constraint whose variables are not all bound yet holds.
    pub fn holds(&self, frame: &Frame, terms: &TermStore) -> bool {
        let bindings: Bindings = self
            .vars
            .iter()
            .filter_map(|&(slot, var)| frame.get(slot).map(|value| (var, value)))
            .collect();
        self.holds_under(&bindings, terms)
    }

    pub fn holds_under(&self, bindings: &Bindings, terms: &TermStore) -> bool {
        let left = replace(self.left, bindings, terms);
        let right = replace(self.right, bindings, terms);
        left != right || !terms.is_ground(left)
    }
}

/// A rule may not conclude a negative fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    NegativeHead { head: TermId },
    /// `var` does not occur in any positive body atom, so no grounding can
    /// ever bind it.
    UnsafeVariable { head: TermId, var: TermId },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::NegativeHead { head } => {
                write!(f, "rule with head #{} has a negative head", head.raw())
            }
            RuleError::UnsafeVariable { head, var } => write!(
                f,
                "rule with head #{} is unsafe: variable #{} is not bound by a positive body atom",
                head.raw(),
                var.raw()
            ),
        }
    }
}

impl std::error::Error for RuleError {}

/// `head <= body... (distinct a b)...`
///
/// `vars` lists every variable of the rule in first-occurrence order
/// (head, then body, then distinct pairs); a variable's position in `vars`
/// is its slot in every [`Frame`] built for this rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<Atom>,
    pub distinct: Vec<Distinct>,
    pub vars: Vec<TermId>,
}

impl Rule {
    pub fn new(
        head: Atom,
        body: Vec<Atom>,
        distinct: impl IntoIterator<Item = (TermId, TermId)>,
        terms: &TermStore,
    ) -> Self {
        let pairs: Vec<(TermId, TermId)> = distinct.into_iter().collect();

        let mut vars = Vec::new();
        let roots = std::iter::once(head.term)
            .chain(body.iter().map(|a| a.term))
            .chain(pairs.iter().flat_map(|&(l, r)| [l, r]));
        for root in roots {
            for t in terms.full_iter(root) {
                if terms.is_var(t) && !vars.contains(&t) {
                    vars.push(t);
                }
            }
        }

        let distinct = pairs
            .into_iter()
            .map(|(l, r)| Distinct::compile(l, r, &vars, terms))
            .collect();

        Self {
            head,
            body,
            distinct,
            vars,
        }
    }

    /// Shorthand for a rule with a positive head and no distinct pairs.
    pub fn simple(head: TermId, body: Vec<Atom>, terms: &TermStore) -> Self {
        Self::new(Atom::positive(head), body, [], terms)
    }

    pub fn slot_of(&self, var: TermId) -> Option<usize> {
        self.vars.iter().position(|&v| v == var)
    }

    pub fn is_varless(&self) -> bool {
        self.vars.is_empty()
    }

    /// Positive body atoms with their body index.
    pub fn positives(&self) -> impl Iterator<Item = (usize, &Atom)> + '_ {
        self.body.iter().enumerate().filter(|(_, a)| a.truth)
    }

    /// Negative body atoms with their body index.
    pub fn negatives(&self) -> impl Iterator<Item = (usize, &Atom)> + '_ {
        self.body.iter().enumerate().filter(|(_, a)| !a.truth)
    }

    /// Every top-level term of the rule: head, body atoms, distinct sides.
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        std::iter::once(self.head.term)
            .chain(self.body.iter().map(|a| a.term))
            .chain(self.distinct.iter().flat_map(|d| [d.left, d.right]))
    }

    /// Rule variables occurring in the head.
    pub fn head_vars(&self, terms: &TermStore) -> Vec<TermId> {
        self.vars_within(std::iter::once(self.head.term), terms)
    }

    /// Rule variables occurring in any distinct pair.
    pub fn distinct_vars(&self) -> Vec<TermId> {
        let mut out = Vec::new();
        for d in &self.distinct {
            for slot in d.slots() {
                let var = self.vars[slot];
                if !out.contains(&var) {
                    out.push(var);
                }
            }
        }
        out
    }

    /// Variables that no positive body atom mentions.
    pub fn unsafe_vars(&self, terms: &TermStore) -> Vec<TermId> {
        let covered = self.vars_within(self.positives().map(|(_, a)| a.term), terms);
        self.vars
            .iter()
            .copied()
            .filter(|v| !covered.contains(v))
            .collect()
    }

    pub fn evaluate_distinct(&self, bindings: &Bindings, terms: &TermStore) -> bool {
        self.distinct.iter().all(|d| d.holds_under(bindings, terms))
    }

    fn vars_within(&self, roots: impl Iterator<Item = TermId>, terms: &TermStore) -> Vec<TermId> {
        let mut out = Vec::new();
        for root in roots {
            for t in terms.full_iter(root) {
                if self.vars.contains(&t) && !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "tests/rule.rs"]
mod tests;
