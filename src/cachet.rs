//! Per-session derived-fact cache.
//!
//! Memoizes which body form a ground fact belongs to, which rules a fact
//! can affect, and which grounds are already known to unify with each body
//! form (`unisuccess`), so later proving rounds can build supports without
//! re-unifying every fact against every atom.
//!
//! A `Cachet` is not internally synchronized. Concurrent provers each keep
//! their own.

use crate::pool::Pool;
use crate::rule::Rule;
use crate::ruletta::{RuleId, Ruletta};
use crate::support::Support;
use crate::term::{TermId, TermStore};
use crate::unify::{may_unify, unify};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;

/// An index over body forms (body terms of a rule set, variables and all).
pub trait FormIndex {
    /// Indexed forms `ground` unifies with, most general first. The last
    /// element is the ground's canonical form.
    fn trunk(&self, ground: TermId, terms: &TermStore) -> Vec<TermId>;

    /// Indexed forms that share instances with `form`, most general first.
    fn spine(&self, form: TermId, terms: &TermStore) -> Vec<TermId>;
}

/// A linear-scan form index. Fine for rule sets with tens or low hundreds
/// of distinct body forms.
#[derive(Debug, Clone, Default)]
pub struct FlatFormIndex {
    /// Sorted most general first.
    forms: Vec<TermId>,
}

impl FlatFormIndex {
    pub fn new(forms: impl IntoIterator<Item = TermId>, terms: &TermStore) -> Self {
        let mut forms: Vec<TermId> = forms.into_iter().collect();
        forms.sort_unstable();
        forms.dedup();
        forms.sort_by_key(|&f| generality_key(f, terms));
        Self { forms }
    }

    /// Index every body term of `ruletta`.
    pub fn from_ruletta(ruletta: &Ruletta, pool: &Pool) -> Self {
        Self::new(ruletta.body_to_rule.keys().copied(), pool.terms())
    }

    pub fn forms(&self) -> &[TermId] {
        &self.forms
    }
}

/// Fewer concrete nodes first; among equals, more distinct variables
/// first, so `(p ?x ?y)` precedes `(p ?x ?x)`.
fn generality_key(form: TermId, terms: &TermStore) -> (usize, Reverse<usize>, TermId) {
    let concrete = terms.full_iter(form).filter(|&t| !terms.is_var(t)).count();
    let vars = terms.vars_of(form).len();
    (concrete, Reverse(vars), form)
}

impl FormIndex for FlatFormIndex {
    fn trunk(&self, ground: TermId, terms: &TermStore) -> Vec<TermId> {
        self.forms
            .iter()
            .copied()
            .filter(|&f| unify(f, ground, terms).is_some())
            .collect()
    }

    fn spine(&self, form: TermId, terms: &TermStore) -> Vec<TermId> {
        self.forms
            .iter()
            .copied()
            .filter(|&f| may_unify(f, form, terms))
            .collect()
    }
}

pub struct Cachet<'r, I: FormIndex = FlatFormIndex> {
    ruletta: &'r Ruletta,
    index: I,
    canonical_forms: FxHashMap<TermId, Option<TermId>>,
    canonical_spines: FxHashMap<TermId, Vec<TermId>>,
    canonical_rules: FxHashMap<TermId, Vec<RuleId>>,
    /// Body form → grounds known to unify with it.
    unisuccess: FxHashMap<TermId, FxHashSet<TermId>>,
    /// Body form → variable → values it has been bound to.
    unispaces: FxHashMap<TermId, FxHashMap<TermId, FxHashSet<TermId>>>,
}

impl<'r> Cachet<'r, FlatFormIndex> {
    pub fn new(ruletta: &'r Ruletta, pool: &Pool) -> Self {
        Self::with_index(ruletta, FlatFormIndex::from_ruletta(ruletta, pool))
    }
}

impl<'r, I: FormIndex> Cachet<'r, I> {
    pub fn with_index(ruletta: &'r Ruletta, index: I) -> Self {
        Self {
            ruletta,
            index,
            canonical_forms: FxHashMap::default(),
            canonical_spines: FxHashMap::default(),
            canonical_rules: FxHashMap::default(),
            unisuccess: FxHashMap::default(),
            unispaces: FxHashMap::default(),
        }
    }

    pub fn ruletta(&self) -> &'r Ruletta {
        self.ruletta
    }

    /// The most specific indexed form `ground` unifies with.
    pub fn canonical_form(&mut self, ground: TermId, pool: &Pool) -> Option<TermId> {
        let index = &self.index;
        *self
            .canonical_forms
            .entry(ground)
            .or_insert_with(|| index.trunk(ground, pool.terms()).last().copied())
    }

    /// Spine of the canonical form of `ground`; empty if it has none.
    pub fn spine(&mut self, ground: TermId, pool: &Pool) -> Vec<TermId> {
        match self.canonical_form(ground, pool) {
            Some(form) => self.canonical_spine(form, pool).to_vec(),
            None => Vec::new(),
        }
    }

    fn canonical_spine(&mut self, form: TermId, pool: &Pool) -> &[TermId] {
        let index = &self.index;
        self.canonical_spines
            .entry(form)
            .or_insert_with(|| index.spine(form, pool.terms()))
    }

    /// Rules with a body atom on the spine of `form`.
    pub fn canonical_rules(&mut self, form: TermId, pool: &Pool) -> Vec<RuleId> {
        if let Some(rules) = self.canonical_rules.get(&form) {
            return rules.clone();
        }
        let ruletta = self.ruletta;
        let mut rules: Vec<RuleId> = self
            .canonical_spine(form, pool)
            .iter()
            .filter_map(|f| ruletta.body_to_rule.get(f))
            .flatten()
            .copied()
            .collect();
        rules.sort_unstable();
        rules.dedup();
        self.canonical_rules.insert(form, rules.clone());
        rules
    }

    /// Rules that a newly true `ground` may let fire.
    pub fn affected_rules(&mut self, ground: TermId, pool: &Pool) -> Vec<RuleId> {
        match self.canonical_form(ground, pool) {
            Some(form) => self.canonical_rules(form, pool),
            None => Vec::new(),
        }
    }

    /// Record `ground` under its canonical form. Returns false if no
    /// indexed form matches it.
    pub fn store_ground(&mut self, ground: TermId, pool: &Pool) -> bool {
        match self.canonical_form(ground, pool) {
            Some(form) => {
                self.store_ground_at(ground, form, pool);
                true
            }
            None => false,
        }
    }

    /// Record `ground` under `body` as given, and remember the values it
    /// gives to `body`'s variables.
    pub fn store_ground_at(&mut self, ground: TermId, body: TermId, pool: &Pool) {
        self.unisuccess.entry(body).or_default().insert(ground);
        self.store_variable_replacements(ground, body, pool);
    }

    /// Record `ground` under every form on its spine that it unifies with.
    /// Returns how many forms it was stored under.
    pub fn store_ground_spine(&mut self, ground: TermId, pool: &Pool) -> usize {
        let terms = pool.terms();
        let spine = self.spine(ground, pool);
        let mut stored = 0;
        for form in spine {
            if unify(form, ground, terms).is_some() {
                self.store_ground_at(ground, form, pool);
                stored += 1;
            }
        }
        stored
    }

    fn store_variable_replacements(&mut self, ground: TermId, body: TermId, pool: &Pool) {
        let Some(bindings) = unify(body, ground, pool.terms()) else {
            return;
        };
        let space = self.unispaces.entry(body).or_default();
        for (var, value) in bindings {
            space.entry(var).or_default().insert(value);
        }
    }

    /// Grounds known to unify with `body`, sorted.
    pub fn unisuccess(&self, body: TermId) -> Vec<TermId> {
        let mut grounds: Vec<TermId> = self
            .unisuccess
            .get(&body)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        grounds.sort_unstable();
        grounds
    }

    /// Values observed for `var` inside `body`, sorted.
    pub fn replacements(&self, body: TermId, var: TermId) -> Vec<TermId> {
        let mut values: Vec<TermId> = self
            .unispaces
            .get(&body)
            .and_then(|space| space.get(&var))
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        values.sort_unstable();
        values
    }

    /// Support for `rule` from the grounds stored so far.
    pub fn cached_support(&self, rule: &Rule) -> Support {
        let mut support = Support::new();
        for (idx, atom) in rule.positives() {
            support.extend(idx, self.unisuccess(atom.term));
        }
        support
    }

    /// Forget everything, ready for a new session.
    pub fn clear(&mut self) {
        self.canonical_forms.clear();
        self.canonical_spines.clear();
        self.canonical_rules.clear();
        self.unisuccess.clear();
        self.unispaces.clear();
    }

    /// Number of (form, ground) associations stored.
    pub fn stored_len(&self) -> usize {
        self.unisuccess.values().map(FxHashSet::len).sum()
    }
}

#[cfg(test)]
#[path = "tests/cachet.rs"]
mod tests;
