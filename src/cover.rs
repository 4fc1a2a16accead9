//! Variable covers: which positive body atoms get expanded combinatorially
//! during grounding. Atoms outside the cover are checked afterwards.
//!
//! All functions work on body indices into `rule.body`.

use crate::rule::Rule;
use crate::term::{TermId, TermStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// Candidate count per body index.
pub type Costs = FxHashMap<usize, usize>;

/// Occurrences of `targets` in the full traversal of `term`, with
/// multiplicity.
pub fn count_in(term: TermId, targets: &[TermId], terms: &TermStore) -> usize {
    terms.full_iter(term).filter(|t| targets.contains(t)).count()
}

pub fn contains_any(term: TermId, targets: &[TermId], terms: &TermStore) -> bool {
    terms.full_iter(term).any(|t| targets.contains(&t))
}

/// Greedy cover in the given order: keep each atom that touches a variable
/// not yet covered, stop as soon as every variable is covered, then drop
/// any kept atom whose variables the others already cover.
///
/// Returns None if the atoms cannot cover `vars`.
pub fn var_cover(
    rule: &Rule,
    atoms: &[usize],
    vars: &[TermId],
    terms: &TermStore,
) -> Option<Vec<usize>> {
    let mut remaining: Vec<TermId> = vars.to_vec();
    let mut result = Vec::new();

    for &idx in atoms {
        if remaining.is_empty() {
            break;
        }
        let before = remaining.len();
        let term = rule.body[idx].term;
        remaining.retain(|v| !terms.full_iter(term).any(|t| t == *v));
        if remaining.len() < before {
            result.push(idx);
        }
    }

    if !remaining.is_empty() {
        return None;
    }
    prune_redundant(rule, &mut result, vars, terms);
    Some(result)
}

/// Remove atoms whose variables are covered by the rest, most expensive
/// (last selected) first.
fn prune_redundant(rule: &Rule, cover: &mut Vec<usize>, vars: &[TermId], terms: &TermStore) {
    let mut i = cover.len();
    while i > 0 {
        i -= 1;
        let others: FxHashSet<TermId> = cover
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .flat_map(|(_, &idx)| terms.full_iter(rule.body[idx].term))
            .filter(|t| vars.contains(t))
            .collect();
        if vars.iter().all(|v| others.contains(v)) {
            cover.remove(i);
        }
    }
}

/// Pick the expander atoms for the Standard renderer.
///
/// Positive atoms are ordered by ascending candidate count (missing counts
/// are zero), greedily covered, and the cover is then stably reordered so
/// atoms touching head variables come first, and among those, atoms
/// touching distinct variables first. Conflicts that matter most are then
/// detected at the shallowest dimensions.
pub fn greedy_expanders(rule: &Rule, costs: &Costs, terms: &TermStore) -> Option<Vec<usize>> {
    let mut positives: Vec<usize> = rule.positives().map(|(i, _)| i).collect();
    positives.sort_by_key(|i| costs.get(i).copied().unwrap_or(0));

    let mut expanders = var_cover(rule, &positives, &rule.vars, terms)?;

    let head_vars = rule.head_vars(terms);
    let distinct_vars = rule.distinct_vars();
    expanders.sort_by_key(|&idx| {
        let term = rule.body[idx].term;
        (
            !contains_any(term, &head_vars, terms),
            !distinct_vars.is_empty() && !contains_any(term, &distinct_vars, terms),
        )
    });
    Some(expanders)
}

/// Cost-oblivious cover that chains through shared variables: each round
/// takes the atom with the most occurrences of already-covered variables,
/// breaking ties by the fewest occurrences of still-uncovered ones (and then
/// by body order).
///
/// Returns None if the atoms cannot cover `vars`.
pub fn chaining_cover(
    rule: &Rule,
    atoms: &[usize],
    vars: &[TermId],
    terms: &TermStore,
) -> Option<Vec<usize>> {
    let mut available: Vec<usize> = atoms.to_vec();
    let mut covered: Vec<TermId> = Vec::new();
    let mut result = Vec::new();

    while covered.len() < vars.len() && !available.is_empty() {
        let uncovered: Vec<TermId> = vars
            .iter()
            .copied()
            .filter(|v| !covered.contains(v))
            .collect();
        let score = |idx: usize| {
            let term = rule.body[idx].term;
            (count_in(term, &covered, terms), count_in(term, &uncovered, terms))
        };

        let mut best = 0;
        let mut best_score = score(available[0]);
        for (pos, &idx) in available.iter().enumerate().skip(1) {
            let s = score(idx);
            let better = match s.0.cmp(&best_score.0) {
                Ordering::Greater => true,
                Ordering::Equal => s.1 < best_score.1,
                Ordering::Less => false,
            };
            if better {
                best = pos;
                best_score = s;
            }
        }

        let next = available.remove(best);
        let mut added = false;
        for t in terms.full_iter(rule.body[next].term) {
            if vars.contains(&t) && !covered.contains(&t) {
                covered.push(t);
                added = true;
            }
        }
        if added {
            result.push(next);
        }
    }

    (covered.len() >= vars.len()).then_some(result)
}

/// Chaining cover that first covers the head variables, so the search
/// fixes head bindings as early as possible, then chains through the rest.
pub fn chaining_margin_cover(rule: &Rule, terms: &TermStore) -> Option<Vec<usize>> {
    let head_vars = rule.head_vars(terms);
    let mut all: Vec<usize> = rule.positives().map(|(i, _)| i).collect();
    // Most head-variable occurrences first.
    all.sort_by_key(|&idx| std::cmp::Reverse(count_in(rule.body[idx].term, &head_vars, terms)));

    let target_cover = var_cover(rule, &all, &head_vars, terms)?;
    all.retain(|idx| !target_cover.contains(idx));

    let mut remain: Vec<TermId> = rule.vars.clone();
    for &idx in &target_cover {
        let term = rule.body[idx].term;
        remain.retain(|v| !terms.full_iter(term).any(|t| t == *v));
    }

    let mut expanders = target_cover;
    expanders.extend(chaining_cover(rule, &all, &remain, terms)?);
    Some(expanders)
}

#[cfg(test)]
#[path = "tests/cover.rs"]
mod tests;
