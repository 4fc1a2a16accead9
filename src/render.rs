//! Renderers: given one rule, its support, and the current facts, produce
//! every assignment of the rule's variables that makes the body true.
//!
//! Three strategies:
//! - `Standard` expands a cheap greedy variable cover as a Cartesian product
//!   and skips whole sub-cubes on conflict.
//! - `Chaining` expands a cover that chains through shared variables, one
//!   atom per search-stack level, pruning at every level.
//! - `Failover` tries its children in order and moves on when one runs out
//!   of operation budget.

use crate::cartesian::{space_size, AdvancingIterator};
use crate::cover::{chaining_cover, chaining_margin_cover, greedy_expanders};
use crate::frame::Frame;
use crate::limiter::OpLimiter;
use crate::metrics::GroundMetrics;
use crate::pool::Pool;
use crate::rule::{Atom, Rule};
use crate::support::{filtered_support, unification_space, Facts, Support};
use crate::term::TermId;
use crate::trace::{debug, debug_span};
use crate::unify::{unify_list_vars, Bindings};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Default operation budget for the Standard renderer inside a failover.
pub const DEFAULT_STANDARD_BUDGET: u64 = 1024;

/// Result of one renderer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grounding {
    /// Every satisfying assignment was found.
    Complete(Vec<Bindings>),
    /// The operation budget ran out; these are some of the assignments.
    Partial(Vec<Bindings>),
}

impl Grounding {
    pub fn is_complete(&self) -> bool {
        matches!(self, Grounding::Complete(_))
    }

    pub fn bindings(&self) -> &[Bindings] {
        match self {
            Grounding::Complete(b) | Grounding::Partial(b) => b,
        }
    }

    pub fn into_bindings(self) -> Vec<Bindings> {
        match self {
            Grounding::Complete(b) | Grounding::Partial(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings().is_empty()
    }
}

/// Budgets for [`Renderer::failover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Operation budget of the first (Standard) child.
    pub standard_budget: u64,
    /// Operation budget of the fallback (Chaining) child; None is unbounded.
    pub chaining_budget: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            standard_budget: DEFAULT_STANDARD_BUDGET,
            chaining_budget: None,
        }
    }
}

#[derive(Debug)]
pub enum Renderer {
    Standard(Standard),
    Chaining(Chaining),
    Failover(Failover),
}

impl Renderer {
    /// An unbounded Standard renderer.
    pub fn standard() -> Self {
        Renderer::Standard(Standard::new(OpLimiter::unbounded(), Arc::default()))
    }

    /// An unbounded Chaining renderer.
    pub fn chaining() -> Self {
        Renderer::Chaining(Chaining::new(OpLimiter::unbounded(), Arc::default()))
    }

    /// Standard on a small budget, then Chaining.
    pub fn failover(config: &RenderConfig) -> Self {
        let metrics = Arc::new(GroundMetrics::new());
        Renderer::Failover(Failover::with_metrics(
            vec![
                Renderer::Standard(Standard::new(
                    OpLimiter::bounded(config.standard_budget),
                    Arc::clone(&metrics),
                )),
                Renderer::Chaining(Chaining::new(
                    OpLimiter::new(config.chaining_budget),
                    Arc::clone(&metrics),
                )),
            ],
            metrics,
        ))
    }

    /// Render every satisfying assignment of `rule` against `truths`.
    pub fn apply(
        &mut self,
        rule: &Rule,
        truths: &Facts,
        support: &Support,
        pool: &Pool,
    ) -> Grounding {
        match self {
            Renderer::Standard(r) => r.apply(rule, truths, support, pool),
            Renderer::Chaining(r) => r.apply(rule, truths, support, pool),
            Renderer::Failover(r) => r.apply(rule, truths, support, pool),
        }
    }

    /// Build a filtered support for `rule` and render it.
    pub fn ground(&mut self, rule: &Rule, truths: &Facts, pool: &Pool) -> Grounding {
        let support = filtered_support(rule, truths, pool.terms());
        self.apply(rule, truths, &support, pool)
    }

    /// The last run stopped on its operation budget.
    pub fn failed(&self) -> bool {
        match self {
            Renderer::Standard(r) => r.ops.failed(),
            Renderer::Chaining(r) => r.ops.failed(),
            Renderer::Failover(r) => r.failed(),
        }
    }

    pub fn metrics(&self) -> &GroundMetrics {
        match self {
            Renderer::Standard(r) => &r.metrics,
            Renderer::Chaining(r) => &r.metrics,
            Renderer::Failover(r) => &r.metrics,
        }
    }
}

/// Greedy cover + advancing Cartesian product.
#[derive(Debug)]
pub struct Standard {
    pub ops: OpLimiter,
    metrics: Arc<GroundMetrics>,
}

impl Standard {
    pub fn new(ops: OpLimiter, metrics: Arc<GroundMetrics>) -> Self {
        Self { ops, metrics }
    }

    pub fn apply(
        &mut self,
        rule: &Rule,
        truths: &Facts,
        support: &Support,
        pool: &Pool,
    ) -> Grounding {
        let _span = debug_span!("standard_render", vars = rule.vars.len()).entered();
        self.ops.begin();
        self.metrics.record_run();

        if rule.is_varless() {
            return Grounding::Complete(apply_varless(rule, truths));
        }

        let terms = pool.terms();
        let Some(expanders) = greedy_expanders(rule, &support.sizes(), terms) else {
            debug!("standard_no_cover");
            return Grounding::Complete(Vec::new());
        };
        let check = remaining_atoms(rule, &expanders);
        let space = unification_space(rule, support, &expanders, terms);
        let mut iter = AdvancingIterator::new(&space);

        let mut result = Vec::new();
        while iter.has_next() {
            if self.ops.exceeded() {
                self.metrics.record_budget_exhausted();
                debug!(found = result.len(), "standard_budget_exceeded");
                return Grounding::Partial(result);
            }
            let Some(assignment) = iter.next() else {
                break;
            };
            self.metrics.record_combination();

            match Frame::merge_all(rule.vars.len(), assignment, &rule.distinct, terms) {
                Err(failure) => {
                    self.metrics.record_conflict();
                    iter.advance(failure);
                }
                Ok(frame) => {
                    let bindings = frame.to_bindings(&rule.vars);
                    if !check_atoms(&bindings, &check, truths, pool) {
                        self.metrics.record_check_failure();
                        continue;
                    }
                    if frame.is_valid() {
                        self.metrics.record_result();
                        result.push(bindings);
                    }
                }
            }
        }
        Grounding::Complete(result)
    }
}

/// Which cover the Chaining renderer expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOrder {
    /// Chain through shared variables from the start.
    #[default]
    Chaining,
    /// Cover the head variables first, then chain through the rest.
    HeadFirst,
}

/// Chaining cover + depth-first search over a guide.
#[derive(Debug)]
pub struct Chaining {
    pub ops: OpLimiter,
    pub order: ChainOrder,
    metrics: Arc<GroundMetrics>,
}

impl Chaining {
    pub fn new(ops: OpLimiter, metrics: Arc<GroundMetrics>) -> Self {
        Self {
            ops,
            order: ChainOrder::default(),
            metrics,
        }
    }

    pub fn with_order(mut self, order: ChainOrder) -> Self {
        self.order = order;
        self
    }

    pub fn apply(
        &mut self,
        rule: &Rule,
        truths: &Facts,
        support: &Support,
        pool: &Pool,
    ) -> Grounding {
        let _span = debug_span!("chaining_render", vars = rule.vars.len()).entered();
        self.ops.begin();
        self.metrics.record_run();

        if rule.is_varless() {
            return Grounding::Complete(apply_varless(rule, truths));
        }

        let terms = pool.terms();
        let positives: Vec<usize> = rule.positives().map(|(i, _)| i).collect();
        let expanders = match self.order {
            ChainOrder::Chaining => chaining_cover(rule, &positives, &rule.vars, terms),
            ChainOrder::HeadFirst => chaining_margin_cover(rule, terms),
        };
        let Some(expanders) = expanders else {
            debug!("chaining_no_cover");
            return Grounding::Complete(Vec::new());
        };
        let check = remaining_atoms(rule, &expanders);
        let space = unification_space(rule, support, &expanders, terms);
        if space_size(&space) == 0 {
            return Grounding::Complete(Vec::new());
        }

        let guide = Guide::build(rule, &expanders, space, pool);
        self.chain(rule, truths, &check, &guide, pool)
    }

    fn chain(
        &mut self,
        rule: &Rule,
        truths: &Facts,
        check: &[Atom],
        guide: &Guide,
        pool: &Pool,
    ) -> Grounding {
        let terms = pool.terms();
        let mut result = Vec::new();
        let mut stack: Vec<SearchState<'_>> = vec![SearchState {
            frame: Frame::new(rule.vars.len()),
            remain: guide.continuations(0, &[]).iter(),
        }];

        while !stack.is_empty() {
            if self.ops.exceeded() {
                self.metrics.record_budget_exhausted();
                debug!(found = result.len(), "chaining_budget_exceeded");
                return Grounding::Partial(result);
            }

            let depth = stack.len();
            let Some(top) = stack.last_mut() else {
                break;
            };
            let Some(next) = top.remain.next() else {
                stack.pop();
                continue;
            };

            // Keys guarantee agreement on shared slots; a conflict here means
            // the candidate disagrees with itself and is simply skipped.
            let Ok(candidate) = top.frame.try_merge(next) else {
                self.metrics.record_conflict();
                continue;
            };
            if !rule.distinct.iter().all(|d| d.holds(&candidate, terms)) {
                self.metrics.record_conflict();
                continue;
            }

            if depth < guide.len() {
                let key = candidate.key(guide.mask(depth));
                let continuations = guide.continuations(depth, &key);
                if continuations.is_empty() {
                    continue;
                }
                self.metrics.record_push(depth as u64 + 1);
                stack.push(SearchState {
                    frame: candidate,
                    remain: continuations.iter(),
                });
                continue;
            }

            let bindings = candidate.to_bindings(&rule.vars);
            if !check_atoms(&bindings, check, truths, pool) {
                self.metrics.record_check_failure();
                continue;
            }
            self.metrics.record_result();
            result.push(bindings);
        }

        Grounding::Complete(result)
    }
}

/// One level of the chaining search: the assignment accumulated above it
/// and the continuations still to try.
struct SearchState<'g> {
    frame: Frame,
    remain: std::slice::Iter<'g, Frame>,
}

type GuideKey = SmallVec<[TermId; 4]>;

/// Per chain step, the candidate frames of that step's atom grouped by
/// their values on the slots already bound by earlier steps.
struct Guide {
    steps: Vec<GuideStep>,
}

struct GuideStep {
    mask: Vec<usize>,
    table: FxHashMap<GuideKey, Vec<Frame>>,
}

impl Guide {
    fn build(rule: &Rule, expanders: &[usize], space: Vec<Vec<Frame>>, pool: &Pool) -> Self {
        let terms = pool.terms();
        let mut bound: Vec<usize> = Vec::new();
        let mut steps = Vec::with_capacity(expanders.len());

        for (&idx, frames) in expanders.iter().zip(space) {
            let atom_slots: Vec<usize> = terms
                .vars_of(rule.body[idx].term)
                .into_iter()
                .filter_map(|v| rule.slot_of(v))
                .collect();
            let mask: Vec<usize> = atom_slots
                .iter()
                .copied()
                .filter(|s| bound.contains(s))
                .collect();

            let mut table: FxHashMap<GuideKey, Vec<Frame>> = FxHashMap::default();
            for frame in frames {
                table.entry(frame.key(&mask)).or_default().push(frame);
            }

            for s in atom_slots {
                if !bound.contains(&s) {
                    bound.push(s);
                }
            }
            steps.push(GuideStep { mask, table });
        }

        Self { steps }
    }

    fn len(&self) -> usize {
        self.steps.len()
    }

    fn mask(&self, step: usize) -> &[usize] {
        &self.steps[step].mask
    }

    fn continuations(&self, step: usize, key: &[TermId]) -> &[Frame] {
        self.steps[step]
            .table
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Ordered children; a child that runs out of budget is replaced by the
/// next one for this and every later call.
#[derive(Debug)]
pub struct Failover {
    pub children: Vec<Renderer>,
    current: usize,
    metrics: Arc<GroundMetrics>,
}

impl Failover {
    /// Children that each keep their own counters; the failover's own
    /// metrics stay empty.
    pub fn new(children: Vec<Renderer>) -> Self {
        Self::with_metrics(children, Arc::default())
    }

    /// `metrics` is reported by [`Renderer::metrics`]; pass the handle the
    /// children were built with to see their counts.
    pub fn with_metrics(children: Vec<Renderer>, metrics: Arc<GroundMetrics>) -> Self {
        Self {
            children,
            current: 0,
            metrics,
        }
    }

    /// Index of the child that will handle the next call.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Every child has run out of budget.
    pub fn failed(&self) -> bool {
        self.current >= self.children.len()
    }

    /// Go back to the first child.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn apply(
        &mut self,
        rule: &Rule,
        truths: &Facts,
        support: &Support,
        pool: &Pool,
    ) -> Grounding {
        let mut last = Vec::new();
        while let Some(child) = self.children.get_mut(self.current) {
            match child.apply(rule, truths, support, pool) {
                Grounding::Partial(partial) => {
                    debug!(child = self.current, "failover_next_child");
                    last = partial;
                    self.current += 1;
                }
                complete => return complete,
            }
        }
        Grounding::Partial(last)
    }
}

/// Body atoms that are not expanders, in body order.
fn remaining_atoms(rule: &Rule, expanders: &[usize]) -> Vec<Atom> {
    rule.body
        .iter()
        .enumerate()
        .filter(|(i, _)| !expanders.contains(i))
        .map(|(_, a)| *a)
        .collect()
}

/// A rule without variables fires iff every body atom's membership in
/// `truths` matches its polarity. The single result is the empty binding.
pub fn apply_varless(rule: &Rule, truths: &Facts) -> Vec<Bindings> {
    if rule.is_varless() && check_ground_atoms(&rule.body, truths) {
        vec![Bindings::new()]
    } else {
        Vec::new()
    }
}

pub fn check_ground_atoms(atoms: &[Atom], truths: &Facts) -> bool {
    atoms.iter().all(|a| truths.contains(&a.term) == a.truth)
}

/// True if every atom, after substitution, is present in `truths` exactly
/// when it is positive.
pub fn check_atoms(bindings: &Bindings, atoms: &[Atom], truths: &Facts, pool: &Pool) -> bool {
    atoms
        .iter()
        .all(|a| truths.contains(&pool.render(a.term, bindings)) == a.truth)
}

/// Instantiate the head once per assignment.
pub fn render_heads<'a>(
    assignments: impl IntoIterator<Item = &'a Bindings>,
    rule: &Rule,
    pool: &Pool,
) -> Facts {
    assignments
        .into_iter()
        .map(|b| pool.render(rule.head.term, b))
        .collect()
}

/// Derive the head from one ground term per positive body atom (in body
/// order), checking negatives and distinct pairs. The bodies are assumed
/// to be true already.
pub fn apply_bodies(rule: &Rule, bodies: &[TermId], truths: &Facts, pool: &Pool) -> Option<TermId> {
    if rule.is_varless() {
        return apply_varless(rule, truths)
            .first()
            .map(|b| pool.render(rule.head.term, b));
    }
    let terms = pool.terms();
    let positives: Vec<TermId> = rule.positives().map(|(_, a)| a.term).collect();
    let bindings = unify_list_vars(&positives, bodies, &rule.vars, terms)?;
    let negatives: Vec<Atom> = rule.negatives().map(|(_, a)| *a).collect();
    if !check_atoms(&bindings, &negatives, truths, pool) {
        return None;
    }
    if !rule.evaluate_distinct(&bindings, terms) {
        return None;
    }
    Some(pool.render(rule.head.term, &bindings))
}

/// Try one value per rule variable, in `rule.vars` order, against the whole
/// body and the distinct pairs.
pub fn apply_vars(rule: &Rule, values: &[TermId], truths: &Facts, pool: &Pool) -> Option<Bindings> {
    if values.len() != rule.vars.len() {
        return None;
    }
    let bindings: Bindings = rule.vars.iter().copied().zip(values.iter().copied()).collect();
    if !check_atoms(&bindings, &rule.body, truths, pool) {
        return None;
    }
    rule.evaluate_distinct(&bindings, pool.terms())
        .then_some(bindings)
}

#[cfg(test)]
#[path = "tests/render.rs"]
mod tests;
