//! Rule-set index and stratifier.
//!
//! A [`Ruletta`] is built once per rule set. It validates every rule, keeps
//! head and body indices, derives the rule dependency graph, and orders the
//! rules into strata for evaluation.

use crate::frame::Frame;
use crate::pool::Pool;
use crate::rule::{Rule, RuleError};
use crate::term::TermId;
use crate::topper::{general_top_sort, strongly_connected, Digraph};
use crate::trace::debug;
use crate::unify::may_unify;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Index of a rule inside its [`Ruletta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Ruletta {
    /// Distinct rules, in first-seen order; `RuleId(i)` is `all_rules[i]`.
    pub all_rules: Vec<Rule>,
    pub all_vars: FxHashSet<TermId>,
    /// Every term and sub-term appearing anywhere in the rules.
    pub all_terms: FxHashSet<TermId>,
    pub pos_terms: FxHashSet<TermId>,
    pub neg_terms: FxHashSet<TermId>,
    pub body_to_rule: FxHashMap<TermId, Vec<RuleId>>,
    pub head_to_rule: FxHashMap<TermId, Vec<RuleId>>,
    graph: Digraph<RuleId>,
}

impl Ruletta {
    /// Index `rules`, rejecting negative heads and unsafe rules.
    pub fn new(rules: impl IntoIterator<Item = Rule>, pool: &Pool) -> Result<Self, RuleError> {
        let terms = pool.terms();

        let mut all_rules: Vec<Rule> = Vec::new();
        let mut seen: FxHashSet<Rule> = FxHashSet::default();
        for rule in rules {
            if !rule.head.truth {
                return Err(RuleError::NegativeHead {
                    head: rule.head.term,
                });
            }
            if let Some(&var) = rule.unsafe_vars(terms).first() {
                return Err(RuleError::UnsafeVariable {
                    head: rule.head.term,
                    var,
                });
            }
            if seen.insert(rule.clone()) {
                all_rules.push(rule);
            }
        }

        let mut ruletta = Self {
            all_rules,
            all_vars: FxHashSet::default(),
            all_terms: FxHashSet::default(),
            pos_terms: FxHashSet::default(),
            neg_terms: FxHashSet::default(),
            body_to_rule: FxHashMap::default(),
            head_to_rule: FxHashMap::default(),
            graph: Digraph::new(),
        };

        for (i, rule) in ruletta.all_rules.iter().enumerate() {
            let id = RuleId(i);
            ruletta.all_vars.extend(rule.vars.iter().copied());
            for root in rule.terms() {
                ruletta.all_terms.extend(terms.full_iter(root));
            }
            for atom in std::iter::once(&rule.head).chain(&rule.body) {
                if atom.truth {
                    ruletta.pos_terms.insert(atom.term);
                } else {
                    ruletta.neg_terms.insert(atom.term);
                }
            }
            push_unique(ruletta.head_to_rule.entry(rule.head.term).or_default(), id);
            for atom in &rule.body {
                push_unique(ruletta.body_to_rule.entry(atom.term).or_default(), id);
            }
        }

        ruletta.graph = ruletta.build_graph(pool);
        debug!(
            rules = ruletta.all_rules.len(),
            edges = ruletta.graph.edge_count(),
            "ruletta_built"
        );
        Ok(ruletta)
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.all_rules[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.all_rules.len()).map(RuleId)
    }

    pub fn len(&self) -> usize {
        self.all_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_rules.is_empty()
    }

    /// Edge A→B iff A's head may unify with some body term of B.
    fn build_graph(&self, pool: &Pool) -> Digraph<RuleId> {
        let terms = pool.terms();
        let mut graph = Digraph::new();
        for a in self.ids() {
            graph.add_node(a);
            let head = self.rule(a).head.term;
            for (&body, users) in &self.body_to_rule {
                if may_unify(head, body, terms) {
                    for &b in users {
                        graph.add_edge(a, b);
                    }
                }
            }
        }
        graph
    }

    pub fn dependency_graph(&self) -> &Digraph<RuleId> {
        &self.graph
    }

    /// Rules with a body atom that `ground` unifies with.
    pub fn affected_rules(&self, ground: TermId, pool: &Pool) -> Vec<RuleId> {
        let terms = pool.terms();
        let mut out: Vec<RuleId> = Vec::new();
        for (&body, users) in &self.body_to_rule {
            for &id in users {
                if !out.contains(&id)
                    && Frame::unify(body, ground, &self.rule(id).vars, terms).is_some()
                {
                    out.push(id);
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Group rules into strongly connected strata and number them so that
    /// every stratum comes after everything it depends on.
    pub fn stratify(&self) -> Stratification {
        let components = strongly_connected(&self.graph);
        let member_of: FxHashMap<RuleId, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.iter().map(move |&r| (r, i)))
            .collect();

        // One root per component that nothing outside it depends on, so
        // that pure cycles are reached too.
        let mut has_outside_pred = vec![false; components.len()];
        for (from, to) in self.graph.edges() {
            if member_of[&from] != member_of[&to] {
                has_outside_pred[member_of[&to]] = true;
            }
        }
        let roots = components
            .iter()
            .zip(&has_outside_pred)
            .filter(|&(_, &has)| !has)
            .map(|(c, _)| c[0]);

        let generations = general_top_sort(&self.graph, roots);

        let mut strata: Vec<Stratum> = components
            .into_iter()
            .map(|rules| {
                let generation = generations.get(&rules[0]).copied().unwrap_or(0);
                let recursive = rules.len() > 1 || self.graph.contains_edge(rules[0], rules[0]);
                Stratum {
                    rules,
                    generation,
                    recursive,
                }
            })
            .collect();
        strata.sort_by_key(|s| (s.generation, s.rules[0]));

        debug!(strata = strata.len(), "ruletta_stratified");
        Stratification { strata }
    }
}

fn push_unique(list: &mut Vec<RuleId>, id: RuleId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// A group of mutually recursive rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stratum {
    /// Sorted member rules.
    pub rules: Vec<RuleId>,
    pub generation: usize,
    /// More than one rule, or one rule that feeds itself.
    pub recursive: bool,
}

/// Strata in ascending generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stratification {
    pub strata: Vec<Stratum>,
}

impl Stratification {
    pub fn generation_of(&self, rule: RuleId) -> Option<usize> {
        self.stratum_of(rule).map(|s| s.generation)
    }

    pub fn stratum_of(&self, rule: RuleId) -> Option<&Stratum> {
        self.strata.iter().find(|s| s.rules.contains(&rule))
    }

    /// Number of distinct generations.
    pub fn depth(&self) -> usize {
        self.strata.last().map_or(0, |s| s.generation + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stratum> {
        self.strata.iter()
    }
}

#[cfg(test)]
#[path = "tests/ruletta.rs"]
mod tests;
