use crate::kif::{parse_atom, parse_program, parse_rule, parse_term};
use crate::pool::Pool;
use crate::rule::{Atom, Rule};
use crate::support::Facts;
use crate::term::TermId;
use crate::unify::Bindings;

pub(crate) fn setup() -> Pool {
    Pool::new()
}

pub(crate) fn term(pool: &Pool, src: &str) -> TermId {
    parse_term(src, pool).expect("test term should parse")
}

pub(crate) fn atom(pool: &Pool, src: &str) -> Atom {
    parse_atom(src, pool).expect("test atom should parse")
}

pub(crate) fn rule(pool: &Pool, src: &str) -> Rule {
    parse_rule(src, pool).expect("test rule should parse")
}

pub(crate) fn facts(pool: &Pool, srcs: &[&str]) -> Facts {
    srcs.iter().map(|s| term(pool, s)).collect()
}

/// Parse a program and return its rules and facts.
pub(crate) fn program(pool: &Pool, src: &str) -> (Vec<Rule>, Facts) {
    let program = parse_program(src, pool).expect("test program should parse");
    (program.rules, program.facts.into_iter().collect())
}

/// `pairs` of (variable, value) source text as bindings.
pub(crate) fn bindings(pool: &Pool, pairs: &[(&str, &str)]) -> Bindings {
    pairs
        .iter()
        .map(|(var, value)| (term(pool, var), term(pool, value)))
        .collect()
}

/// Results as a sorted list, for order-insensitive comparison.
pub(crate) fn sorted(mut results: Vec<Bindings>) -> Vec<Bindings> {
    results.sort();
    results.dedup();
    results
}
