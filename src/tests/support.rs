use super::*;
use crate::test_utils::{facts, rule, setup, term};

#[test]
fn naive_support_gives_every_fact_to_every_positive() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x) (not (q ?x)) (r ?x))");
    let truths = facts(&pool, &["(p a)", "(r b)", "(q c)"]);
    let support = naive_support(&r, &truths);

    assert_eq!(support.get(0).len(), 3);
    assert!(support.get(1).is_empty(), "negative atoms get no support");
    assert_eq!(support.get(2).len(), 3);
}

#[test]
fn filtered_support_keeps_only_unifying_facts() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x) (r ?x b))");
    let truths = facts(&pool, &["(p a)", "(p c)", "(r a b)", "(r a c)", "(s a)"]);
    let support = filtered_support(&r, &truths, pool.terms());

    let mut p = support.get(0).to_vec();
    p.sort();
    let mut expected = vec![term(&pool, "(p a)"), term(&pool, "(p c)")];
    expected.sort();
    assert_eq!(p, expected);
    assert_eq!(support.get(1), &[term(&pool, "(r a b)")]);

    let sizes = support.sizes();
    assert_eq!(sizes.get(&0), Some(&2));
    assert_eq!(sizes.get(&1), Some(&1));
}

#[test]
fn extend_dedupes() {
    let pool = setup();
    let a = term(&pool, "(p a)");
    let mut support = Support::new();
    support.extend(0, [a, a]);
    support.extend(0, [a]);
    assert_eq!(support.get(0), &[a]);
    assert!(!support.is_empty());
}

#[test]
fn missing_index_is_empty() {
    let support = Support::new();
    assert!(support.get(7).is_empty());
    assert!(support.is_empty());
}

#[test]
fn unification_space_builds_frames_per_expander() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x ?y) (p ?x) (q ?x ?y))");
    let truths = facts(&pool, &["(p a)", "(p b)", "(q a c)"]);
    let support = filtered_support(&r, &truths, pool.terms());

    let space = unification_space(&r, &support, &[1, 0], pool.terms());
    assert_eq!(space.len(), 2);
    assert_eq!(space[0].len(), 1);
    assert_eq!(space[1].len(), 2);

    let q = &space[0][0];
    assert_eq!(q.get(0), Some(term(&pool, "a")));
    assert_eq!(q.get(1), Some(term(&pool, "c")));
}

#[test]
fn unification_space_drops_non_unifying_candidates() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x ?x))");
    let truths = facts(&pool, &["(p a a)", "(p a b)"]);
    let support = naive_support(&r, &truths);

    let space = unification_space(&r, &support, &[0], pool.terms());
    assert_eq!(space[0].len(), 1);
}
