use super::*;
use crate::test_utils::{bindings, facts, rule, setup, sorted, term};

fn ground_with(renderer: &mut Renderer, rule: &Rule, truths: &Facts, pool: &Pool) -> Grounding {
    renderer.ground(rule, truths, pool)
}

fn standard(pool: &Pool, rule: &Rule, truths: &Facts) -> Vec<Bindings> {
    let g = ground_with(&mut Renderer::standard(), rule, truths, pool);
    assert!(g.is_complete());
    sorted(g.into_bindings())
}

fn chaining(pool: &Pool, rule: &Rule, truths: &Facts) -> Vec<Bindings> {
    let g = ground_with(&mut Renderer::chaining(), rule, truths, pool);
    assert!(g.is_complete());
    sorted(g.into_bindings())
}

const EDGES: &[&str] = &["(e a b)", "(e b c)", "(e c d)", "(e d b)", "(e a c)"];

// ========== VARLESS ==========

#[test]
fn varless_positive_fires_iff_present() {
    let pool = setup();
    let r = rule(&pool, "(<= go (p a))");
    let with = facts(&pool, &["(p a)"]);
    let without = facts(&pool, &["(p b)"]);

    assert_eq!(standard(&pool, &r, &with), vec![Bindings::new()]);
    assert!(standard(&pool, &r, &without).is_empty());
    assert_eq!(chaining(&pool, &r, &with), vec![Bindings::new()]);
}

#[test]
fn varless_negative_fires_iff_absent() {
    let pool = setup();
    let r = rule(&pool, "(<= go (not (p a)))");
    assert!(standard(&pool, &r, &facts(&pool, &["(p a)"])).is_empty());
    assert_eq!(
        standard(&pool, &r, &facts(&pool, &["(p b)"])),
        vec![Bindings::new()]
    );
}

// ========== DISTINCT ==========

#[test]
fn distinct_rejects_equal_ground_sides() {
    let pool = setup();
    let r = rule(&pool, "(<= (p ?x) (q ?x) (distinct ?x a))");

    let qa = facts(&pool, &["(q a)"]);
    assert!(standard(&pool, &r, &qa).is_empty());
    assert!(chaining(&pool, &r, &qa).is_empty());

    let qb = facts(&pool, &["(q b)"]);
    let expected = vec![bindings(&pool, &[("?x", "b")])];
    assert_eq!(standard(&pool, &r, &qb), expected);
    assert_eq!(chaining(&pool, &r, &qb), expected);
}

#[test]
fn distinct_between_variables() {
    let pool = setup();
    let r = rule(&pool, "(<= (pair ?x ?y) (q ?x) (q ?y) (distinct ?x ?y))");
    let truths = facts(&pool, &["(q a)", "(q b)"]);
    let expected = sorted(vec![
        bindings(&pool, &[("?x", "a"), ("?y", "b")]),
        bindings(&pool, &[("?x", "b"), ("?y", "a")]),
    ]);
    assert_eq!(standard(&pool, &r, &truths), expected);
    assert_eq!(chaining(&pool, &r, &truths), expected);
}

// ========== JOINS ==========

#[test]
fn two_hop_join() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, &["(e a b)", "(e b c)", "(e c d)"]);
    let expected = sorted(vec![
        bindings(&pool, &[("?x", "a"), ("?y", "b"), ("?z", "c")]),
        bindings(&pool, &[("?x", "b"), ("?y", "c"), ("?z", "d")]),
    ]);
    assert_eq!(standard(&pool, &r, &truths), expected);
    assert_eq!(chaining(&pool, &r, &truths), expected);
}

#[test]
fn standard_and_chaining_agree_on_chains() {
    let pool = setup();
    let truths = facts(&pool, EDGES);
    for src in [
        "(<= (hop3 ?a ?d) (e ?a ?b) (e ?b ?c) (e ?c ?d))",
        "(<= (tri ?a) (e ?a ?b) (e ?b ?c) (e ?c ?a))",
        "(<= (fan ?a) (e ?a ?b) (e ?a ?c) (distinct ?b ?c))",
        "(<= (self ?a) (e ?a ?a))",
    ] {
        let r = rule(&pool, src);
        assert_eq!(standard(&pool, &r, &truths), chaining(&pool, &r, &truths), "{}", src);
    }
}

#[test]
fn head_first_chaining_agrees() {
    let pool = setup();
    let truths = facts(&pool, EDGES);
    let r = rule(&pool, "(<= (hop3 ?d) (e ?a ?b) (e ?b ?c) (e ?c ?d))");
    let mut head_first = Renderer::Chaining(
        Chaining::new(OpLimiter::unbounded(), Arc::default()).with_order(ChainOrder::HeadFirst),
    );
    let g = head_first.ground(&r, &truths, &pool);
    assert!(g.is_complete());
    assert_eq!(sorted(g.into_bindings()), standard(&pool, &r, &truths));
}

#[test]
fn negative_atoms_are_checked() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x) (not (q ?x)))");
    let truths = facts(&pool, &["(p a)", "(p b)", "(q a)"]);
    let expected = vec![bindings(&pool, &[("?x", "b")])];
    assert_eq!(standard(&pool, &r, &truths), expected);
    assert_eq!(chaining(&pool, &r, &truths), expected);
}

#[test]
fn positive_check_atoms_are_checked() {
    let pool = setup();
    // Once (r ?x ?y) covers everything, (p ?x) and (q ?y) are only checks.
    let r = rule(&pool, "(<= (h ?x ?y) (p ?x) (q ?y) (r ?x ?y))");
    let truths = facts(&pool, &["(p a)", "(q b)", "(r a b)", "(r a c)", "(p z)", "(q y)", "(q z)"]);
    let mut support = Support::new();
    support.extend(0, [term(&pool, "(p a)"), term(&pool, "(p z)")]);
    support.extend(1, [term(&pool, "(q b)"), term(&pool, "(q y)"), term(&pool, "(q z)")]);
    support.extend(2, [term(&pool, "(r a b)"), term(&pool, "(r a c)")]);

    let g = Renderer::standard().apply(&r, &truths, &support, &pool);
    assert_eq!(
        sorted(g.into_bindings()),
        vec![bindings(&pool, &[("?x", "a"), ("?y", "b")])]
    );
}

#[test]
fn empty_support_is_complete_and_empty() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x))");
    let g = Renderer::standard().ground(&r, &Facts::default(), &pool);
    assert_eq!(g, Grounding::Complete(Vec::new()));
    let g = Renderer::chaining().ground(&r, &Facts::default(), &pool);
    assert_eq!(g, Grounding::Complete(Vec::new()));
}

#[test]
fn uncoverable_rule_is_complete_and_empty() {
    let pool = setup();
    // ?y only appears negatively, so no positive cover exists.
    let r = rule(&pool, "(<= (h ?x) (p ?x) (not (q ?y)))");
    let truths = facts(&pool, &["(p a)"]);
    assert_eq!(
        Renderer::standard().ground(&r, &truths, &pool),
        Grounding::Complete(Vec::new())
    );
    assert_eq!(
        Renderer::chaining().ground(&r, &truths, &pool),
        Grounding::Complete(Vec::new())
    );
}

// ========== BUDGETS ==========

#[test]
fn standard_budget_is_monotone() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let support = filtered_support(&r, &truths, pool.terms());

    let mut previous: Vec<Bindings> = Vec::new();
    for budget in 0..40 {
        let mut renderer =
            Renderer::Standard(Standard::new(OpLimiter::bounded(budget), Arc::default()));
        let found = sorted(renderer.apply(&r, &truths, &support, &pool).into_bindings());
        for b in &previous {
            assert!(found.contains(b), "budget {} lost a result", budget);
        }
        previous = found;
    }
    assert_eq!(previous, standard(&pool, &r, &truths));
}

#[test]
fn zero_budget_is_partial() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x))");
    let truths = facts(&pool, &["(p a)"]);
    let mut renderer = Renderer::Standard(Standard::new(OpLimiter::bounded(0), Arc::default()));
    let g = renderer.ground(&r, &truths, &pool);
    assert_eq!(g, Grounding::Partial(Vec::new()));
    assert!(renderer.failed());
}

#[test]
fn chaining_budget_is_partial() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let mut renderer = Renderer::Chaining(Chaining::new(OpLimiter::bounded(2), Arc::default()));
    let g = renderer.ground(&r, &truths, &pool);
    assert!(!g.is_complete());
    assert!(renderer.failed());
}

// ========== FAILOVER ==========

#[test]
fn failover_falls_back_and_sticks() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let config = RenderConfig {
        standard_budget: 1,
        chaining_budget: None,
    };
    let mut renderer = Renderer::failover(&config);

    let g = renderer.ground(&r, &truths, &pool);
    assert!(g.is_complete());
    assert_eq!(sorted(g.into_bindings()), standard(&pool, &r, &truths));

    let Renderer::Failover(failover) = &renderer else {
        panic!("expected failover");
    };
    assert_eq!(failover.current(), 1, "standard ran out, chaining took over");
    assert!(!renderer.failed());

    // A trivial rule now goes straight to chaining.
    let easy = rule(&pool, "(<= (h ?x) (p ?x))");
    let g = renderer.ground(&easy, &facts(&pool, &["(p a)"]), &pool);
    assert!(g.is_complete());
    let Renderer::Failover(failover) = &renderer else {
        panic!("expected failover");
    };
    assert_eq!(failover.current(), 1);
}

#[test]
fn failover_stays_on_first_child_when_it_completes() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x))");
    let mut renderer = Renderer::failover(&RenderConfig::default());
    let g = renderer.ground(&r, &facts(&pool, &["(p a)", "(p b)"]), &pool);
    assert_eq!(g.len(), 2);
    let Renderer::Failover(failover) = &renderer else {
        panic!("expected failover");
    };
    assert_eq!(failover.current(), 0);
}

#[test]
fn failover_exhausted_is_partial() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let config = RenderConfig {
        standard_budget: 0,
        chaining_budget: Some(0),
    };
    let mut renderer = Renderer::failover(&config);
    let g = renderer.ground(&r, &truths, &pool);
    assert!(!g.is_complete());
    assert!(renderer.failed());

    if let Renderer::Failover(failover) = &mut renderer {
        failover.reset();
        assert_eq!(failover.current(), 0);
    }
    assert!(!renderer.failed());
}

#[test]
fn empty_failover_reports_metrics_and_partial() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x) (p ?x))");
    let truths = facts(&pool, &["(p a)"]);

    let mut renderer = Renderer::Failover(Failover::new(Vec::new()));
    assert_eq!(
        renderer.metrics().report(),
        crate::metrics::MetricsReport::default()
    );

    let g = renderer.ground(&r, &truths, &pool);
    assert_eq!(g, Grounding::Partial(Vec::new()));
    assert!(renderer.failed());
}

#[cfg(feature = "tracing")]
#[test]
fn failover_metrics_count_both_children() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let config = RenderConfig {
        standard_budget: 0,
        chaining_budget: None,
    };
    let mut renderer = Renderer::failover(&config);
    assert!(renderer.ground(&r, &truths, &pool).is_complete());
    assert_eq!(renderer.metrics().report().runs, 2);
    assert_eq!(renderer.metrics().report().budget_exhausted, 1);
}

// ========== HELPERS ==========

#[test]
fn render_heads_instantiates_head() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, &["(e a b)", "(e b c)"]);
    let g = Renderer::standard().ground(&r, &truths, &pool);
    let heads = render_heads(g.bindings(), &r, &pool);
    assert_eq!(heads, facts(&pool, &["(hop2 a c)"]));
}

#[test]
fn apply_bodies_derives_head() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (not (blocked ?y)) (e ?y ?z))");
    let bodies = [term(&pool, "(e a b)"), term(&pool, "(e b c)")];

    let truths = facts(&pool, &["(e a b)", "(e b c)"]);
    assert_eq!(
        apply_bodies(&r, &bodies, &truths, &pool),
        Some(term(&pool, "(hop2 a c)"))
    );

    let blocked = facts(&pool, &["(e a b)", "(e b c)", "(blocked b)"]);
    assert_eq!(apply_bodies(&r, &bodies, &blocked, &pool), None);

    let mismatched = [term(&pool, "(e a b)"), term(&pool, "(e c d)")];
    assert_eq!(apply_bodies(&r, &mismatched, &truths, &pool), None);
}

#[test]
fn apply_vars_checks_whole_body() {
    let pool = setup();
    let r = rule(&pool, "(<= (h ?x ?y) (p ?x) (q ?y) (distinct ?x ?y))");
    let truths = facts(&pool, &["(p a)", "(q b)", "(q a)"]);
    let (a, b) = (term(&pool, "a"), term(&pool, "b"));

    assert_eq!(
        apply_vars(&r, &[a, b], &truths, &pool),
        Some(bindings(&pool, &[("?x", "a"), ("?y", "b")]))
    );
    assert_eq!(apply_vars(&r, &[a, a], &truths, &pool), None, "distinct");
    assert_eq!(apply_vars(&r, &[b, b], &truths, &pool), None, "(p b) missing");
    assert_eq!(apply_vars(&r, &[a], &truths, &pool), None, "wrong arity");
}

#[test]
fn apply_varless_helper() {
    let pool = setup();
    let r = rule(&pool, "(<= go (p a) (not (q a)))");
    assert_eq!(apply_varless(&r, &facts(&pool, &["(p a)"])).len(), 1);
    assert!(apply_varless(&r, &facts(&pool, &["(p a)", "(q a)"])).is_empty());
}

#[cfg(feature = "tracing")]
#[test]
fn metrics_count_results() {
    let pool = setup();
    let r = rule(&pool, "(<= (hop2 ?x ?z) (e ?x ?y) (e ?y ?z))");
    let truths = facts(&pool, EDGES);
    let mut renderer = Renderer::standard();
    let g = renderer.ground(&r, &truths, &pool);
    let report = renderer.metrics().report();
    assert_eq!(report.runs, 1);
    assert_eq!(report.results, g.len() as u64);
    assert!(report.combinations >= report.results);
}
