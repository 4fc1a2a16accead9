use super::*;
use crate::test_utils::{facts, program, setup, term};

const CLOSURE: &str = "
    (<= (path ?x ?y) (edge ?x ?y))
    (<= (path ?x ?z) (edge ?x ?y) (path ?y ?z))
    (edge a b)
    (edge b c)
    (edge c d)
";

fn prove(pool: &Pool, src: &str, config: ForwardConfig) -> Proof {
    let (rules, input) = program(pool, src);
    let ruletta = Ruletta::new(rules, pool).unwrap();
    let mut forward = StratifiedForward::new(&ruletta, pool, config);
    forward.prove(&input, pool)
}

fn derived(pool: &Pool, proof: &Proof, functor: &str) -> Vec<String> {
    let mut out: Vec<String> = proof
        .facts
        .iter()
        .map(|&f| pool.display(f))
        .filter(|s| s.starts_with(&format!("({} ", functor)))
        .collect();
    out.sort();
    out
}

// ========== RECURSION ==========

#[test]
fn transitive_closure_reaches_fixpoint() {
    let pool = setup();
    let proof = prove(&pool, CLOSURE, ForwardConfig::default());

    assert!(proof.complete);
    assert_eq!(
        derived(&pool, &proof, "path"),
        vec![
            "(path a b)",
            "(path a c)",
            "(path a d)",
            "(path b c)",
            "(path b d)",
            "(path c d)",
        ]
    );
    // One round for the base rule; three for the recursive one, the last
    // deriving nothing.
    assert_eq!(proof.rounds, 4);
}

#[test]
fn input_facts_are_kept() {
    let pool = setup();
    let proof = prove(&pool, CLOSURE, ForwardConfig::default());
    for f in ["(edge a b)", "(edge b c)", "(edge c d)"] {
        assert!(proof.facts.contains(&term(&pool, f)));
    }
    assert_eq!(proof.facts.len(), 9);
}

#[test]
fn round_limit_marks_proof_incomplete() {
    let pool = setup();
    let config = ForwardConfig {
        max_rounds: 1,
        ..ForwardConfig::default()
    };
    let proof = prove(&pool, CLOSURE, config);

    assert!(!proof.complete);
    let paths = derived(&pool, &proof, "path");
    assert_eq!(paths.len(), 5);
    assert!(!paths.contains(&"(path a d)".to_string()));
}

// ========== NEGATION ==========

#[test]
fn negation_sees_completed_lower_strata() {
    let pool = setup();
    let proof = prove(
        &pool,
        "
        (<= (path ?x ?y) (edge ?x ?y))
        (<= (path ?x ?z) (edge ?x ?y) (path ?y ?z))
        (<= (cut ?x ?y) (node ?x) (node ?y) (not (path ?x ?y)) (distinct ?x ?y))
        (node a) (node b) (node c)
        (edge a b) (edge b c)
        ",
        ForwardConfig::default(),
    );

    assert!(proof.complete);
    assert_eq!(
        derived(&pool, &proof, "cut"),
        vec!["(cut b a)", "(cut c a)", "(cut c b)"]
    );
}

#[test]
fn mutual_recursion_in_one_stratum() {
    let pool = setup();
    let proof = prove(
        &pool,
        "
        (<= (even ?x) (zero ?x))
        (<= (odd ?y) (succ ?x ?y) (even ?x))
        (<= (even ?y) (succ ?x ?y) (odd ?x))
        (zero n0)
        (succ n0 n1) (succ n1 n2) (succ n2 n3) (succ n3 n4)
        ",
        ForwardConfig::default(),
    );

    assert!(proof.complete);
    assert_eq!(
        derived(&pool, &proof, "even"),
        vec!["(even n0)", "(even n2)", "(even n4)"]
    );
    assert_eq!(derived(&pool, &proof, "odd"), vec!["(odd n1)", "(odd n3)"]);
}

// ========== SESSIONS ==========

#[test]
fn prove_starts_fresh_each_call() {
    let pool = setup();
    let (rules, _) = program(&pool, CLOSURE);
    let ruletta = Ruletta::new(rules, &pool).unwrap();
    let mut forward = StratifiedForward::new(&ruletta, &pool, ForwardConfig::default());

    let long = forward.prove(&facts(&pool, &["(edge a b)", "(edge b c)"]), &pool);
    assert_eq!(derived(&pool, &long, "path").len(), 3);

    let short = forward.prove(&facts(&pool, &["(edge x y)"]), &pool);
    assert_eq!(derived(&pool, &short, "path"), vec!["(path x y)"]);
}

#[test]
fn no_facts_derive_nothing() {
    let pool = setup();
    let (rules, _) = program(&pool, CLOSURE);
    let ruletta = Ruletta::new(rules, &pool).unwrap();
    let mut forward = StratifiedForward::new(&ruletta, &pool, ForwardConfig::default());
    assert_eq!(forward.stratification().strata.len(), 2);

    let proof = forward.prove(&Facts::default(), &pool);
    assert!(proof.facts.is_empty());
    assert!(proof.complete);
    assert_eq!(proof.rounds, 2);
}
