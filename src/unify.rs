use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;
use std::collections::BTreeMap;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Variable leaf → bound value. Ordered so that result sets compare and
/// print deterministically.
pub type Bindings = BTreeMap<TermId, TermId>;

/// Walk `pattern` and `ground` in lock-step.
///
/// `bind(var, value)` is offered every pattern leaf before any structural
/// comparison. It returns `None` if the leaf is not bindable, `Some(true)` if
/// the binding was accepted, and `Some(false)` on a conflicting binding.
///
/// Uses an explicit worklist; children are visited left to right.
pub(crate) fn match_with(
    pattern: TermId,
    ground: TermId,
    terms: &TermStore,
    mut bind: impl FnMut(TermId, TermId) -> Option<bool>,
) -> bool {
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((pattern, ground));

    while let Some((p, g)) = worklist.pop() {
        match bind(p, g) {
            Some(true) => continue,
            Some(false) => {
                #[cfg(feature = "tracing")]
                trace!(var = p.raw(), "unify_binding_conflict");
                return false;
            }
            None => {}
        }

        match (terms.resolve(p), terms.resolve(g)) {
            (Some(Term::Node(pc)), Some(Term::Node(gc))) => {
                if pc.len() != gc.len() {
                    #[cfg(feature = "tracing")]
                    trace!("unify_arity_mismatch");
                    return false;
                }
                for pair in pc.iter().copied().zip(gc.iter().copied()).rev() {
                    worklist.push(pair);
                }
            }
            (Some(Term::Node(_)), Some(_)) | (Some(_), Some(Term::Node(_))) => {
                #[cfg(feature = "tracing")]
                trace!("unify_shape_mismatch");
                return false;
            }
            // Two leaves: hashconsing makes name equality id equality.
            (Some(_), Some(_)) => {
                if p != g {
                    return false;
                }
            }
            _ => return false,
        }
    }

    true
}

fn bind_into(bindings: &mut Bindings, var: TermId, value: TermId) -> bool {
    match bindings.get(&var) {
        Some(&bound) => bound == value,
        None => {
            bindings.insert(var, value);
            true
        }
    }
}

/// Find bindings for the variables of `pattern` that make it identical to
/// `ground`. Only pattern variables are bindable; leaves of `ground` are
/// compared literally.
pub fn unify(pattern: TermId, ground: TermId, terms: &TermStore) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    let ok = match_with(pattern, ground, terms, |p, g| {
        terms.is_var(p).then(|| bind_into(&mut bindings, p, g))
    });
    ok.then_some(bindings)
}

/// Like [`unify`], but only leaves listed in `vars` are bindable. Any other
/// leaf, variable-looking or not, must match literally.
pub fn unify_vars(
    pattern: TermId,
    ground: TermId,
    vars: &[TermId],
    terms: &TermStore,
) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    unify_vars_into(pattern, ground, vars, terms, &mut bindings).then_some(bindings)
}

fn unify_vars_into(
    pattern: TermId,
    ground: TermId,
    vars: &[TermId],
    terms: &TermStore,
    bindings: &mut Bindings,
) -> bool {
    match_with(pattern, ground, terms, |p, g| {
        vars.contains(&p).then(|| bind_into(bindings, p, g))
    })
}

/// Unify two parallel lists against one shared set of bindings, stopping at
/// the first conflict. Lists of different lengths never unify.
pub fn unify_list_vars(
    patterns: &[TermId],
    grounds: &[TermId],
    vars: &[TermId],
    terms: &TermStore,
) -> Option<Bindings> {
    if patterns.len() != grounds.len() {
        return None;
    }
    let mut bindings = Bindings::new();
    for (&p, &g) in patterns.iter().zip(grounds) {
        if !unify_vars_into(p, g, vars, terms, &mut bindings) {
            return None;
        }
    }
    Some(bindings)
}

/// Substitute every bound variable leaf of `term` with its value.
/// The result is interned in `terms`. Values are not substituted again.
///
/// Uses an explicit stack to avoid recursion.
pub fn replace(term: TermId, bindings: &Bindings, terms: &TermStore) -> TermId {
    if bindings.is_empty() {
        return term;
    }

    // (term, children_done)
    let mut work_stack: Vec<(TermId, bool)> = vec![(term, false)];
    let mut result_stack: Vec<TermId> = Vec::new();

    while let Some((tid, children_done)) = work_stack.pop() {
        if let Some(&value) = bindings.get(&tid) {
            result_stack.push(value);
            continue;
        }
        match terms.resolve(tid) {
            Some(Term::Node(children)) if !children.is_empty() => {
                if children_done {
                    let n = children.len();
                    let rebuilt: SmallVec<[TermId; 4]> =
                        result_stack.drain(result_stack.len() - n..).collect();
                    // Unchanged subtrees keep their id without another lookup.
                    if rebuilt == children {
                        result_stack.push(tid);
                    } else {
                        result_stack.push(terms.node(rebuilt));
                    }
                } else {
                    work_stack.push((tid, true));
                    for child in children.iter().rev() {
                        work_stack.push((*child, false));
                    }
                }
            }
            _ => result_stack.push(tid),
        }
    }

    debug_assert_eq!(result_stack.len(), 1);
    result_stack.pop().unwrap_or(term)
}

/// Conservative check that `a` and `b` could be made equal by some
/// substitution, treating a variable on either side as a wildcard.
/// Variables of the two sides live in separate namespaces and repeated
/// variables are not checked for consistency, so this may say yes where
/// full unification would say no, but never the reverse.
pub fn may_unify(a: TermId, b: TermId, terms: &TermStore) -> bool {
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((a, b));

    while let Some((x, y)) = worklist.pop() {
        if x == y {
            continue;
        }
        match (terms.resolve(x), terms.resolve(y)) {
            (Some(Term::Var(_)), Some(_)) | (Some(_), Some(Term::Var(_))) => continue,
            (Some(Term::Node(xc)), Some(Term::Node(yc))) => {
                if xc.len() != yc.len() {
                    return false;
                }
                worklist.extend(xc.iter().copied().zip(yc.iter().copied()));
            }
            _ => return false,
        }
    }

    true
}
