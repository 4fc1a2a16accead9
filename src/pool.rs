//! The interning pool: one place where structural values become canonical
//! `TermId`s.
//!
//! Every term that flows between the unifier, the renderers, the rule index,
//! and the cache must come from the same pool, so that identity comparison
//! of ids is structural comparison of terms.

use crate::symbol::{is_var_name, SymbolStore};
use crate::term::{Children, Term, TermId, TermStore, Tree};
use crate::unify::{replace, Bindings};

/// Shared symbol and term stores.
///
/// `Pool` is `Send + Sync`; wrap it in an `Arc` to share it across threads.
/// Interning a new shape takes a write lock on one shard only.
pub struct Pool {
    symbols: SymbolStore,
    terms: TermStore,
}

impl Pool {
    pub fn new() -> Self {
        Self {
            symbols: SymbolStore::new(),
            terms: TermStore::new(),
        }
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    /// Intern a leaf, classifying it as a variable by the `?` convention.
    pub fn leaf(&self, name: &str) -> TermId {
        let sym = self.symbols.intern(name);
        if is_var_name(name) {
            self.terms.var(sym)
        } else {
            self.terms.name(sym)
        }
    }

    /// Intern an internal node over already-interned children.
    pub fn node(&self, children: impl IntoIterator<Item = TermId>) -> TermId {
        self.terms.node(children.into_iter().collect())
    }

    /// Canonicalize a structural value. Never fails, and returns the same id
    /// for structurally equal input on every call.
    pub fn submerge(&self, tree: &Tree) -> TermId {
        match tree {
            Tree::Leaf(name) => self.leaf(name),
            Tree::Node(children) => {
                let ids: Children = children.iter().map(|c| self.submerge(c)).collect();
                self.terms.node(ids)
            }
        }
    }

    /// Rebuild the structural value behind an id.
    pub fn surface(&self, id: TermId) -> Option<Tree> {
        match self.terms.resolve(id)? {
            Term::Var(sym) | Term::Name(sym) => {
                Some(Tree::Leaf(self.symbols.resolve(sym)?.to_string()))
            }
            Term::Node(children) => children
                .iter()
                .map(|c| self.surface(*c))
                .collect::<Option<Vec<_>>>()
                .map(Tree::Node),
        }
    }

    /// Substitute `bindings` into `term` and return the canonical result.
    pub fn render(&self, term: TermId, bindings: &Bindings) -> TermId {
        replace(term, bindings, &self.terms)
    }

    /// Name of a leaf, or None for internal nodes.
    pub fn name_of(&self, id: TermId) -> Option<&str> {
        let sym = self.terms.symbol(id)?;
        self.symbols.resolve(sym)
    }

    /// Prefix-notation rendering, for diagnostics and logs.
    pub fn display(&self, id: TermId) -> String {
        self.surface(id)
            .map(|tree| tree.to_string())
            .unwrap_or_else(|| format!("<unknown term {}>", id.raw()))
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/pool.rs"]
mod tests;
