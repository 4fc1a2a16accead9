use crate::symbol::Symbol;
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique identifier for a term in the term store.
/// Two ids from the same store are equal iff the terms are structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Children of an internal node.
pub type Children = SmallVec<[TermId; 4]>;

/// A term is a named leaf or an internal node with ordered children.
///
/// Leaves whose name starts with `?` are variables; every other leaf is a
/// constant. Internal nodes carry no name of their own: `(p a b)` is a node
/// whose first child is the leaf `p`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Symbol),
    Name(Symbol),
    Node(Children),
}

impl Term {
    pub fn is_terminal(&self) -> bool {
        match self {
            Term::Var(_) | Term::Name(_) => true,
            Term::Node(children) => children.is_empty(),
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Term::Var(sym) | Term::Name(sym) => Some(*sym),
            Term::Node(_) => None,
        }
    }
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Thread-safe term store with hashconsing.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - TermId can be resolved back to the term
/// - Terms are never mutated or removed once stored
pub struct TermStore {
    /// Central storage of all terms, indexed by TermId.
    nodes: RwLock<Vec<Term>>,
    /// Sharded hashcons maps so first sightings of unrelated shapes
    /// do not contend on one lock.
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
    next_id: AtomicU32,
}

impl TermStore {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            nodes: RwLock::new(Vec::new()),
            shards,
            next_id: AtomicU32::new(0),
        }
    }

    /// Intern a term, returning its TermId.
    /// If the term already exists, returns the existing TermId.
    pub fn intern(&self, term: Term) -> TermId {
        let shard = &self.shards[Self::shard_index(&term)];

        // Fast path: read lock only
        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        let mut map = shard.write();

        // Double-check after acquiring write lock
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = TermId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut nodes = self.nodes.write();
            let idx = id.0 as usize;
            // Ids from other shards may have been handed out but not yet stored.
            if nodes.len() <= idx {
                nodes.resize(idx + 1, Term::Node(SmallVec::new()));
            }
            nodes[idx] = term.clone();
        }
        map.insert(term, id);
        id
    }

    /// Intern a variable leaf.
    pub fn var(&self, sym: Symbol) -> TermId {
        self.intern(Term::Var(sym))
    }

    /// Intern a constant leaf.
    pub fn name(&self, sym: Symbol) -> TermId {
        self.intern(Term::Name(sym))
    }

    /// Intern an internal node.
    pub fn node(&self, children: Children) -> TermId {
        self.intern(Term::Node(children))
    }

    /// Resolve a TermId to its term.
    /// Returns None if the TermId did not come from this store.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    pub fn is_var(&self, id: TermId) -> bool {
        matches!(self.resolve(id), Some(Term::Var(_)))
    }

    /// Leaf symbol, for variables and constants alike.
    pub fn symbol(&self, id: TermId) -> Option<Symbol> {
        self.resolve(id)?.symbol()
    }

    pub fn children(&self, id: TermId) -> Option<Children> {
        match self.resolve(id)? {
            Term::Node(children) => Some(children),
            _ => None,
        }
    }

    pub fn is_terminal(&self, id: TermId) -> bool {
        self.resolve(id).map_or(true, |t| t.is_terminal())
    }

    /// Number of children; zero for leaves.
    pub fn size(&self, id: TermId) -> usize {
        match self.resolve(id) {
            Some(Term::Node(children)) => children.len(),
            _ => 0,
        }
    }

    /// Child at `pos`, if any.
    pub fn at(&self, id: TermId, pos: usize) -> Option<TermId> {
        match self.resolve(id)? {
            Term::Node(children) => children.get(pos).copied(),
            _ => None,
        }
    }

    /// Owned copy of the children; empty for leaves.
    pub fn child_copy(&self, id: TermId) -> Vec<TermId> {
        match self.resolve(id) {
            Some(Term::Node(children)) => children.to_vec(),
            _ => Vec::new(),
        }
    }

    /// Depth-first pre-order traversal: the term itself, then the full
    /// traversal of each child in order.
    pub fn full_iter(&self, id: TermId) -> FullIter<'_> {
        let mut stack = SmallVec::new();
        stack.push(id);
        FullIter { terms: self, stack }
    }

    /// True if no variable occurs anywhere in the term.
    pub fn is_ground(&self, id: TermId) -> bool {
        !self.full_iter(id).any(|t| self.is_var(t))
    }

    /// Distinct variables of a term in first-occurrence order.
    pub fn vars_of(&self, id: TermId) -> Vec<TermId> {
        let mut out = Vec::new();
        for t in self.full_iter(id) {
            if self.is_var(t) && !out.contains(&t) {
                out.push(t);
            }
        }
        out
    }

    /// Number of distinct terms stored.
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy pre-order traversal over a stored term and its descendants.
pub struct FullIter<'a> {
    terms: &'a TermStore,
    stack: SmallVec<[TermId; 16]>,
}

impl Iterator for FullIter<'_> {
    type Item = TermId;

    fn next(&mut self) -> Option<TermId> {
        let id = self.stack.pop()?;
        if let Some(Term::Node(children)) = self.terms.resolve(id) {
            self.stack.extend(children.iter().rev().copied());
        }
        Some(id)
    }
}

/// An owned, un-interned term. This is the structural value handed to
/// [`crate::pool::Pool::submerge`] and returned by `surface`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tree {
    Leaf(String),
    Node(Vec<Tree>),
}

impl Tree {
    pub fn leaf(name: impl Into<String>) -> Self {
        Tree::Leaf(name.into())
    }

    pub fn node(children: impl IntoIterator<Item = Tree>) -> Self {
        Tree::Node(children.into_iter().collect())
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Tree::Leaf(_) => true,
            Tree::Node(children) => children.is_empty(),
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf(name) => f.write_str(name),
            Tree::Node(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
