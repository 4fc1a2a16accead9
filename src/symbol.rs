use lasso::{Spur, ThreadedRodeo};

/// Interned leaf name. Constants and variables share one namespace; the
/// leading `?` is what tells them apart.
pub type Symbol = Spur;

/// Prefix that marks a leaf name as a variable.
pub const VAR_PREFIX: char = '?';

/// Returns true if `name` follows the variable convention: a `?` followed by
/// at least one more character.
pub fn is_var_name(name: &str) -> bool {
    name.len() > VAR_PREFIX.len_utf8() && name.starts_with(VAR_PREFIX)
}

/// Thread-safe store of leaf names.
///
/// Guarantees:
/// - Same string always produces same Symbol
/// - Different strings always produce different Symbols
/// - A Symbol can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a name, returning its Symbol.
    pub fn intern(&self, name: &str) -> Symbol {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a Symbol back to its name.
    /// Returns None if the Symbol was not created by this store.
    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.rodeo.try_resolve(&sym)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.rodeo.get(name)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/symbol.rs"]
mod tests;
