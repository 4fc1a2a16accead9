//! Reader and writer for the prefix rule notation.
//!
//! Syntax:
//! - `name` - leaf; `?name` is a variable
//! - `(a b c)` - internal node with children `a b c`
//! - `(not t)` - negative atom
//! - `(<= head body... (distinct a b)...)` - rule
//! - `; text` - comment to end of line
//!
//! A program is a sequence of rules and ground facts.

use crate::pool::Pool;
use crate::rule::{Atom, Rule};
use crate::term::{TermId, Tree};
use std::fmt;

pub const RULE_KEYWORD: &str = "<=";
pub const NOT_KEYWORD: &str = "not";
pub const DISTINCT_KEYWORD: &str = "distinct";

/// Parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KifError {
    pub message: String,
    /// Byte offset into the input.
    pub position: usize,
}

impl KifError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for KifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KIF error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for KifError {}

/// Parsed rules and facts, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub rules: Vec<Rule>,
    pub facts: Vec<TermId>,
}

/// Parse exactly one tree.
pub fn parse_tree(input: &str) -> Result<Tree, KifError> {
    let mut pos = 0;
    let tree = parse_tree_inner(input, &mut pos)?;
    skip_whitespace(input, &mut pos);
    if pos < input.len() {
        return Err(KifError::new("Unexpected characters after term", pos));
    }
    Ok(tree)
}

/// Parse every top-level tree, with the offset each one starts at.
pub fn parse_trees(input: &str) -> Result<Vec<(usize, Tree)>, KifError> {
    let mut pos = 0;
    let mut out = Vec::new();
    loop {
        skip_whitespace(input, &mut pos);
        if pos >= input.len() {
            return Ok(out);
        }
        let start = pos;
        out.push((start, parse_tree_inner(input, &mut pos)?));
    }
}

fn parse_tree_inner(input: &str, pos: &mut usize) -> Result<Tree, KifError> {
    skip_whitespace(input, pos);
    let bytes = input.as_bytes();

    match bytes.get(*pos) {
        None => Err(KifError::new("Unexpected end of input", *pos)),
        Some(b'(') => {
            *pos += 1;
            let mut children = Vec::new();
            loop {
                skip_whitespace(input, pos);
                match bytes.get(*pos) {
                    None => return Err(KifError::new("Unclosed parenthesis", *pos)),
                    Some(b')') => {
                        *pos += 1;
                        return Ok(Tree::Node(children));
                    }
                    Some(_) => children.push(parse_tree_inner(input, pos)?),
                }
            }
        }
        Some(b')') => Err(KifError::new("Unexpected ')'", *pos)),
        Some(_) => parse_name(input, pos).map(Tree::Leaf),
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'(' || b == b')' || b == b';'
}

/// Skip whitespace and `;` comments.
fn skip_whitespace(input: &str, pos: &mut usize) {
    let bytes = input.as_bytes();
    while let Some(&b) = bytes.get(*pos) {
        if b.is_ascii_whitespace() {
            *pos += 1;
        } else if b == b';' {
            while bytes.get(*pos).is_some_and(|&c| c != b'\n') {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

fn parse_name(input: &str, pos: &mut usize) -> Result<String, KifError> {
    let bytes = input.as_bytes();
    let start = *pos;
    while bytes.get(*pos).is_some_and(|&b| !is_delimiter(b)) {
        *pos += 1;
    }
    if *pos == start {
        return Err(KifError::new("Expected name", start));
    }
    Ok(input[start..*pos].to_string())
}

fn leaf_is(tree: &Tree, name: &str) -> bool {
    matches!(tree, Tree::Leaf(n) if n == name)
}

/// Parse and intern a single term.
pub fn parse_term(input: &str, pool: &Pool) -> Result<TermId, KifError> {
    Ok(pool.submerge(&parse_tree(input)?))
}

/// Parse `t` or `(not t)`.
pub fn parse_atom(input: &str, pool: &Pool) -> Result<Atom, KifError> {
    tree_to_atom(&parse_tree(input)?, pool, 0)
}

fn tree_to_atom(tree: &Tree, pool: &Pool, position: usize) -> Result<Atom, KifError> {
    match tree {
        Tree::Node(children) if children.first().is_some_and(|c| leaf_is(c, NOT_KEYWORD)) => {
            match children.as_slice() {
                [_, inner] => Ok(Atom::negative(pool.submerge(inner))),
                _ => Err(KifError::new("'not' takes exactly one term", position)),
            }
        }
        _ => Ok(Atom::positive(pool.submerge(tree))),
    }
}

/// Parse `(<= head body... (distinct a b)...)`.
pub fn parse_rule(input: &str, pool: &Pool) -> Result<Rule, KifError> {
    tree_to_rule(&parse_tree(input)?, pool, 0)
}

fn tree_to_rule(tree: &Tree, pool: &Pool, position: usize) -> Result<Rule, KifError> {
    let Tree::Node(children) = tree else {
        return Err(KifError::new("Expected rule", position));
    };
    let [keyword, head, rest @ ..] = children.as_slice() else {
        return Err(KifError::new("Rule needs a head", position));
    };
    if !leaf_is(keyword, RULE_KEYWORD) {
        return Err(KifError::new(
            format!("Rule must start with '{}'", RULE_KEYWORD),
            position,
        ));
    }

    let head = tree_to_atom(head, pool, position)?;
    let mut body = Vec::new();
    let mut distinct = Vec::new();
    for elem in rest {
        match elem {
            Tree::Node(parts) if parts.first().is_some_and(|k| leaf_is(k, DISTINCT_KEYWORD)) => {
                let [_, left, right] = parts.as_slice() else {
                    return Err(KifError::new(
                        format!("'{}' takes exactly two terms", DISTINCT_KEYWORD),
                        position,
                    ));
                };
                distinct.push((pool.submerge(left), pool.submerge(right)));
            }
            _ => body.push(tree_to_atom(elem, pool, position)?),
        }
    }
    Ok(Rule::new(head, body, distinct, pool.terms()))
}

/// Parse a whole program. Top-level rules start with `<=`; everything else
/// must be a ground fact.
pub fn parse_program(input: &str, pool: &Pool) -> Result<Program, KifError> {
    let mut program = Program::default();
    for (position, tree) in parse_trees(input)? {
        let is_rule = matches!(&tree, Tree::Node(c) if c.first().is_some_and(|k| leaf_is(k, RULE_KEYWORD)));
        if is_rule {
            program.rules.push(tree_to_rule(&tree, pool, position)?);
        } else {
            let fact = pool.submerge(&tree);
            if !pool.terms().is_ground(fact) {
                return Err(KifError::new("Facts must be ground", position));
            }
            program.facts.push(fact);
        }
    }
    Ok(program)
}

pub fn format_term(term: TermId, pool: &Pool) -> String {
    pool.display(term)
}

pub fn format_atom(atom: &Atom, pool: &Pool) -> String {
    if atom.truth {
        pool.display(atom.term)
    } else {
        format!("({} {})", NOT_KEYWORD, pool.display(atom.term))
    }
}

pub fn format_rule(rule: &Rule, pool: &Pool) -> String {
    let mut out = format!("({} {}", RULE_KEYWORD, format_atom(&rule.head, pool));
    for atom in &rule.body {
        out.push(' ');
        out.push_str(&format_atom(atom, pool));
    }
    for d in &rule.distinct {
        out.push_str(&format!(
            " ({} {} {})",
            DISTINCT_KEYWORD,
            pool.display(d.left),
            pool.display(d.right)
        ));
    }
    out.push(')');
    out
}

#[cfg(test)]
#[path = "tests/kif.rs"]
mod tests;
