//! Grounding engine for Datalog-style rules over tree-shaped terms.
//!
//! Terms are hash-consed into a shared [`Pool`]; rules are grounded against
//! a fact set by one of several [`Renderer`] strategies; a [`Ruletta`]
//! stratifies a rule set for evaluation; [`Cachet`] remembers which facts
//! matched which body forms across proving rounds.

pub mod cachet;
pub mod cartesian;
pub mod cover;
pub mod forward;
pub mod frame;
pub mod kif;
pub mod limiter;
pub mod metrics;
pub mod pool;
pub mod render;
pub mod rule;
pub mod ruletta;
pub mod support;
pub mod symbol;
pub mod term;
pub mod topper;
pub mod trace;
pub mod unify;

pub use cachet::{Cachet, FlatFormIndex, FormIndex};
pub use forward::{ForwardConfig, Proof, StratifiedForward};
pub use frame::{Frame, MergeError};
pub use kif::KifError;
pub use limiter::OpLimiter;
pub use pool::Pool;
pub use render::{Grounding, RenderConfig, Renderer};
pub use rule::{Atom, Rule, RuleError};
pub use ruletta::{RuleId, Ruletta, Stratification, Stratum};
pub use support::{Facts, Support};
pub use term::{TermId, Tree};
pub use unify::Bindings;

#[cfg(test)]
pub(crate) mod test_utils;
