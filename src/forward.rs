//! Stratified forward chaining: evaluate strata in generation order, and
//! iterate each recursive stratum until it derives nothing new.

use crate::cachet::Cachet;
use crate::pool::Pool;
use crate::render::{render_heads, RenderConfig, Renderer};
use crate::ruletta::{Ruletta, Stratification};
use crate::support::Facts;
use crate::trace::{debug, debug_span, info, warn};

/// Default cap on rounds spent in one recursive stratum.
pub const DEFAULT_MAX_ROUNDS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardConfig {
    /// Rounds allowed per recursive stratum before giving up on a fixpoint.
    pub max_rounds: usize,
    pub render: RenderConfig,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            render: RenderConfig::default(),
        }
    }
}

/// Outcome of [`StratifiedForward::prove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    /// Input facts plus everything derived.
    pub facts: Facts,
    /// Total rounds over all strata.
    pub rounds: usize,
    /// False if some grounding was partial or a stratum hit `max_rounds`.
    pub complete: bool,
}

pub struct StratifiedForward<'r> {
    ruletta: &'r Ruletta,
    stratification: Stratification,
    cachet: Cachet<'r>,
    renderer: Renderer,
    config: ForwardConfig,
}

impl<'r> StratifiedForward<'r> {
    pub fn new(ruletta: &'r Ruletta, pool: &Pool, config: ForwardConfig) -> Self {
        Self {
            ruletta,
            stratification: ruletta.stratify(),
            cachet: Cachet::new(ruletta, pool),
            renderer: Renderer::failover(&config.render),
            config,
        }
    }

    pub fn stratification(&self) -> &Stratification {
        &self.stratification
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Derive everything that follows from `facts`.
    ///
    /// Each call starts a new session: the cache is cleared first.
    pub fn prove(&mut self, facts: &Facts, pool: &Pool) -> Proof {
        let _span = debug_span!("prove", facts = facts.len()).entered();
        self.cachet.clear();

        let mut truths = facts.clone();
        for &fact in facts {
            self.cachet.store_ground_spine(fact, pool);
        }

        let mut rounds = 0;
        let mut complete = true;
        for stratum in &self.stratification.strata {
            let mut stratum_rounds = 0;
            loop {
                if stratum_rounds >= self.config.max_rounds {
                    warn!(
                        generation = stratum.generation,
                        rounds = stratum_rounds,
                        "stratum_round_limit"
                    );
                    complete = false;
                    break;
                }
                stratum_rounds += 1;

                let mut fresh = Facts::default();
                for &id in &stratum.rules {
                    let rule = self.ruletta.rule(id);
                    let support = self.cachet.cached_support(rule);
                    let grounding = self.renderer.apply(rule, &truths, &support, pool);
                    complete &= grounding.is_complete();
                    fresh.extend(
                        render_heads(grounding.bindings(), rule, pool)
                            .into_iter()
                            .filter(|h| !truths.contains(h)),
                    );
                }

                debug!(
                    generation = stratum.generation,
                    round = stratum_rounds,
                    new = fresh.len(),
                    "stratum_round"
                );
                if fresh.is_empty() {
                    break;
                }
                for &fact in &fresh {
                    self.cachet.store_ground_spine(fact, pool);
                }
                truths.extend(fresh);
                if !stratum.recursive {
                    break;
                }
            }
            rounds += stratum_rounds;
        }

        info!(
            derived = truths.len() - facts.len(),
            rounds, complete, "prove_done"
        );
        Proof {
            facts: truths,
            rounds,
            complete,
        }
    }
}

#[cfg(test)]
#[path = "tests/forward.rs"]
mod tests;
