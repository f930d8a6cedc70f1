//! Purchase strategies for automated runs.

use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::candidates::Candidate;

/// ROI gap within which two options count as a close call, and within which
/// the human strategy treats them as interchangeable.
pub const CLOSE_CALL_ROI_DELTA: f64 = 0.15;

const HUMAN_REACTION_DELAY_MIN: f64 = 0.35;
const HUMAN_REACTION_DELAY_MAX: f64 = 1.2;
const IDLE_CLICKS_PER_SEC: f64 = 0.5;
const HUMAN_FALLBACK_CLICKS_PER_SEC: f64 = 3.0;

/// Built-in purchase strategies for headless runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Always pick the highest-ROI affordable option.
    Optimal,
    /// Always pick the lowest absolute cost.
    Cheapest,
    /// Optimal choices at a fixed low manual-action rate.
    Idle,
    /// Bounded randomness: near-tied ROI options picked probabilistically,
    /// plus a reaction delay after each purchase.
    Human,
}

impl Strategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Optimal => "optimal",
            Strategy::Cheapest => "cheapest",
            Strategy::Idle => "idle",
            Strategy::Human => "human",
        }
    }

    /// Manual-action rate at a moment of simulated time.
    ///
    /// Idle pins a low fixed rate; human wobbles around its target with a
    /// slow deterministic rhythm. The ROI strategies click exactly as told,
    /// including not at all, which lets a zero-rate, zero-artist run stall
    /// out as an observable condition.
    #[must_use]
    pub fn clicks_per_sec(self, base: f64, sim_time: f64) -> f64 {
        match self {
            Strategy::Idle => IDLE_CLICKS_PER_SEC,
            Strategy::Human => {
                let target = if base > 0.0 {
                    base
                } else {
                    HUMAN_FALLBACK_CLICKS_PER_SEC
                };
                let factor = 0.9 + 0.2 * (sim_time / 45.0).sin();
                (target * factor).max(0.1)
            }
            Strategy::Optimal | Strategy::Cheapest => base.max(0.0),
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PurchasePolicy + Send> {
        match self {
            Strategy::Optimal | Strategy::Idle => Box::new(OptimalPolicy),
            Strategy::Cheapest => Box::new(CheapestPolicy),
            Strategy::Human => Box::new(HumanPolicy::new(seed)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Policy interface: choose among affordable candidates.
pub trait PurchasePolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select a purchase. `affordable` is never empty.
    fn select<'a>(&mut self, affordable: &'a [Candidate]) -> &'a Candidate;

    /// Pause inserted after a purchase, in simulated seconds.
    fn reaction_delay(&mut self) -> f64 {
        0.0
    }
}

struct OptimalPolicy;
struct CheapestPolicy;

struct HumanPolicy {
    rng: ChaCha20Rng,
}

impl HumanPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PurchasePolicy for OptimalPolicy {
    fn name(&self) -> &'static str {
        "optimal"
    }

    fn select<'a>(&mut self, affordable: &'a [Candidate]) -> &'a Candidate {
        affordable
            .iter()
            .max_by(|a, b| a.roi.total_cmp(&b.roi))
            .unwrap_or(&affordable[0])
    }
}

impl PurchasePolicy for CheapestPolicy {
    fn name(&self) -> &'static str {
        "cheapest"
    }

    fn select<'a>(&mut self, affordable: &'a [Candidate]) -> &'a Candidate {
        affordable
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .unwrap_or(&affordable[0])
    }
}

impl PurchasePolicy for HumanPolicy {
    fn name(&self) -> &'static str {
        "human"
    }

    fn select<'a>(&mut self, affordable: &'a [Candidate]) -> &'a Candidate {
        let mut ranked: Vec<&Candidate> = affordable.iter().collect();
        ranked.sort_by(|a, b| b.roi.total_cmp(&a.roi).then(a.cost.total_cmp(&b.cost)));
        let best = ranked[0];
        let roi_floor = if best.roi <= 0.0 {
            f64::NEG_INFINITY
        } else {
            best.roi * (1.0 - CLOSE_CALL_ROI_DELTA)
        };
        let near_best: Vec<&Candidate> = ranked
            .into_iter()
            .filter(|c| c.roi >= roi_floor)
            .collect();
        if near_best.len() == 1 {
            return near_best[0];
        }

        let roll: f64 = self.rng.random();
        if roll < 0.6 {
            near_best[0]
        } else if roll < 0.85 {
            near_best[usize::min(1, near_best.len() - 1)]
        } else {
            near_best
                .iter()
                .copied()
                .min_by(|a, b| a.cost.total_cmp(&b.cost))
                .unwrap_or(near_best[0])
        }
    }

    fn reaction_delay(&mut self) -> f64 {
        let span = HUMAN_REACTION_DELAY_MAX - HUMAN_REACTION_DELAY_MIN;
        HUMAN_REACTION_DELAY_MIN + self.rng.random::<f64>() * span
    }
}
