//! Purchase option enumeration with return-on-investment annotations.
//!
//! Every currently purchasable option (each upgrade, each artist, the next
//! media tier) is ranked by strokes/sec gained per stroke spent, which is
//! what the ROI-driven strategies optimize.

use inkblade_game::catalog::{Catalog, UpgradeKind};
use inkblade_game::economy;
use inkblade_game::state::GameState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Upgrade,
    Artist,
    MediaTier,
}

/// One purchasable option at a moment in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub id: String,
    pub name: String,
    pub cost: f64,
    /// Additional strokes/sec gained per stroke spent.
    pub roi: f64,
}

/// Combined passive and click income at a given manual-action rate.
#[must_use]
pub fn total_income_rate(catalog: &Catalog, state: &GameState, clicks_per_sec: f64) -> f64 {
    economy::effective_passive_rate(catalog, state)
        + economy::effective_click_power(catalog, state) * clicks_per_sec
}

/// Enumerate all purchase options with costs and ROI at the current state.
#[must_use]
pub fn enumerate(catalog: &Catalog, state: &GameState, clicks_per_sec: f64) -> Vec<Candidate> {
    let mult = economy::total_multiplier(catalog, state);
    let click_axis = economy::click_axis_multiplier(catalog, state);
    let artist_axis = economy::artist_axis_multiplier(catalog, state);
    let total_rate = total_income_rate(catalog, state, clicks_per_sec);

    let mut candidates = Vec::new();

    for def in catalog.upgrades() {
        let cost = economy::upgrade_cost(catalog, state, def);
        let added_income = match def.effect.kind {
            UpgradeKind::Click => def.effect.value * mult * click_axis * clicks_per_sec,
            // Legacy passive upgrades are migrated into artists on load and
            // add nothing when bought; never worth ranking above zero.
            UpgradeKind::Passive => 0.0,
        };
        let roi = if cost > 0.0 { added_income / cost } else { 0.0 };
        candidates.push(Candidate {
            kind: CandidateKind::Upgrade,
            id: def.id.clone(),
            name: def.name.clone(),
            cost,
            roi,
        });
    }

    for def in catalog.artists() {
        let cost = economy::artist_cost(catalog, state, def);
        let added_income = def.base_rate * mult * artist_axis;
        let roi = if cost > 0.0 { added_income / cost } else { 0.0 };
        candidates.push(Candidate {
            kind: CandidateKind::Artist,
            id: def.id.clone(),
            name: def.name.clone(),
            cost,
            roi,
        });
    }

    let next = state.media_tier + 1;
    if let Some(tier) = catalog.media_tier(next) {
        let current_mult = catalog
            .media_tier(state.media_tier)
            .map_or(1.0, |t| t.multiplier);
        // Everything scales by next/current, so the gain is the whole income
        // stream times that ratio minus one.
        let multiplier_gain = tier.multiplier / current_mult - 1.0;
        let added_income = total_rate * multiplier_gain;
        let roi = if tier.cost > 0.0 {
            added_income / tier.cost
        } else {
            0.0
        };
        candidates.push(Candidate {
            kind: CandidateKind::MediaTier,
            id: tier.id.clone(),
            name: tier.name.clone(),
            cost: tier.cost,
            roi,
        });
    }

    candidates
}
