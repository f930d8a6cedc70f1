//! Pure economy queries: cost curves, multiplier composition, effective
//! production rates and the prestige currency formula.
//!
//! Every function takes the catalog and a state snapshot and returns a value
//! with no side effects, so the interactive driver and the headless simulator
//! share one implementation.

use crate::catalog::{ArtistDef, Catalog, PrestigeEffect, PrestigeUpgradeDef, UpgradeDef};
use crate::state::GameState;

/// Geometric upgrade cost: `floor(base_cost * cost_scale^owned)`.
#[must_use]
pub fn upgrade_cost(catalog: &Catalog, state: &GameState, def: &UpgradeDef) -> f64 {
    geometric_cost(def.base_cost, catalog.tuning.cost_scale, state.upgrade_count(&def.id))
}

/// Geometric artist cost; artists scale faster than upgrades.
#[must_use]
pub fn artist_cost(catalog: &Catalog, state: &GameState, def: &ArtistDef) -> f64 {
    geometric_cost(
        def.base_cost,
        catalog.tuning.artist_cost_scale,
        state.artist_count(&def.id),
    )
}

/// Cost of the next level of a prestige upgrade, in erasure points.
#[must_use]
pub fn prestige_upgrade_cost(
    catalog: &Catalog,
    state: &GameState,
    def: &PrestigeUpgradeDef,
) -> f64 {
    geometric_cost(
        def.base_cost,
        catalog.tuning.prestige_cost_scale,
        state.prestige_level(&def.id),
    )
}

fn geometric_cost(base_cost: f64, scale: f64, owned: u32) -> f64 {
    let owned = i32::try_from(owned).unwrap_or(i32::MAX);
    (base_cost * scale.powi(owned)).floor().max(0.0)
}

/// Multiplier of the currently active media tier.
#[must_use]
pub fn media_multiplier(catalog: &Catalog, state: &GameState) -> f64 {
    catalog
        .media_tier(state.media_tier)
        .map_or(1.0, |tier| tier.multiplier)
}

/// Sum of bonus percentages over unlocked swords.
#[must_use]
pub fn sword_bonus_pct(catalog: &Catalog, state: &GameState) -> f64 {
    state
        .unlocked_swords
        .iter()
        .filter_map(|id| catalog.sword(id).ok())
        .map(|def| def.bonus_pct)
        .sum()
}

/// Product of the three independent multiplier axes: media tier, sword
/// bonuses, and every all-production prestige upgrade. Axes compound
/// multiplicatively so stacking keeps pace with geometric costs.
#[must_use]
pub fn total_multiplier(catalog: &Catalog, state: &GameState) -> f64 {
    let sword_factor = 1.0 + sword_bonus_pct(catalog, state) / 100.0;
    media_multiplier(catalog, state) * sword_factor * production_axis_multiplier(catalog, state)
}

/// Compound factor from prestige upgrades that boost all production.
#[must_use]
pub fn production_axis_multiplier(catalog: &Catalog, state: &GameState) -> f64 {
    axis_multiplier(catalog, state, |effect| match effect {
        PrestigeEffect::ProductionMult { per_level } => Some(*per_level),
        _ => None,
    })
}

/// Compound factor from prestige upgrades that boost click power only.
#[must_use]
pub fn click_axis_multiplier(catalog: &Catalog, state: &GameState) -> f64 {
    axis_multiplier(catalog, state, |effect| match effect {
        PrestigeEffect::ClickMult { per_level } => Some(*per_level),
        _ => None,
    })
}

/// Compound factor from prestige upgrades that boost artist output only.
#[must_use]
pub fn artist_axis_multiplier(catalog: &Catalog, state: &GameState) -> f64 {
    axis_multiplier(catalog, state, |effect| match effect {
        PrestigeEffect::ArtistMult { per_level } => Some(*per_level),
        _ => None,
    })
}

fn axis_multiplier(
    catalog: &Catalog,
    state: &GameState,
    rate_of: impl Fn(&PrestigeEffect) -> Option<f64>,
) -> f64 {
    catalog
        .prestige_upgrades()
        .iter()
        .filter_map(|def| {
            rate_of(&def.effect)
                .map(|rate| 1.0 + f64::from(state.prestige_level(&def.id)) * rate)
        })
        .product()
}

/// Strokes gained per manual action after all multipliers.
#[must_use]
pub fn effective_click_power(catalog: &Catalog, state: &GameState) -> f64 {
    state.click_power * total_multiplier(catalog, state) * click_axis_multiplier(catalog, state)
}

/// Strokes gained per second from artists after all multipliers.
#[must_use]
pub fn effective_passive_rate(catalog: &Catalog, state: &GameState) -> f64 {
    state.passive_rate * total_multiplier(catalog, state) * artist_axis_multiplier(catalog, state)
}

/// Effective output of one artist type given its owned count.
#[must_use]
pub fn artist_production(catalog: &Catalog, state: &GameState, def: &ArtistDef) -> f64 {
    def.base_rate
        * f64::from(state.artist_count(&def.id))
        * total_multiplier(catalog, state)
        * artist_axis_multiplier(catalog, state)
}

/// Erasure points a run would earn: `floor(sqrt(total / divisor))`.
/// Monotone in its argument; zero below the divisor.
#[must_use]
pub fn erasure_points_for(catalog: &Catalog, total_strokes: f64) -> f64 {
    if total_strokes <= 0.0 {
        return 0.0;
    }
    (total_strokes / catalog.tuning.erasure_divisor).sqrt().floor()
}

#[must_use]
pub fn can_prestige(catalog: &Catalog, state: &GameState) -> bool {
    state.total_strokes >= catalog.tuning.prestige_threshold
}

/// Strokes earned while away, capped at the configured offline ceiling.
#[must_use]
pub fn offline_gain(catalog: &Catalog, state: &GameState, elapsed_ms: i64) -> f64 {
    if elapsed_ms <= 0 || state.passive_rate <= 0.0 {
        return 0.0;
    }
    let cap_ms = catalog.tuning.max_offline_hours * 3_600_000.0;
    let capped_secs = crate::numbers::i64_to_f64(elapsed_ms).min(cap_ms) / 1_000.0;
    effective_passive_rate(catalog, state) * capped_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static Catalog {
        Catalog::default_catalog()
    }

    #[test]
    fn upgrade_cost_grows_geometrically_and_floors() {
        let catalog = catalog();
        let def = catalog.upgrade("pencil_sharpener").unwrap();
        let mut state = GameState::new(catalog, 0);
        assert!((upgrade_cost(catalog, &state, def) - 10.0).abs() < f64::EPSILON);
        state.upgrades.insert(def.id.clone(), 1);
        assert!((upgrade_cost(catalog, &state, def) - 11.0).abs() < f64::EPSILON);
        state.upgrades.insert(def.id.clone(), 2);
        assert!((upgrade_cost(catalog, &state, def) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn costs_never_decrease_with_owned_count() {
        let catalog = catalog();
        let def = catalog.artist("doodler").unwrap();
        let mut state = GameState::new(catalog, 0);
        let mut previous = 0.0;
        for owned in 0..60 {
            state.artists.insert(def.id.clone(), owned);
            let cost = artist_cost(catalog, &state, def);
            assert!(cost >= previous, "cost regressed at owned={owned}");
            assert!((cost - cost.floor()).abs() < f64::EPSILON, "cost not integral");
            previous = cost;
        }
    }

    #[test]
    fn multiplier_axes_compose_multiplicatively() {
        let catalog = catalog();
        let mut state = GameState::new(catalog, 0);
        state.media_tier = 1; // charcoal x3
        state.unlocked_swords.push("letter_opener".to_string()); // +2%
        state.prestige_upgrades.insert("speed_sketch".to_string(), 2); // x2.0

        let expected = 3.0 * 1.02 * 2.0;
        assert!((total_multiplier(catalog, &state) - expected).abs() < 1e-9);
    }

    #[test]
    fn click_and_artist_axes_are_independent() {
        let catalog = catalog();
        let mut state = GameState::new(catalog, 0);
        state.prestige_upgrades.insert("muscle_memory".to_string(), 3); // x1.3 click
        state.prestige_upgrades.insert("art_school".to_string(), 2); // x1.5 artist
        state.click_power = 2.0;
        state.passive_rate = 10.0;

        assert!((effective_click_power(catalog, &state) - 2.0 * 1.3).abs() < 1e-9);
        assert!((effective_passive_rate(catalog, &state) - 10.0 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn erasure_points_monotone_and_zero_below_divisor() {
        let catalog = catalog();
        assert!((erasure_points_for(catalog, 0.0) - 0.0).abs() < f64::EPSILON);
        assert!((erasure_points_for(catalog, 999_999.0) - 0.0).abs() < f64::EPSILON);
        assert!((erasure_points_for(catalog, 1_000_000.0) - 1.0).abs() < f64::EPSILON);
        assert!((erasure_points_for(catalog, 10_000_000.0) - 3.0).abs() < f64::EPSILON);
        let mut previous = 0.0;
        for step in 0..50 {
            let total = f64::from(step) * 3_456_789.0;
            let earned = erasure_points_for(catalog, total);
            assert!(earned >= previous);
            previous = earned;
        }
    }

    #[test]
    fn offline_gain_is_capped() {
        let catalog = catalog();
        let mut state = GameState::new(catalog, 0);
        state.artists.insert("doodler".to_string(), 1);
        state.recalc_passive_rate(catalog);

        let one_hour = offline_gain(catalog, &state, 3_600_000);
        assert!((one_hour - 3_600.0).abs() < 1e-6);
        let day = offline_gain(catalog, &state, 24 * 3_600_000);
        assert!((day - 8.0 * 3_600.0).abs() < 1e-6);
    }

    #[test]
    fn offline_gain_requires_passive_income() {
        let catalog = catalog();
        let state = GameState::new(catalog, 0);
        assert!((offline_gain(catalog, &state, 3_600_000) - 0.0).abs() < f64::EPSILON);
    }
}
