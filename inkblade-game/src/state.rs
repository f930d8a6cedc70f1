//! Canonical game state owned by the progression engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, UpgradeKind};

/// Legacy passive upgrade ids migrated into base artists on load.
const LEGACY_PASSIVE_UPGRADES: [&str; 3] = ["art_student", "sketch_pad", "drafting_table"];

/// Two-step confirmation gate: `Idle -> Armed -> {confirmed | expired}`.
///
/// Expiry is an explicit timestamp checked once per tick rather than a
/// scheduled callback, so the machine behaves identically under wall-clock
/// and simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfirmGate {
    #[serde(default)]
    pub armed: bool,
    #[serde(default)]
    pub expires_at_ms: i64,
}

impl ConfirmGate {
    pub fn arm(&mut self, now_ms: i64, window_ms: i64) {
        self.armed = true;
        self.expires_at_ms = now_ms.saturating_add(window_ms);
    }

    /// True while armed and the window has not lapsed.
    #[must_use]
    pub fn is_armed(&self, now_ms: i64) -> bool {
        self.armed && now_ms <= self.expires_at_ms
    }

    /// Clear the gate if its window has lapsed; returns whether it expired.
    pub fn expire(&mut self, now_ms: i64) -> bool {
        if self.armed && now_ms > self.expires_at_ms {
            self.clear();
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.armed = false;
        self.expires_at_ms = 0;
    }
}

/// The single mutable aggregate for one save.
///
/// Every field defaults when absent so older save payloads load cleanly;
/// unknown fields are ignored. Derived fields (`click_power`, `passive_rate`)
/// are recomputed by [`GameState::rehydrate`] after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Spendable strokes; never negative after any mutation.
    #[serde(default)]
    pub strokes: f64,
    /// Lifetime-this-run accumulation; reset by prestige.
    #[serde(default)]
    pub total_strokes: f64,
    #[serde(default)]
    pub total_clicks: u64,
    /// Base strokes per manual action before multipliers.
    #[serde(default = "default_click_power")]
    pub click_power: f64,
    /// Base strokes per second; always the exact resummation of
    /// `base_rate * owned` over all artist types.
    #[serde(default)]
    pub passive_rate: f64,
    #[serde(default)]
    pub upgrades: HashMap<String, u32>,
    #[serde(default)]
    pub artists: HashMap<String, u32>,
    #[serde(default)]
    pub media_tier: usize,
    /// Insertion-ordered milestone unlocks.
    #[serde(default)]
    pub unlocked_swords: Vec<String>,
    /// Game-lifetime achievement unlocks; never reset by prestige.
    #[serde(default)]
    pub unlocked_achievements: Vec<String>,
    #[serde(default)]
    pub erasure_points: f64,
    #[serde(default)]
    pub total_erasure_points: f64,
    #[serde(default)]
    pub prestige_count: u32,
    #[serde(default)]
    pub prestige_upgrades: HashMap<String, u32>,
    /// Cumulative total strokes from completed prior runs.
    #[serde(default)]
    pub lifetime_strokes: f64,
    #[serde(default)]
    pub play_start_ms: i64,
    #[serde(default)]
    pub last_save_ms: i64,
    #[serde(default)]
    pub prestige_confirm: ConfirmGate,
    #[serde(default)]
    pub reset_confirm: ConfirmGate,
}

fn default_click_power() -> f64 {
    1.0
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            strokes: 0.0,
            total_strokes: 0.0,
            total_clicks: 0,
            click_power: default_click_power(),
            passive_rate: 0.0,
            upgrades: HashMap::new(),
            artists: HashMap::new(),
            media_tier: 0,
            unlocked_swords: Vec::new(),
            unlocked_achievements: Vec::new(),
            erasure_points: 0.0,
            total_erasure_points: 0.0,
            prestige_count: 0,
            prestige_upgrades: HashMap::new(),
            lifetime_strokes: 0.0,
            play_start_ms: 0,
            last_save_ms: 0,
            prestige_confirm: ConfirmGate::default(),
            reset_confirm: ConfirmGate::default(),
        }
    }
}

impl GameState {
    /// Fresh default state with the base sword unlocked.
    #[must_use]
    pub fn new(catalog: &Catalog, now_ms: i64) -> Self {
        Self {
            unlocked_swords: vec![catalog.base_sword().id.clone()],
            play_start_ms: now_ms,
            last_save_ms: now_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn upgrade_count(&self, id: &str) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn artist_count(&self, id: &str) -> u32 {
        self.artists.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn prestige_level(&self, id: &str) -> u32 {
        self.prestige_upgrades.get(id).copied().unwrap_or(0)
    }

    /// Total artists owned across all types.
    #[must_use]
    pub fn artists_owned(&self) -> u64 {
        self.artists.values().map(|&n| u64::from(n)).sum()
    }

    #[must_use]
    pub fn has_sword(&self, id: &str) -> bool {
        self.unlocked_swords.iter().any(|s| s == id)
    }

    #[must_use]
    pub fn has_achievement(&self, id: &str) -> bool {
        self.unlocked_achievements.iter().any(|a| a == id)
    }

    /// Recompute `passive_rate` as the full resummation over artist types.
    pub fn recalc_passive_rate(&mut self, catalog: &Catalog) {
        self.passive_rate = catalog
            .artists()
            .iter()
            .map(|def| def.base_rate * f64::from(self.artist_count(&def.id)))
            .sum();
    }

    /// Repair a freshly deserialized state: recompute derived fields, migrate
    /// legacy passive upgrades into base artists, and guarantee the base
    /// sword. Counts and unlock sets are preserved as-is.
    #[must_use]
    pub fn rehydrate(mut self, catalog: &Catalog) -> Self {
        let base_artist = catalog.base_artist().id.clone();
        for legacy in LEGACY_PASSIVE_UPGRADES {
            if let Some(owned) = self.upgrades.remove(legacy) {
                if owned > 0 {
                    *self.artists.entry(base_artist.clone()).or_insert(0) += owned;
                }
            }
        }

        self.click_power = default_click_power();
        for def in catalog.upgrades() {
            let owned = self.upgrade_count(&def.id);
            if owned > 0 && def.effect.kind == UpgradeKind::Click {
                self.click_power += def.effect.value * f64::from(owned);
            }
        }

        self.recalc_passive_rate(catalog);

        let base_sword = &catalog.base_sword().id;
        if !self.has_sword(base_sword) {
            self.unlocked_swords.insert(0, base_sword.clone());
        }

        if self.media_tier > catalog.max_media_tier() {
            self.media_tier = catalog.max_media_tier();
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_gate_arms_and_expires() {
        let mut gate = ConfirmGate::default();
        gate.arm(1_000, 4_000);
        assert!(gate.is_armed(1_000));
        assert!(gate.is_armed(5_000));
        assert!(!gate.is_armed(5_001));
        assert!(!gate.expire(5_000));
        assert!(gate.expire(5_001));
        assert!(!gate.armed);
    }

    #[test]
    fn new_state_starts_with_base_sword() {
        let catalog = Catalog::default_catalog();
        let state = GameState::new(catalog, 42);
        assert_eq!(state.unlocked_swords, vec!["butter_knife".to_string()]);
        assert_eq!(state.play_start_ms, 42);
        assert!((state.click_power - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rehydrate_recomputes_derived_fields() {
        let catalog = Catalog::default_catalog();
        let mut state = GameState::default();
        state.upgrades.insert("pencil_sharpener".to_string(), 2);
        state.artists.insert("doodler".to_string(), 3);
        state.artists.insert("sketch_artist".to_string(), 1);
        state.click_power = 999.0;
        state.passive_rate = 999.0;

        let state = state.rehydrate(catalog);
        assert!((state.click_power - 3.0).abs() < f64::EPSILON);
        assert!((state.passive_rate - 8.0).abs() < f64::EPSILON);
        assert!(state.has_sword("butter_knife"));
    }

    #[test]
    fn rehydrate_migrates_legacy_passive_upgrades() {
        let catalog = Catalog::default_catalog();
        let mut state = GameState::default();
        state.upgrades.insert("art_student".to_string(), 2);
        state.upgrades.insert("sketch_pad".to_string(), 1);

        let state = state.rehydrate(catalog);
        assert_eq!(state.artist_count("doodler"), 3);
        assert_eq!(state.upgrade_count("art_student"), 0);
        assert!((state.passive_rate - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rehydrate_clamps_media_tier_to_catalog() {
        let catalog = Catalog::default_catalog();
        let mut state = GameState::default();
        state.media_tier = 99;
        let state = state.rehydrate(catalog);
        assert_eq!(state.media_tier, catalog.max_media_tier());
    }
}
