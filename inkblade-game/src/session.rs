//! Progression engine: the session owns the canonical [`GameState`] and
//! applies every mutation. Each operation either fully applies or is a no-op.
//!
//! Time never comes from the system clock here; callers pass `now_ms` so the
//! interactive driver can use wall time while the headless simulator feeds a
//! simulated clock through the same code paths.

use crate::catalog::{Catalog, PrestigeEffect, UpgradeKind};
use crate::economy;
use crate::events::EngineEvent;
use crate::state::GameState;

/// Result of an affordability-gated purchase. A refused purchase changes
/// nothing; callers check affordability first or accept the no-op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Purchase {
    Bought { cost: f64 },
    Refused,
}

impl Purchase {
    #[must_use]
    pub fn bought(self) -> bool {
        matches!(self, Purchase::Bought { .. })
    }
}

/// Outcome of a two-step confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Preconditions not met; nothing changed.
    Refused,
    /// First request: the gate is armed until its window lapses.
    Armed,
    /// Second request inside the window: the transaction ran.
    Executed,
}

/// One live game: state, catalog and the pending event queue.
pub struct Session {
    state: GameState,
    catalog: Catalog,
    events: Vec<EngineEvent>,
    auto_spend_on_prestige: bool,
}

impl Session {
    #[must_use]
    pub fn new(catalog: Catalog, now_ms: i64) -> Self {
        let state = GameState::new(&catalog, now_ms);
        Self::from_state(catalog, state)
    }

    /// Resume from a previously loaded state.
    #[must_use]
    pub fn from_state(catalog: Catalog, state: GameState) -> Self {
        Self {
            state,
            catalog,
            events: Vec::new(),
            auto_spend_on_prestige: false,
        }
    }

    /// Fresh session over the embedded default catalog.
    #[must_use]
    pub fn with_default_catalog(now_ms: i64) -> Self {
        Self::new(Catalog::default_catalog().clone(), now_ms)
    }

    /// When set, the prestige transaction greedily spends earned erasure
    /// points on the cheapest affordable upgrades before the reset. Off by
    /// default so interactive players spend by hand; the headless simulator
    /// turns it on.
    #[must_use]
    pub fn with_auto_spend(mut self, enabled: bool) -> Self {
        self.auto_spend_on_prestige = enabled;
        self
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Take all events emitted since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Read-only query surface -----------------------------------------

    #[must_use]
    pub fn effective_click_power(&self) -> f64 {
        economy::effective_click_power(&self.catalog, &self.state)
    }

    #[must_use]
    pub fn effective_passive_rate(&self) -> f64 {
        economy::effective_passive_rate(&self.catalog, &self.state)
    }

    #[must_use]
    pub fn total_multiplier(&self) -> f64 {
        economy::total_multiplier(&self.catalog, &self.state)
    }

    #[must_use]
    pub fn can_prestige(&self) -> bool {
        economy::can_prestige(&self.catalog, &self.state)
    }

    #[must_use]
    pub fn erasure_points_pending(&self) -> f64 {
        economy::erasure_points_for(&self.catalog, self.state.total_strokes)
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog.
    pub fn upgrade_cost_of(&self, id: &str) -> Result<f64, crate::catalog::CatalogError> {
        let def = self.catalog.upgrade(id)?;
        Ok(economy::upgrade_cost(&self.catalog, &self.state, def))
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog.
    pub fn artist_cost_of(&self, id: &str) -> Result<f64, crate::catalog::CatalogError> {
        let def = self.catalog.artist(id)?;
        Ok(economy::artist_cost(&self.catalog, &self.state, def))
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog.
    pub fn prestige_upgrade_cost_of(&self, id: &str) -> Result<f64, crate::catalog::CatalogError> {
        let def = self.catalog.prestige_upgrade(id)?;
        Ok(economy::prestige_upgrade_cost(&self.catalog, &self.state, def))
    }

    /// The next media tier on the ladder, if any remains.
    #[must_use]
    pub fn next_media_tier(&self) -> Option<&crate::catalog::MediaTierDef> {
        self.catalog.media_tier(self.state.media_tier + 1)
    }

    // --- Mutators ---------------------------------------------------------

    /// One manual action. Always succeeds; returns the strokes gained.
    pub fn click(&mut self, now_ms: i64) -> f64 {
        let gain = economy::effective_click_power(&self.catalog, &self.state);
        self.state.strokes += gain;
        self.state.total_strokes += gain;
        self.state.total_clicks = self.state.total_clicks.saturating_add(1);
        self.events.push(EngineEvent::StrokesGained { amount: gain });
        self.check_sword_unlocks();
        self.check_achievements(now_ms);
        gain
    }

    /// One scheduler tick: passive accrual, confirmation-gate expiry and
    /// unlock checks, in that order.
    pub fn tick(&mut self, dt_secs: f64, now_ms: i64) {
        if dt_secs > 0.0 && self.state.passive_rate > 0.0 {
            let gain = economy::effective_passive_rate(&self.catalog, &self.state) * dt_secs;
            self.state.strokes += gain;
            self.state.total_strokes += gain;
        }
        self.state.prestige_confirm.expire(now_ms);
        self.state.reset_confirm.expire(now_ms);
        self.check_sword_unlocks();
        self.check_achievements(now_ms);
    }

    /// Bulk accrual of passive and click income over a span of simulated
    /// time. Used by analytic fast-forward drivers; unlock checks are the
    /// caller's responsibility afterwards.
    pub fn fast_forward(&mut self, secs: f64, clicks_per_sec: f64) {
        if secs <= 0.0 {
            return;
        }
        let passive = economy::effective_passive_rate(&self.catalog, &self.state);
        let click = economy::effective_click_power(&self.catalog, &self.state) * clicks_per_sec;
        let gain = (passive + click) * secs;
        self.state.strokes += gain;
        self.state.total_strokes += gain;
        self.state.total_clicks = self
            .state
            .total_clicks
            .saturating_add(crate::numbers::floor_f64_to_u64(clicks_per_sec * secs));
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog. Insufficient
    /// strokes are not an error: the purchase is refused with no state change.
    pub fn buy_upgrade(&mut self, id: &str) -> Result<Purchase, crate::catalog::CatalogError> {
        let def = self.catalog.upgrade(id)?;
        let cost = economy::upgrade_cost(&self.catalog, &self.state, def);
        if self.state.strokes < cost {
            return Ok(Purchase::Refused);
        }
        let name = def.name.clone();
        let is_click = def.effect.kind == UpgradeKind::Click;
        let value = def.effect.value;

        self.state.strokes -= cost;
        let owned = self.state.upgrades.entry(id.to_string()).or_insert(0);
        *owned += 1;
        let owned = *owned;
        if is_click {
            self.state.click_power += value;
        }
        self.events.push(EngineEvent::UpgradePurchased {
            id: id.to_string(),
            name,
            owned,
            cost,
        });
        Ok(Purchase::Bought { cost })
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog.
    pub fn hire_artist(&mut self, id: &str) -> Result<Purchase, crate::catalog::CatalogError> {
        let def = self.catalog.artist(id)?;
        let cost = economy::artist_cost(&self.catalog, &self.state, def);
        if self.state.strokes < cost {
            return Ok(Purchase::Refused);
        }
        let name = def.name.clone();

        self.state.strokes -= cost;
        let owned = self.state.artists.entry(id.to_string()).or_insert(0);
        *owned += 1;
        let owned = *owned;
        self.state.recalc_passive_rate(&self.catalog);
        self.events.push(EngineEvent::ArtistHired {
            id: id.to_string(),
            name,
            owned,
            cost,
        });
        Ok(Purchase::Bought { cost })
    }

    /// Advance the media ladder by exactly one tier; tiers cannot be skipped.
    pub fn advance_media_tier(&mut self) -> Purchase {
        let next = self.state.media_tier + 1;
        let Some(tier) = self.catalog.media_tier(next) else {
            return Purchase::Refused;
        };
        if self.state.strokes < tier.cost {
            return Purchase::Refused;
        }
        let (name, multiplier, cost) = (tier.name.clone(), tier.multiplier, tier.cost);

        self.state.strokes -= cost;
        self.state.media_tier = next;
        self.events.push(EngineEvent::MediaTierReached {
            tier: next,
            name,
            multiplier,
            cost,
        });
        Purchase::Bought { cost }
    }

    /// # Errors
    ///
    /// Returns an error when the id is not in the catalog.
    pub fn buy_prestige_upgrade(
        &mut self,
        id: &str,
    ) -> Result<Purchase, crate::catalog::CatalogError> {
        let def = self.catalog.prestige_upgrade(id)?;
        if self.state.prestige_level(id) >= def.max_level {
            return Ok(Purchase::Refused);
        }
        let cost = economy::prestige_upgrade_cost(&self.catalog, &self.state, def);
        if self.state.erasure_points < cost {
            return Ok(Purchase::Refused);
        }
        let name = def.name.clone();

        self.state.erasure_points -= cost;
        let level = self.state.prestige_upgrades.entry(id.to_string()).or_insert(0);
        *level += 1;
        let level = *level;
        self.events.push(EngineEvent::PrestigeUpgradePurchased {
            id: id.to_string(),
            name,
            level,
            cost,
        });
        Ok(Purchase::Bought { cost })
    }

    /// Unlock every sword whose threshold has been crossed. Idempotent;
    /// unlock order follows catalog order.
    pub fn check_sword_unlocks(&mut self) {
        for def in self.catalog.swords() {
            if self.state.total_strokes < def.threshold {
                continue;
            }
            if self.state.unlocked_swords.iter().any(|s| s == &def.id) {
                continue;
            }
            self.state.unlocked_swords.push(def.id.clone());
            self.events.push(EngineEvent::SwordUnlocked {
                id: def.id.clone(),
                name: def.name.clone(),
                desc: def.desc.clone(),
                bonus_pct: def.bonus_pct,
            });
        }
    }

    /// Unlock every achievement whose condition holds. Idempotent; unlocked
    /// achievements persist for the lifetime of the save.
    pub fn check_achievements(&mut self, now_ms: i64) {
        for def in self.catalog.achievements() {
            if self.state.unlocked_achievements.iter().any(|a| a == &def.id) {
                continue;
            }
            if !def.when.is_met(&self.state, now_ms) {
                continue;
            }
            self.state.unlocked_achievements.push(def.id.clone());
            self.events.push(EngineEvent::AchievementUnlocked {
                id: def.id.clone(),
                name: def.name.clone(),
                desc: def.desc.clone(),
            });
        }
    }

    /// First call arms the confirmation gate; a second call inside the window
    /// runs the prestige transaction. Refused outright below the threshold.
    pub fn request_prestige(&mut self, now_ms: i64) -> ConfirmOutcome {
        if !self.can_prestige() {
            self.state.prestige_confirm.clear();
            return ConfirmOutcome::Refused;
        }
        if self.state.prestige_confirm.is_armed(now_ms) {
            self.state.prestige_confirm.clear();
            if self.execute_prestige().is_some() {
                ConfirmOutcome::Executed
            } else {
                ConfirmOutcome::Refused
            }
        } else {
            let window = self.catalog.tuning.prestige_confirm_ms;
            self.state.prestige_confirm.arm(now_ms, window);
            ConfirmOutcome::Armed
        }
    }

    /// Two-step full reset: start over with no carry-over of anything.
    pub fn request_reset(&mut self, now_ms: i64) -> ConfirmOutcome {
        if self.state.reset_confirm.is_armed(now_ms) {
            self.state.reset_confirm.clear();
            self.hard_reset(now_ms);
            ConfirmOutcome::Executed
        } else {
            let window = self.catalog.tuning.reset_confirm_ms;
            self.state.reset_confirm.arm(now_ms, window);
            ConfirmOutcome::Armed
        }
    }

    /// The irreversible prestige transaction. Returns the erasure points
    /// earned, or `None` (no state change) when the run would earn nothing.
    pub fn execute_prestige(&mut self) -> Option<f64> {
        let earned = economy::erasure_points_for(&self.catalog, self.state.total_strokes);
        if earned <= 0.0 {
            return None;
        }

        self.state.erasure_points += earned;
        self.state.total_erasure_points += earned;
        self.state.lifetime_strokes += self.state.total_strokes;
        self.state.prestige_count = self.state.prestige_count.saturating_add(1);
        if self.auto_spend_on_prestige {
            self.spend_erasure_points();
        }

        let fresh = {
            let old = &self.state;
            let mut fresh = GameState::new(&self.catalog, old.play_start_ms);
            fresh.erasure_points = old.erasure_points;
            fresh.total_erasure_points = old.total_erasure_points;
            fresh.prestige_count = old.prestige_count;
            fresh.prestige_upgrades = old.prestige_upgrades.clone();
            fresh.lifetime_strokes = old.lifetime_strokes;
            fresh.unlocked_achievements = old.unlocked_achievements.clone();
            fresh.last_save_ms = old.last_save_ms;

            for def in self.catalog.prestige_upgrades() {
                let level = old.prestige_level(&def.id);
                if level == 0 {
                    continue;
                }
                match &def.effect {
                    PrestigeEffect::KeepSwords => {
                        fresh.unlocked_swords = old.unlocked_swords.clone();
                    }
                    PrestigeEffect::StartingTier { tier } => {
                        fresh.media_tier = fresh.media_tier.max(*tier);
                    }
                    PrestigeEffect::HeadStart { artist, per_level } => {
                        fresh
                            .artists
                            .insert(artist.clone(), level.saturating_mul(*per_level));
                    }
                    _ => {}
                }
            }
            fresh.recalc_passive_rate(&self.catalog);
            fresh
        };

        let number = fresh.prestige_count;
        self.state = fresh;
        self.events
            .push(EngineEvent::PrestigeCompleted { number, earned });
        Some(earned)
    }

    /// Greedily buy the cheapest affordable prestige upgrade until nothing
    /// remains affordable. Returns the number of levels bought.
    pub fn spend_erasure_points(&mut self) -> u32 {
        let mut bought = 0;
        loop {
            let mut best: Option<(String, f64)> = None;
            for def in self.catalog.prestige_upgrades() {
                if self.state.prestige_level(&def.id) >= def.max_level {
                    continue;
                }
                let cost = economy::prestige_upgrade_cost(&self.catalog, &self.state, def);
                if cost > self.state.erasure_points {
                    continue;
                }
                if best.as_ref().is_none_or(|(_, c)| cost < *c) {
                    best = Some((def.id.clone(), cost));
                }
            }
            let Some((id, cost)) = best else {
                break;
            };
            self.state.erasure_points -= cost;
            *self.state.prestige_upgrades.entry(id).or_insert(0) += 1;
            bought += 1;
        }
        bought
    }

    /// Destructive restart: fresh default state, nothing carried over.
    pub fn hard_reset(&mut self, now_ms: i64) {
        self.state = GameState::new(&self.catalog, now_ms);
        self.events.push(EngineEvent::GameReset);
    }

    /// Grant capped passive income for time spent away. Returns the gain.
    pub fn apply_offline_progress(&mut self, elapsed_ms: i64, now_ms: i64) -> f64 {
        let gain = economy::offline_gain(&self.catalog, &self.state, elapsed_ms);
        if gain <= 0.0 {
            return 0.0;
        }
        self.state.strokes += gain;
        self.state.total_strokes += gain;
        let cap_ms = self.catalog.tuning.max_offline_hours * 3_600_000.0;
        let seconds = crate::numbers::i64_to_f64(elapsed_ms).min(cap_ms) / 1_000.0;
        self.events.push(EngineEvent::OfflineProgress {
            gained: gain,
            seconds,
        });
        self.check_sword_unlocks();
        self.check_achievements(now_ms);
        gain
    }
}
