//! Static game catalog: upgrade, artist, media tier, sword, achievement and
//! prestige upgrade definitions plus the numeric tuning block.
//!
//! All balance constants live in the embedded JSON asset rather than in code,
//! so rebalancing is a data change. Lookups go through id indexes built once
//! at load; an unknown id is an explicit error, never a silent default.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::GameState;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(DEFAULT_CATALOG_DATA).expect("embedded catalog must parse and validate")
});

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown {kind} id: {id}")]
    UnknownId { kind: &'static str, id: String },
    #[error("invalid catalog: {0}")]
    Invalid(String),
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Numeric tuning block shared by the whole economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Geometric cost growth per owned click/passive upgrade.
    #[serde(default = "default_cost_scale")]
    pub cost_scale: f64,
    /// Geometric cost growth per owned artist; steeper than upgrades.
    #[serde(default = "default_artist_cost_scale")]
    pub artist_cost_scale: f64,
    /// Geometric cost growth per prestige upgrade level.
    #[serde(default = "default_prestige_cost_scale")]
    pub prestige_cost_scale: f64,
    /// Total strokes this run required before prestige becomes available.
    pub prestige_threshold: f64,
    /// Divisor in the erasure point formula: floor(sqrt(total / divisor)).
    #[serde(default = "default_erasure_divisor")]
    pub erasure_divisor: f64,
    /// Offline progress accrues for at most this many hours.
    #[serde(default = "default_max_offline_hours")]
    pub max_offline_hours: f64,
    /// Window during which a second prestige request confirms the first.
    #[serde(default = "default_prestige_confirm_ms")]
    pub prestige_confirm_ms: i64,
    /// Window during which a second reset request confirms the first.
    #[serde(default = "default_reset_confirm_ms")]
    pub reset_confirm_ms: i64,
}

fn default_cost_scale() -> f64 {
    1.12
}

fn default_artist_cost_scale() -> f64 {
    1.15
}

fn default_prestige_cost_scale() -> f64 {
    1.5
}

fn default_erasure_divisor() -> f64 {
    1_000_000.0
}

fn default_max_offline_hours() -> f64 {
    8.0
}

fn default_prestige_confirm_ms() -> i64 {
    4_000
}

fn default_reset_confirm_ms() -> i64 {
    3_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Click,
    Passive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEffect {
    pub kind: UpgradeKind,
    pub value: f64,
}

/// A purchasable click (or legacy passive) upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub base_cost: f64,
    pub effect: UpgradeEffect,
}

/// A passive generator type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub base_cost: f64,
    /// Strokes per second produced by one owned unit, before multipliers.
    pub base_rate: f64,
}

/// One stage of the global media multiplier ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTierDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub multiplier: f64,
    pub cost: f64,
}

/// A milestone unlocked by crossing a total-strokes threshold this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwordDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub threshold: f64,
    pub bonus_pct: f64,
}

/// Achievement predicates as plain data interpreted by [`UnlockCondition::is_met`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockCondition {
    TotalClicks { at_least: u64 },
    TotalStrokes { at_least: f64 },
    MediaTier { at_least: usize },
    ArtistsOwned { at_least: u64 },
    /// Elapsed play time; the caller supplies `now_ms` so headless runs can
    /// evaluate this against simulated time.
    PlayMinutes { at_least: u64 },
}

impl UnlockCondition {
    #[must_use]
    pub fn is_met(&self, state: &GameState, now_ms: i64) -> bool {
        match *self {
            UnlockCondition::TotalClicks { at_least } => state.total_clicks >= at_least,
            UnlockCondition::TotalStrokes { at_least } => state.total_strokes >= at_least,
            UnlockCondition::MediaTier { at_least } => state.media_tier >= at_least,
            UnlockCondition::ArtistsOwned { at_least } => state.artists_owned() >= at_least,
            UnlockCondition::PlayMinutes { at_least } => {
                let elapsed_ms = now_ms.saturating_sub(state.play_start_ms);
                elapsed_ms >= i64::try_from(at_least).unwrap_or(i64::MAX).saturating_mul(60_000)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub when: UnlockCondition,
}

/// What a prestige upgrade does, one variant per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrestigeEffect {
    ClickMult { per_level: f64 },
    ArtistMult { per_level: f64 },
    ProductionMult { per_level: f64 },
    StartingTier { tier: usize },
    KeepSwords,
    HeadStart { artist: String, per_level: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeUpgradeDef {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub base_cost: f64,
    pub max_level: u32,
    pub effect: PrestigeEffect,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogData {
    tuning: Tuning,
    media_tiers: Vec<MediaTierDef>,
    swords: Vec<SwordDef>,
    artists: Vec<ArtistDef>,
    upgrades: Vec<UpgradeDef>,
    achievements: Vec<AchievementDef>,
    prestige_upgrades: Vec<PrestigeUpgradeDef>,
}

/// Immutable catalog with id indexes built once at load.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub tuning: Tuning,
    media_tiers: Vec<MediaTierDef>,
    swords: Vec<SwordDef>,
    artists: Vec<ArtistDef>,
    upgrades: Vec<UpgradeDef>,
    achievements: Vec<AchievementDef>,
    prestige_upgrades: Vec<PrestigeUpgradeDef>,
    artist_index: HashMap<String, usize>,
    upgrade_index: HashMap<String, usize>,
    sword_index: HashMap<String, usize>,
    prestige_index: HashMap<String, usize>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the data fails
    /// validation (empty sections, unordered ladders, dangling references).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// The embedded default catalog, parsed once.
    #[must_use]
    pub fn default_catalog() -> &'static Catalog {
        &DEFAULT_CATALOG
    }

    fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let catalog = Self {
            tuning: data.tuning,
            artist_index: index_by_id(&data.artists, |a| &a.id),
            upgrade_index: index_by_id(&data.upgrades, |u| &u.id),
            sword_index: index_by_id(&data.swords, |s| &s.id),
            prestige_index: index_by_id(&data.prestige_upgrades, |p| &p.id),
            media_tiers: data.media_tiers,
            swords: data.swords,
            artists: data.artists,
            upgrades: data.upgrades,
            achievements: data.achievements,
            prestige_upgrades: data.prestige_upgrades,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.media_tiers.is_empty() {
            return Err(CatalogError::Invalid("no media tiers defined".into()));
        }
        if self.artists.is_empty() {
            return Err(CatalogError::Invalid("no artists defined".into()));
        }
        if self.swords.is_empty() || self.swords[0].threshold != 0.0 {
            return Err(CatalogError::Invalid(
                "swords must start with a zero-threshold base entry".into(),
            ));
        }
        for pair in self.swords.windows(2) {
            if pair[1].threshold < pair[0].threshold {
                return Err(CatalogError::Invalid(format!(
                    "sword thresholds out of order at {}",
                    pair[1].id
                )));
            }
        }
        for pair in self.media_tiers.windows(2) {
            if pair[1].cost < pair[0].cost {
                return Err(CatalogError::Invalid(format!(
                    "media tier costs out of order at {}",
                    pair[1].id
                )));
            }
        }
        for def in &self.prestige_upgrades {
            match &def.effect {
                PrestigeEffect::StartingTier { tier } => {
                    if *tier >= self.media_tiers.len() {
                        return Err(CatalogError::Invalid(format!(
                            "prestige upgrade {} references media tier {tier} which does not exist",
                            def.id
                        )));
                    }
                }
                PrestigeEffect::HeadStart { artist, .. } => {
                    if !self.artist_index.contains_key(artist) {
                        return Err(CatalogError::Invalid(format!(
                            "prestige upgrade {} references unknown artist {artist}",
                            def.id
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn media_tiers(&self) -> &[MediaTierDef] {
        &self.media_tiers
    }

    #[must_use]
    pub fn swords(&self) -> &[SwordDef] {
        &self.swords
    }

    #[must_use]
    pub fn artists(&self) -> &[ArtistDef] {
        &self.artists
    }

    #[must_use]
    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    #[must_use]
    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }

    #[must_use]
    pub fn prestige_upgrades(&self) -> &[PrestigeUpgradeDef] {
        &self.prestige_upgrades
    }

    /// The always-unlocked zero-threshold sword.
    #[must_use]
    pub fn base_sword(&self) -> &SwordDef {
        &self.swords[0]
    }

    /// The cheapest artist; target of legacy save migration and head starts.
    #[must_use]
    pub fn base_artist(&self) -> &ArtistDef {
        &self.artists[0]
    }

    #[must_use]
    pub fn media_tier(&self, tier: usize) -> Option<&MediaTierDef> {
        self.media_tiers.get(tier)
    }

    #[must_use]
    pub fn max_media_tier(&self) -> usize {
        self.media_tiers.len() - 1
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownId`] when no upgrade has this id.
    pub fn upgrade(&self, id: &str) -> Result<&UpgradeDef, CatalogError> {
        self.upgrade_index
            .get(id)
            .map(|&i| &self.upgrades[i])
            .ok_or_else(|| CatalogError::UnknownId {
                kind: "upgrade",
                id: id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownId`] when no artist has this id.
    pub fn artist(&self, id: &str) -> Result<&ArtistDef, CatalogError> {
        self.artist_index
            .get(id)
            .map(|&i| &self.artists[i])
            .ok_or_else(|| CatalogError::UnknownId {
                kind: "artist",
                id: id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownId`] when no sword has this id.
    pub fn sword(&self, id: &str) -> Result<&SwordDef, CatalogError> {
        self.sword_index
            .get(id)
            .map(|&i| &self.swords[i])
            .ok_or_else(|| CatalogError::UnknownId {
                kind: "sword",
                id: id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownId`] when no prestige upgrade has this id.
    pub fn prestige_upgrade(&self, id: &str) -> Result<&PrestigeUpgradeDef, CatalogError> {
        self.prestige_index
            .get(id)
            .map(|&i| &self.prestige_upgrades[i])
            .ok_or_else(|| CatalogError::UnknownId {
                kind: "prestige upgrade",
                id: id.to_string(),
            })
    }
}

fn index_by_id<T>(items: &[T], id_of: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (id_of(item).clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_and_validates() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.base_sword().id, "butter_knife");
        assert_eq!(catalog.base_artist().id, "doodler");
        assert_eq!(catalog.max_media_tier(), 6);
        assert!(catalog.tuning.prestige_threshold >= 1_000_000.0);
    }

    #[test]
    fn unknown_ids_fail_fast() {
        let catalog = Catalog::default_catalog();
        assert!(matches!(
            catalog.upgrade("jackhammer"),
            Err(CatalogError::UnknownId { kind: "upgrade", .. })
        ));
        assert!(matches!(
            catalog.artist("phantom"),
            Err(CatalogError::UnknownId { kind: "artist", .. })
        ));
        assert!(catalog.prestige_upgrade("portfolio").is_ok());
    }

    #[test]
    fn rejects_unordered_sword_thresholds() {
        let json = r#"{
            "tuning": { "prestige_threshold": 100 },
            "media_tiers": [ { "id": "a", "name": "A", "desc": "", "multiplier": 1, "cost": 0 } ],
            "swords": [
                { "id": "base", "name": "Base", "desc": "", "threshold": 0, "bonus_pct": 0 },
                { "id": "late", "name": "Late", "desc": "", "threshold": 100, "bonus_pct": 1 },
                { "id": "early", "name": "Early", "desc": "", "threshold": 50, "bonus_pct": 1 }
            ],
            "artists": [ { "id": "a1", "name": "A1", "desc": "", "base_cost": 10, "base_rate": 1 } ],
            "upgrades": [],
            "achievements": [],
            "prestige_upgrades": []
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_dangling_head_start_artist() {
        let json = r#"{
            "tuning": { "prestige_threshold": 100 },
            "media_tiers": [ { "id": "a", "name": "A", "desc": "", "multiplier": 1, "cost": 0 } ],
            "swords": [ { "id": "base", "name": "Base", "desc": "", "threshold": 0, "bonus_pct": 0 } ],
            "artists": [ { "id": "a1", "name": "A1", "desc": "", "base_cost": 10, "base_rate": 1 } ],
            "upgrades": [],
            "achievements": [],
            "prestige_upgrades": [
                { "id": "hs", "name": "HS", "desc": "", "base_cost": 1, "max_level": 1,
                  "effect": { "kind": "head_start", "artist": "ghost", "per_level": 1 } }
            ]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn play_minutes_condition_uses_caller_clock() {
        let catalog = Catalog::default_catalog();
        let state = GameState::new(catalog, 0);
        let cond = UnlockCondition::PlayMinutes { at_least: 30 };
        assert!(!cond.is_met(&state, 29 * 60_000));
        assert!(cond.is_met(&state, 30 * 60_000));
    }
}
