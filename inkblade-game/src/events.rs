//! Discrete events emitted by the progression engine for external observers.
//!
//! The engine never renders or plays audio; UIs and the headless simulator
//! drain these after each mutation and present them however they like.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Strokes gained from a single manual action; feeds floating-text UIs.
    StrokesGained { amount: f64 },
    UpgradePurchased {
        id: String,
        name: String,
        owned: u32,
        cost: f64,
    },
    ArtistHired {
        id: String,
        name: String,
        owned: u32,
        cost: f64,
    },
    MediaTierReached {
        tier: usize,
        name: String,
        multiplier: f64,
        cost: f64,
    },
    SwordUnlocked {
        id: String,
        name: String,
        desc: String,
        bonus_pct: f64,
    },
    AchievementUnlocked {
        id: String,
        name: String,
        desc: String,
    },
    PrestigeUpgradePurchased {
        id: String,
        name: String,
        level: u32,
        cost: f64,
    },
    PrestigeCompleted { number: u32, earned: f64 },
    GameReset,
    OfflineProgress { gained: f64, seconds: f64 },
}
