//! Inkblade Game Engine
//!
//! Platform-agnostic progression and economy core for the Inkblade
//! incremental game. This crate owns the numeric model - resource
//! accumulation, cost scaling, multiplier composition, milestone unlocking
//! and the prestige transaction - without UI, audio or storage dependencies.

pub mod catalog;
pub mod economy;
pub mod events;
pub mod numbers;
pub mod save;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use catalog::{
    AchievementDef, ArtistDef, Catalog, CatalogError, MediaTierDef, PrestigeEffect,
    PrestigeUpgradeDef, SwordDef, Tuning, UnlockCondition, UpgradeDef, UpgradeEffect, UpgradeKind,
};
pub use economy::{
    artist_cost, artist_production, can_prestige, effective_click_power, effective_passive_rate,
    erasure_points_for, offline_gain, prestige_upgrade_cost, total_multiplier, upgrade_cost,
};
pub use events::EngineEvent;
pub use save::{SaveError, export_code, import_code, load_from_str, save_string};
pub use session::{ConfirmOutcome, Purchase, Session};
pub use state::{ConfirmGate, GameState};

/// Trait for abstracting save persistence.
/// Platform-specific implementations should provide this.
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a serialized save payload under a slot name.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be written.
    fn write_slot(&self, slot: &str, payload: &str) -> Result<(), Self::Error>;

    /// Read the payload stored under a slot name, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read_slot(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Delete a stored slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    fn delete_slot(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Engine façade tying the catalog to a storage backend.
pub struct GameEngine<S>
where
    S: SaveStorage,
{
    catalog: Catalog,
    storage: S,
}

impl<S> GameEngine<S>
where
    S: SaveStorage,
{
    /// Create an engine over the embedded default catalog.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_catalog(Catalog::default_catalog().clone(), storage)
    }

    #[must_use]
    pub fn with_catalog(catalog: Catalog, storage: S) -> Self {
        Self { catalog, storage }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Start a brand-new game session.
    #[must_use]
    pub fn new_session(&self, now_ms: i64) -> Session {
        Session::new(self.catalog.clone(), now_ms)
    }

    /// Save a session's state, stamping the save time.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save_game(
        &self,
        slot: &str,
        session: &mut Session,
        now_ms: i64,
    ) -> Result<(), anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        session.state_mut().last_save_ms = now_ms;
        let payload = save::save_string(session.state())?;
        self.storage.write_slot(slot, &payload).map_err(Into::into)
    }

    /// Periodic save that swallows storage failures: gameplay continues and
    /// at worst the most recent interval of progress is lost.
    pub fn autosave(&self, slot: &str, session: &mut Session, now_ms: i64)
    where
        S::Error: Into<anyhow::Error>,
    {
        if let Err(err) = self.save_game(slot, session, now_ms) {
            log::warn!("autosave to slot {slot} failed: {err:#}");
        }
    }

    /// Load a saved session, granting capped offline progress for the time
    /// since the last save. A corrupt payload is discarded with a warning
    /// and reported as absent, so callers fall back to a fresh game.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backing store cannot be read.
    pub fn load_game(&self, slot: &str, now_ms: i64) -> Result<Option<Session>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(payload) = self.storage.read_slot(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        let state = match save::load_from_str(&self.catalog, &payload) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("discarding corrupt save in slot {slot}: {err}");
                return Ok(None);
            }
        };
        let elapsed_ms = now_ms.saturating_sub(state.last_save_ms);
        let mut session = Session::from_state(self.catalog.clone(), state);
        if elapsed_ms > 1_000 {
            session.apply_offline_progress(elapsed_ms, now_ms);
        }
        Ok(Some(session))
    }

    /// Load a saved session or start fresh when nothing valid is stored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backing store cannot be read.
    pub fn load_or_new(&self, slot: &str, now_ms: i64) -> Result<Session, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        Ok(self
            .load_game(slot, now_ms)?
            .unwrap_or_else(|| self.new_session(now_ms)))
    }

    /// Delete a stored save slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    pub fn delete_save(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_slot(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        slots: Rc<RefCell<HashMap<String, String>>>,
    }

    impl SaveStorage for MemoryStorage {
        type Error = Infallible;

        fn write_slot(&self, slot: &str, payload: &str) -> Result<(), Self::Error> {
            self.slots
                .borrow_mut()
                .insert(slot.to_string(), payload.to_string());
            Ok(())
        }

        fn read_slot(&self, slot: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.slots.borrow().get(slot).cloned())
        }

        fn delete_slot(&self, slot: &str) -> Result<(), Self::Error> {
            self.slots.borrow_mut().remove(slot);
            Ok(())
        }
    }

    #[test]
    fn engine_saves_and_reloads_state() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut session = engine.new_session(0);
        session.state_mut().strokes = 250.0;
        session.state_mut().total_strokes = 250.0;
        engine.save_game("slot-one", &mut session, 5_000).unwrap();

        let loaded = engine.load_game("slot-one", 5_500).unwrap().expect("save exists");
        assert!((loaded.state().strokes - 250.0).abs() < f64::EPSILON);
        assert_eq!(loaded.state().last_save_ms, 5_000);
        assert!(engine.load_game("missing-slot", 0).unwrap().is_none());
    }

    #[test]
    fn load_grants_offline_progress() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut session = engine.new_session(0);
        session.state_mut().strokes = 100.0;
        session.state_mut().artists.insert("doodler".to_string(), 1);
        let catalog = engine.catalog().clone();
        session.state_mut().recalc_passive_rate(&catalog);
        engine.save_game("slot", &mut session, 0).unwrap();

        // One hour later at 1/sec base rate.
        let loaded = engine.load_game("slot", 3_600_000).unwrap().unwrap();
        assert!((loaded.state().strokes - 3_700.0).abs() < 1e-6);
    }

    #[test]
    fn corrupt_save_falls_back_to_fresh_game() {
        let storage = MemoryStorage::default();
        storage.write_slot("slot", "{\"nonsense\": true}").unwrap();
        let engine = GameEngine::new(storage);
        assert!(engine.load_game("slot", 0).unwrap().is_none());
        let fresh = engine.load_or_new("slot", 7).unwrap();
        assert_eq!(fresh.state().play_start_ms, 7);
    }

    #[test]
    fn delete_save_removes_slot() {
        let engine = GameEngine::new(MemoryStorage::default());
        let mut session = engine.new_session(0);
        engine.save_game("slot", &mut session, 0).unwrap();
        engine.delete_save("slot").unwrap();
        assert!(engine.load_game("slot", 0).unwrap().is_none());
    }
}
