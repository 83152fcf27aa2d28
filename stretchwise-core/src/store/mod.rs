//! Storage interfaces consumed by the selection engine and analytics.
//!
//! Persistence is swappable: the core only talks to these traits, and
//! [`open_store`] picks the backend named in configuration.
//!
//! - [`crate::db::Database`] - SQLite (default)
//! - [`json::JsonStore`] - a single JSON file, or purely in memory

pub mod json;

use crate::config::{Config, StorageBackend};
use crate::db::Database;
use crate::error::Result;
use crate::types::{Action, DailyAggregate, NewAction, NewStretch, Preferences, Stretch, StretchUpdate};
use chrono::NaiveDate;

pub use json::JsonStore;

/// The stretch catalog.
pub trait CatalogStore {
    /// All stretches, ordered by id.
    fn list(&self) -> Result<Vec<Stretch>>;

    /// Look up one stretch.
    fn get(&self, id: i64) -> Result<Option<Stretch>>;

    /// Validate and insert a stretch, returning its new id (max id + 1, or 1).
    ///
    /// Fails with `DuplicateName` if another stretch already has this name.
    fn add(&self, stretch: &NewStretch) -> Result<i64>;

    /// Replace fields of an existing stretch and return the stored result.
    ///
    /// Name uniqueness is re-checked excluding the stretch itself.
    fn update(&self, id: i64, update: &StretchUpdate) -> Result<Stretch>;

    /// Remove a stretch and every history record referencing it.
    ///
    /// Returns the number of history records removed.
    fn delete(&self, id: i64) -> Result<usize>;

    /// Stretches that may be offered; a missing enabled flag counts as enabled.
    fn list_enabled(&self) -> Result<Vec<Stretch>> {
        Ok(self.list()?.into_iter().filter(Stretch::is_enabled).collect())
    }
}

/// Append-only action history.
pub trait HistoryStore {
    /// Append an action, returning its id. Ids are monotonic and never reused.
    fn append(&self, action: &NewAction) -> Result<i64>;

    /// Every action for one stretch, oldest first.
    fn query_by_stretch(&self, stretch_id: i64) -> Result<Vec<Action>>;

    /// Every action, oldest first.
    fn query_all(&self) -> Result<Vec<Action>>;

    /// Actions recorded on one calendar date, oldest first.
    fn query_by_date(&self, date: NaiveDate) -> Result<Vec<Action>> {
        Ok(self
            .query_all()?
            .into_iter()
            .filter(|a| a.date == date)
            .collect())
    }

    /// Remove every action for one stretch, returning how many were removed.
    fn delete_by_stretch(&self, stretch_id: i64) -> Result<usize>;

    /// Full history reset.
    fn delete_all(&self) -> Result<usize>;

    /// Per-date counts, oldest first, derived from the current history.
    fn daily_aggregates(&self) -> Result<Vec<DailyAggregate>> {
        Ok(crate::analytics::daily_aggregates(&self.query_all()?))
    }
}

/// The five tuning values.
pub trait PreferenceStore {
    /// Stored preferences, with defaults for anything never set.
    fn preferences(&self) -> Result<Preferences>;

    /// Validate and persist all five values.
    fn save_preferences(&self, prefs: &Preferences) -> Result<()>;
}

/// A backend that provides all three stores.
pub trait Store: CatalogStore + HistoryStore + PreferenceStore + Send + Sync {}

impl<T> Store for T where T: CatalogStore + HistoryStore + PreferenceStore + Send + Sync {}

/// Open the backend selected by configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn Store>> {
    let path = config.storage.resolved_path();
    tracing::info!(
        backend = config.storage.backend.as_str(),
        path = %path.display(),
        "Opening store"
    );

    match config.storage.backend {
        StorageBackend::Sqlite => {
            let db = Database::open(&path)?;
            db.migrate()?;
            Ok(Box::new(db))
        }
        StorageBackend::Json => Ok(Box::new(JsonStore::open(&path)?)),
    }
}

/// Find a stretch or fail with `NotFound`.
pub fn require_stretch<S: CatalogStore + ?Sized>(store: &S, id: i64) -> Result<Stretch> {
    store.get(id)?.ok_or(crate::error::Error::NotFound(id))
}
