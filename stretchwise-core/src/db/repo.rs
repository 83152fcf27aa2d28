//! Database repository layer
//!
//! SQLite implementation of the catalog, history and preference stores.

use crate::error::{Error, Result};
use crate::store::{CatalogStore, HistoryStore, PreferenceStore};
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves SQLite itself consistent
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn row_to_stretch(row: &Row) -> rusqlite::Result<Stretch> {
        let priority: String = row.get("priority")?;
        let category: String = row.get("category")?;

        Ok(Stretch {
            id: row.get("id")?,
            name: row.get("name")?,
            priority: Priority::from_stored(&priority),
            category: Category::from_stored(&category),
            description: row.get("description")?,
            enabled: row.get("enabled")?,
        })
    }

    fn row_to_action(row: &Row) -> rusqlite::Result<Action> {
        let action_str: String = row.get("action")?;
        let timestamp_str: String = row.get("timestamp")?;
        let date_str: String = row.get("date")?;

        let action = action_str.parse::<ActionKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        let date = parse_date(&date_str, 5)?;

        Ok(Action {
            id: row.get("id")?,
            stretch_id: row.get("stretch_id")?,
            stretch_name: row.get("stretch_name")?,
            action,
            timestamp,
            date,
        })
    }

    fn name_taken(tx: &Transaction, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let existing: Option<i64> = tx
            .query_row("SELECT id FROM stretches WHERE name = ?", [name], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(matches!(existing, Some(id) if Some(id) != exclude_id))
    }

    fn query_actions(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Action>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(sql)?;
        let actions = stmt
            .query_map(params, Self::row_to_action)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(actions)
    }
}

fn parse_date(s: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Map a UNIQUE violation on `stretches.name` to `DuplicateName`.
fn map_unique_name(err: rusqlite::Error, name: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Error::DuplicateName(name.to_string())
        }
        _ => Error::Database(err),
    }
}

// ============================================
// Catalog operations
// ============================================

impl CatalogStore for Database {
    fn list(&self) -> Result<Vec<Stretch>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT * FROM stretches ORDER BY id")?;
        let stretches = stmt
            .query_map([], Self::row_to_stretch)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stretches)
    }

    fn get(&self, id: i64) -> Result<Option<Stretch>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM stretches WHERE id = ?",
            [id],
            Self::row_to_stretch,
        )
        .optional()
        .map_err(Error::from)
    }

    fn add(&self, stretch: &NewStretch) -> Result<i64> {
        stretch.validate()?;
        let name = stretch.name.trim();

        let mut conn = self.connection();
        let tx = conn.transaction()?;

        if Self::name_taken(&tx, name, None)? {
            return Err(Error::DuplicateName(name.to_string()));
        }

        // max + 1 inside the write transaction, so concurrent writers serialize
        tx.execute(
            r#"
            INSERT INTO stretches (id, name, priority, category, description, enabled)
            VALUES ((SELECT COALESCE(MAX(id), 0) + 1 FROM stretches), ?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                name,
                stretch.priority.as_str(),
                stretch.category.as_str(),
                stretch.description.trim(),
                stretch.enabled.unwrap_or(true),
            ],
        )
        .map_err(|e| map_unique_name(e, name))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(id, name, "Added stretch");
        Ok(id)
    }

    fn update(&self, id: i64, update: &StretchUpdate) -> Result<Stretch> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT * FROM stretches WHERE id = ?",
                [id],
                Self::row_to_stretch,
            )
            .optional()?
            .ok_or(Error::NotFound(id))?;

        let updated = update.apply_to(&current);
        crate::validation::validate(
            &updated.name,
            updated.priority.as_str(),
            updated.category.as_str(),
            &updated.description,
        )
        .into_result()?;

        if Self::name_taken(&tx, &updated.name, Some(id))? {
            return Err(Error::DuplicateName(updated.name));
        }

        tx.execute(
            r#"
            UPDATE stretches
            SET name = ?2, priority = ?3, category = ?4, description = ?5, enabled = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                updated.name,
                updated.priority.as_str(),
                updated.category.as_str(),
                updated.description,
                updated.enabled,
            ],
        )
        .map_err(|e| map_unique_name(e, &updated.name))?;
        tx.commit()?;

        tracing::debug!(id, name = %updated.name, "Updated stretch");
        Ok(updated)
    }

    fn delete(&self, id: i64) -> Result<usize> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let removed_history = tx.execute("DELETE FROM history WHERE stretch_id = ?", [id])?;
        let removed = tx.execute("DELETE FROM stretches WHERE id = ?", [id])?;
        if removed == 0 {
            // Dropping the transaction rolls back the history delete
            return Err(Error::NotFound(id));
        }
        tx.commit()?;

        tracing::info!(id, removed_history, "Deleted stretch");
        Ok(removed_history)
    }

    fn list_enabled(&self) -> Result<Vec<Stretch>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT * FROM stretches WHERE enabled IS NULL OR enabled != 0 ORDER BY id",
        )?;
        let stretches = stmt
            .query_map([], Self::row_to_stretch)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stretches)
    }
}

// ============================================
// History operations
// ============================================

impl HistoryStore for Database {
    fn append(&self, action: &NewAction) -> Result<i64> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO history (stretch_id, stretch_name, action, timestamp, date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                action.stretch_id,
                action.stretch_name,
                action.action.as_str(),
                action.timestamp.to_rfc3339(),
                action.date.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query_by_stretch(&self, stretch_id: i64) -> Result<Vec<Action>> {
        self.query_actions(
            "SELECT * FROM history WHERE stretch_id = ? ORDER BY id",
            [stretch_id],
        )
    }

    fn query_all(&self) -> Result<Vec<Action>> {
        self.query_actions("SELECT * FROM history ORDER BY id", [])
    }

    fn query_by_date(&self, date: NaiveDate) -> Result<Vec<Action>> {
        self.query_actions(
            "SELECT * FROM history WHERE date = ? ORDER BY id",
            [date.format(DATE_FORMAT).to_string()],
        )
    }

    fn delete_by_stretch(&self, stretch_id: i64) -> Result<usize> {
        let conn = self.connection();
        Ok(conn.execute("DELETE FROM history WHERE stretch_id = ?", [stretch_id])?)
    }

    fn delete_all(&self) -> Result<usize> {
        let conn = self.connection();
        let removed = conn.execute("DELETE FROM history", [])?;
        tracing::info!(removed, "Cleared history");
        Ok(removed)
    }

    fn daily_aggregates(&self) -> Result<Vec<DailyAggregate>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            r#"
            SELECT date,
                   SUM(CASE WHEN action = 'completed' THEN 1 ELSE 0 END),
                   SUM(CASE WHEN action = 'skipped' THEN 1 ELSE 0 END)
            FROM history
            GROUP BY date
            ORDER BY date
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let date_str: String = row.get(0)?;
                Ok(DailyAggregate::new(
                    parse_date(&date_str, 0)?,
                    row.get(1)?,
                    row.get(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ============================================
// Preference operations
// ============================================

impl PreferenceStore for Database {
    fn preferences(&self) -> Result<Preferences> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
        let stored = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut prefs = Preferences::default();
        for (key, value) in stored {
            if prefs.set(&key, value).is_err() {
                tracing::warn!(key = %key, "Ignoring unknown stored preference");
            }
        }
        Ok(prefs)
    }

    fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        prefs.validate()?;

        let mut conn = self.connection();
        let tx = conn.transaction()?;
        for (key, value) in prefs.entries() {
            tx.execute(
                r#"
                INSERT INTO preferences (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn squat() -> NewStretch {
        NewStretch::new(
            "Squat Hold",
            Priority::High,
            Category::Hips,
            "Hold a deep squat for 60 seconds",
        )
    }

    fn action_on(stretch: &Stretch, kind: ActionKind, day: u32) -> NewAction {
        let at = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
        NewAction::for_stretch(stretch, kind, &at)
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let db = test_db();
        let id = db.add(&squat()).unwrap();
        assert_eq!(id, 1);

        let stored = db.get(id).unwrap().unwrap();
        assert_eq!(stored, squat().with_id(1));
        assert_eq!(stored.enabled, Some(true));
    }

    #[test]
    fn test_ids_follow_max_plus_one() {
        let db = test_db();
        let first = db.add(&squat()).unwrap();
        let second = db
            .add(&NewStretch::new("Plank", Priority::Low, Category::Core, "Hold"))
            .unwrap();
        assert_eq!((first, second), (1, 2));

        db.delete(first).unwrap();
        let third = db
            .add(&NewStretch::new("Cat Cow", Priority::Low, Category::SpineShoulders, "Flow"))
            .unwrap();
        assert_eq!(third, 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = test_db();
        db.add(&squat()).unwrap();
        let err = db.add(&squat()).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "Squat Hold"));
    }

    #[test]
    fn test_add_validates_fields() {
        let db = test_db();
        let err = db
            .add(&NewStretch::new("", Priority::Low, Category::Core, ""))
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(errors) if errors.len() == 2));
        assert!(db.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_rechecks_name_excluding_self() {
        let db = test_db();
        let squat_id = db.add(&squat()).unwrap();
        let plank_id = db
            .add(&NewStretch::new("Plank", Priority::Low, Category::Core, "Hold"))
            .unwrap();

        // Renaming to its own name is fine
        let same = StretchUpdate {
            name: Some("Squat Hold".to_string()),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        let updated = db.update(squat_id, &same).unwrap();
        assert_eq!(updated.priority, Priority::Low);

        let clash = StretchUpdate {
            name: Some("Squat Hold".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            db.update(plank_id, &clash),
            Err(Error::DuplicateName(_))
        ));
        assert!(matches!(
            db.update(99, &StretchUpdate::enabled(false)),
            Err(Error::NotFound(99))
        ));
    }

    #[test]
    fn test_delete_cascades_history() {
        let db = test_db();
        let squat_id = db.add(&squat()).unwrap();
        let plank_id = db
            .add(&NewStretch::new("Plank", Priority::Low, Category::Core, "Hold"))
            .unwrap();
        let squat = db.get(squat_id).unwrap().unwrap();
        let plank = db.get(plank_id).unwrap().unwrap();

        db.append(&action_on(&squat, ActionKind::Completed, 1)).unwrap();
        db.append(&action_on(&squat, ActionKind::Skipped, 2)).unwrap();
        db.append(&action_on(&plank, ActionKind::Completed, 2)).unwrap();

        assert_eq!(db.delete(squat_id).unwrap(), 2);
        assert!(db.get(squat_id).unwrap().is_none());
        assert!(db.query_by_stretch(squat_id).unwrap().is_empty());
        assert_eq!(db.query_by_stretch(plank_id).unwrap().len(), 1);

        assert!(matches!(db.delete(squat_id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_null_enabled_counts_as_enabled() {
        let db = test_db();
        db.connection()
            .execute(
                "INSERT INTO stretches (id, name, priority, category, description, enabled)
                 VALUES (7, 'Legacy', 'urgent', 'hips', 'Old row', NULL)",
                [],
            )
            .unwrap();
        let id = db
            .add(&NewStretch {
                enabled: Some(false),
                ..squat()
            })
            .unwrap();
        assert_eq!(id, 8);

        let enabled = db.list_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].enabled, None);
        assert_eq!(enabled[0].priority, Priority::Low);
    }

    #[test]
    fn test_history_keeps_name_after_rename() {
        let db = test_db();
        let id = db.add(&squat()).unwrap();
        let stretch = db.get(id).unwrap().unwrap();
        db.append(&action_on(&stretch, ActionKind::Completed, 3)).unwrap();

        db.update(
            id,
            &StretchUpdate {
                name: Some("Deep Squat".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let history = db.query_all().unwrap();
        assert_eq!(history[0].stretch_name, "Squat Hold");
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn test_daily_aggregates_match_history() {
        let db = test_db();
        let id = db.add(&squat()).unwrap();
        let stretch = db.get(id).unwrap().unwrap();
        for (kind, day) in [
            (ActionKind::Completed, 1),
            (ActionKind::Skipped, 1),
            (ActionKind::Completed, 1),
            (ActionKind::Skipped, 4),
        ] {
            db.append(&action_on(&stretch, kind, day)).unwrap();
        }

        let sql_rows = db.daily_aggregates().unwrap();
        let folded = crate::analytics::daily_aggregates(&db.query_all().unwrap());
        assert_eq!(sql_rows, folded);
        assert_eq!(sql_rows.len(), 2);
        assert_eq!(sql_rows[0].completed_count, 2);
        assert_eq!(sql_rows[0].total_count, 3);
        assert_eq!(sql_rows[1].skipped_count, 1);

        let day_one = db
            .query_by_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .unwrap();
        assert_eq!(day_one.len(), 3);
    }

    #[test]
    fn test_action_ids_not_reused_after_reset() {
        let db = test_db();
        let id = db.add(&squat()).unwrap();
        let stretch = db.get(id).unwrap().unwrap();
        let first = db.append(&action_on(&stretch, ActionKind::Completed, 1)).unwrap();
        assert_eq!(db.delete_all().unwrap(), 1);
        let second = db.append(&action_on(&stretch, ActionKind::Completed, 2)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_preferences_default_then_saved() {
        let db = test_db();
        assert_eq!(db.preferences().unwrap(), Preferences::default());

        let prefs = Preferences {
            recency_weight: 0.5,
            ..Default::default()
        };
        db.save_preferences(&prefs).unwrap();
        assert_eq!(db.preferences().unwrap(), prefs);

        let bad = Preferences {
            never_done_bonus: -2.0,
            ..Default::default()
        };
        assert!(db.save_preferences(&bad).is_err());
        assert_eq!(db.preferences().unwrap(), prefs);
    }
}
