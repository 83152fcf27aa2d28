//! Flat-file JSON backend.
//!
//! The whole dataset lives in one document that is rewritten on every
//! mutation. Writes go to a sibling temp file and are renamed into place, so
//! a crash never leaves a half-written document behind.

use crate::error::{Error, Result};
use crate::store::{CatalogStore, HistoryStore, PreferenceStore};
use crate::types::{Action, NewAction, NewStretch, Preferences, Stretch, StretchUpdate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// On-disk document layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    stretches: Vec<Stretch>,
    #[serde(default)]
    history: Vec<Action>,
    /// Highest action id ever issued; survives history resets
    #[serde(default)]
    last_action_id: i64,
    #[serde(default)]
    preferences: Option<Preferences>,
}

impl Document {
    fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> bool {
        self.stretches
            .iter()
            .any(|s| s.name == name && Some(s.id) != exclude_id)
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.stretches
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::NotFound(id))
    }

    fn remove_history_for(&mut self, stretch_id: i64) -> usize {
        let before = self.history.len();
        self.history.retain(|a| a.stretch_id != stretch_id);
        before - self.history.len()
    }
}

/// JSON-file store; `path: None` keeps everything in memory.
pub struct JsonStore {
    path: Option<PathBuf>,
    doc: Mutex<Document>,
}

impl JsonStore {
    /// Open (or start) a store backed by `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut doc: Document = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Document::default()
        };

        // Older files may predate the counter
        let max_id = doc.history.iter().map(|a| a.id).max().unwrap_or(0);
        doc.last_action_id = doc.last_action_id.max(max_id);

        tracing::debug!(
            path = %path.display(),
            stretches = doc.stretches.len(),
            actions = doc.history.len(),
            "Loaded JSON store"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            doc: Mutex::new(doc),
        })
    }

    /// A store that never touches disk (for testing).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(Document::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `f` to a copy of the document, persist it, then publish it.
    ///
    /// If `f` or the write fails, the in-memory state is left untouched.
    fn mutate<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }

    fn persist(&self, doc: &Document) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl CatalogStore for JsonStore {
    fn list(&self) -> Result<Vec<Stretch>> {
        let mut stretches = self.lock().stretches.clone();
        stretches.sort_by_key(|s| s.id);
        Ok(stretches)
    }

    fn get(&self, id: i64) -> Result<Option<Stretch>> {
        Ok(self.lock().stretches.iter().find(|s| s.id == id).cloned())
    }

    fn add(&self, stretch: &NewStretch) -> Result<i64> {
        stretch.validate()?;
        self.mutate(|doc| {
            let name = stretch.name.trim();
            if doc.name_taken(name, None) {
                return Err(Error::DuplicateName(name.to_string()));
            }
            let id = doc.stretches.iter().map(|s| s.id).max().unwrap_or(0) + 1;
            let mut record = stretch.clone().with_id(id);
            record.name = name.to_string();
            record.description = record.description.trim().to_string();
            doc.stretches.push(record);
            Ok(id)
        })
    }

    fn update(&self, id: i64, update: &StretchUpdate) -> Result<Stretch> {
        self.mutate(|doc| {
            let idx = doc.position(id)?;
            let updated = update.apply_to(&doc.stretches[idx]);
            crate::validation::validate(
                &updated.name,
                updated.priority.as_str(),
                updated.category.as_str(),
                &updated.description,
            )
            .into_result()?;
            if doc.name_taken(&updated.name, Some(id)) {
                return Err(Error::DuplicateName(updated.name));
            }
            doc.stretches[idx] = updated.clone();
            Ok(updated)
        })
    }

    fn delete(&self, id: i64) -> Result<usize> {
        self.mutate(|doc| {
            let idx = doc.position(id)?;
            doc.stretches.remove(idx);
            Ok(doc.remove_history_for(id))
        })
    }
}

impl HistoryStore for JsonStore {
    fn append(&self, action: &NewAction) -> Result<i64> {
        self.mutate(|doc| {
            doc.last_action_id += 1;
            let id = doc.last_action_id;
            doc.history.push(action.clone().with_id(id));
            Ok(id)
        })
    }

    fn query_by_stretch(&self, stretch_id: i64) -> Result<Vec<Action>> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|a| a.stretch_id == stretch_id)
            .cloned()
            .collect())
    }

    fn query_all(&self) -> Result<Vec<Action>> {
        Ok(self.lock().history.clone())
    }

    fn delete_by_stretch(&self, stretch_id: i64) -> Result<usize> {
        self.mutate(|doc| Ok(doc.remove_history_for(stretch_id)))
    }

    fn delete_all(&self) -> Result<usize> {
        self.mutate(|doc| {
            let removed = doc.history.len();
            doc.history.clear();
            Ok(removed)
        })
    }
}

impl PreferenceStore for JsonStore {
    fn preferences(&self) -> Result<Preferences> {
        Ok(self.lock().preferences.unwrap_or_default())
    }

    fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        prefs.validate()?;
        self.mutate(|doc| {
            doc.preferences = Some(*prefs);
            Ok(())
        })
    }
}
