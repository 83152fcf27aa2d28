//! Core domain types for stretchwise
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Stretch** | A single exercise/mobility entry in the catalog |
//! | **Action** | One recorded response (completed or skipped) to an offered stretch |
//! | **DailyAggregate** | Per-date completed/skipped counts derived from actions |
//! | **Preferences** | The five tuning values read by the selection engine |
//!
//! Actions carry a copy of the stretch name taken when they were recorded.
//! The copy is intentional: history keeps reading correctly after the stretch
//! is renamed or deleted, so [`Action`] never joins back to the live catalog.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ============================================
// Stretch
// ============================================

/// How strongly a stretch should be favored by the weighting engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Low => "low",
        }
    }

    /// Parse a stored value, treating anything unrecognized as low priority.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = s, "Unrecognized priority, treating as low");
            Priority::Low
        })
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

// Stored documents may hold values from older versions; read them lossily
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Priority::from_stored).unwrap_or_default())
    }
}

/// Body area a stretch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hips,
    Core,
    FeetAnkles,
    SpineShoulders,
    Functional,
    Mobility,
    Flexibility,
    #[default]
    General,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Category::Hips,
        Category::Core,
        Category::FeetAnkles,
        Category::SpineShoulders,
        Category::Functional,
        Category::Mobility,
        Category::Flexibility,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hips => "hips",
            Category::Core => "core",
            Category::FeetAnkles => "feet_ankles",
            Category::SpineShoulders => "spine_shoulders",
            Category::Functional => "functional",
            Category::Mobility => "mobility",
            Category::Flexibility => "flexibility",
            Category::General => "general",
        }
    }

    /// Parse a stored value, falling back to `general`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = s, "Unrecognized category, treating as general");
            Category::General
        })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Category::from_stored).unwrap_or_default())
    }
}

/// A stretch in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stretch {
    /// Positive, unique, stable once assigned
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    pub description: String,
    /// Older records may lack the flag entirely; see [`Stretch::is_enabled`].
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl Stretch {
    /// A missing flag counts as enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// A stretch that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStretch {
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    pub description: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl NewStretch {
    pub fn new(
        name: impl Into<String>,
        priority: Priority,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            category,
            description: description.into(),
            enabled: None,
        }
    }

    /// Build from raw form input, validating every field at once.
    pub fn parse(name: &str, priority: &str, category: &str, description: &str) -> Result<Self> {
        crate::validation::validate(name, priority, category, description).into_result()?;
        Ok(Self {
            name: name.trim().to_string(),
            priority: Priority::from_stored(priority),
            category: Category::from_stored(category),
            description: description.trim().to_string(),
            enabled: None,
        })
    }

    /// Check field rules on an already-typed stretch.
    pub fn validate(&self) -> Result<()> {
        crate::validation::validate(
            &self.name,
            self.priority.as_str(),
            self.category.as_str(),
            &self.description,
        )
        .into_result()
    }

    /// Attach an id; `enabled` defaults to true when omitted.
    pub fn with_id(self, id: i64) -> Stretch {
        Stretch {
            id,
            name: self.name,
            priority: self.priority,
            category: self.category,
            description: self.description,
            enabled: Some(self.enabled.unwrap_or(true)),
        }
    }
}

/// Field replacements for a catalog update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StretchUpdate {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

impl StretchUpdate {
    /// Only flip the enabled flag.
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    /// Produce the updated stretch without touching its id.
    pub fn apply_to(&self, current: &Stretch) -> Stretch {
        Stretch {
            id: current.id,
            name: self
                .name
                .as_ref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            priority: self.priority.unwrap_or(current.priority),
            category: self.category.unwrap_or(current.category),
            description: self
                .description
                .as_ref()
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| current.description.clone()),
            enabled: self.enabled.or(current.enabled),
        }
    }
}

// ============================================
// Action
// ============================================

/// What the user did with an offered stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Completed,
    Skipped,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Completed => "completed",
            ActionKind::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "completed" => Ok(ActionKind::Completed),
            "skipped" => Ok(ActionKind::Skipped),
            _ => Err(format!("unknown action: {}", s)),
        }
    }
}

/// One immutable history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub stretch_id: i64,
    /// Name at record time, kept even if the stretch is renamed or deleted
    pub stretch_name: String,
    pub action: ActionKind,
    pub timestamp: DateTime<Utc>,
    /// Calendar date used for all daily grouping
    pub date: NaiveDate,
}

impl Action {
    pub fn is_completed(&self) -> bool {
        self.action == ActionKind::Completed
    }
}

/// An action waiting to be appended to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAction {
    pub stretch_id: i64,
    pub stretch_name: String,
    pub action: ActionKind,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

impl NewAction {
    /// Record `action` against `stretch` at instant `at`.
    ///
    /// Both `timestamp` and `date` come from `at`, so the date is the calendar
    /// day in `at`'s own time zone.
    pub fn for_stretch<Tz: TimeZone>(stretch: &Stretch, action: ActionKind, at: &DateTime<Tz>) -> Self {
        Self {
            stretch_id: stretch.id,
            stretch_name: stretch.name.clone(),
            action,
            timestamp: at.with_timezone(&Utc),
            date: at.date_naive(),
        }
    }

    pub fn with_id(self, id: i64) -> Action {
        Action {
            id,
            stretch_id: self.stretch_id,
            stretch_name: self.stretch_name,
            action: self.action,
            timestamp: self.timestamp,
            date: self.date,
        }
    }
}

// ============================================
// Daily aggregates
// ============================================

/// Completed/skipped counts for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub completed_count: i64,
    pub skipped_count: i64,
    /// Always `completed_count + skipped_count`
    pub total_count: i64,
}

impl DailyAggregate {
    pub fn new(date: NaiveDate, completed_count: i64, skipped_count: i64) -> Self {
        Self {
            date,
            completed_count,
            skipped_count,
            total_count: completed_count + skipped_count,
        }
    }

    pub(crate) fn record(&mut self, action: ActionKind) {
        match action {
            ActionKind::Completed => self.completed_count += 1,
            ActionKind::Skipped => self.skipped_count += 1,
        }
        self.total_count += 1;
    }
}

// ============================================
// Preferences
// ============================================

/// Tuning values for the selection engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Completions per day the user is aiming for
    pub daily_goal: f64,
    pub high_priority_weight: f64,
    pub low_priority_weight: f64,
    /// Recency boost per day since the last completion
    pub recency_weight: f64,
    /// Boost for stretches with no history at all
    pub never_done_bonus: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            daily_goal: 5.0,
            high_priority_weight: 3.0,
            low_priority_weight: 1.0,
            recency_weight: 2.0,
            never_done_bonus: 5.0,
        }
    }
}

impl Preferences {
    /// Preference keys, in storage order.
    pub const KEYS: [&'static str; 5] = [
        "daily_goal",
        "high_priority_weight",
        "low_priority_weight",
        "recency_weight",
        "never_done_bonus",
    ];

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "daily_goal" => Some(self.daily_goal),
            "high_priority_weight" => Some(self.high_priority_weight),
            "low_priority_weight" => Some(self.low_priority_weight),
            "recency_weight" => Some(self.recency_weight),
            "never_done_bonus" => Some(self.never_done_bonus),
            _ => None,
        }
    }

    /// Replace a value by key.
    pub fn set(&mut self, key: &str, value: f64) -> Result<()> {
        let slot = match key {
            "daily_goal" => &mut self.daily_goal,
            "high_priority_weight" => &mut self.high_priority_weight,
            "low_priority_weight" => &mut self.low_priority_weight,
            "recency_weight" => &mut self.recency_weight,
            "never_done_bonus" => &mut self.never_done_bonus,
            _ => return Err(Error::Config(format!("unknown preference: {}", key))),
        };
        *slot = value;
        Ok(())
    }

    /// Every value must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.entries() {
            if !value.is_finite() {
                return Err(Error::InvalidPreference {
                    name,
                    reason: "must be a finite number".to_string(),
                });
            }
            if value < 0.0 {
                return Err(Error::InvalidPreference {
                    name,
                    reason: format!("must be non-negative, got {}", value),
                });
            }
        }
        Ok(())
    }

    /// Put every value back to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `(key, value)` pairs in storage order.
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("daily_goal", self.daily_goal),
            ("high_priority_weight", self.high_priority_weight),
            ("low_priority_weight", self.low_priority_weight),
            ("recency_weight", self.recency_weight),
            ("never_done_bonus", self.never_done_bonus),
        ]
    }
}
