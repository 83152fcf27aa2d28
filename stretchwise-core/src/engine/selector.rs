//! Selector: picks the next stretch to show and records the response.

use chrono::{DateTime, NaiveDate, TimeZone};
use rand::Rng;

use crate::error::Result;
use crate::store::{require_stretch, CatalogStore, HistoryStore, PreferenceStore};
use crate::types::{Action, ActionKind, NewAction, Preferences, Stretch};

use super::gate::can_offer;
use super::weights::compute_weights;

/// Shown when no enabled stretches exist.
pub const EMPTY_CATALOG_MESSAGE: &str =
    "No stretches yet. Add a few stretches to your catalog to get started!";

/// One of these is shown when every enabled stretch has hit today's limit.
pub const CELEBRATION_MESSAGES: [&str; 10] = [
    "You've stretched everything on the list today. Amazing work!",
    "All done for today! Your body thanks you.",
    "Every stretch is taken care of. Time to rest and recover.",
    "Daily stretching complete. See you tomorrow!",
    "Nothing left to stretch today. You're on fire!",
    "That's a wrap! Every stretch has had its turn today.",
    "You've hit every stretch today. Consistency pays off!",
    "Limber and loose. Come back tomorrow for more.",
    "All stretches handled for today. Enjoy the flexibility!",
    "Today's routine is finished. Great job showing up!",
];

/// Outcome of [`select_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// The stretch to offer
    Stretch(Stretch),
    /// No enabled stretches exist at all
    EmptyCatalog { message: &'static str },
    /// Enabled stretches exist, but all are blocked for today
    LimitReached { message: &'static str },
}

impl SelectionResult {
    pub fn stretch(&self) -> Option<&Stretch> {
        match self {
            SelectionResult::Stretch(s) => Some(s),
            SelectionResult::EmptyCatalog { .. } | SelectionResult::LimitReached { .. } => None,
        }
    }
}

/// Load the catalog, history and preferences and pick one stretch for `today`.
///
/// Nothing is cached between calls; every call reads fresh store snapshots.
pub fn select_next<S, R>(store: &S, today: NaiveDate, rng: &mut R) -> Result<SelectionResult>
where
    S: CatalogStore + HistoryStore + PreferenceStore + ?Sized,
    R: Rng,
{
    let enabled = store.list_enabled()?;
    if enabled.is_empty() {
        return Ok(SelectionResult::EmptyCatalog {
            message: EMPTY_CATALOG_MESSAGE,
        });
    }

    let history = store.query_all()?;
    let prefs = store.preferences()?;
    Ok(choose(enabled, &history, &prefs, today, rng))
}

/// Pure selection over snapshots: gate, weight, then draw.
pub fn choose<R: Rng>(
    enabled: Vec<Stretch>,
    history: &[Action],
    prefs: &Preferences,
    today: NaiveDate,
    rng: &mut R,
) -> SelectionResult {
    if enabled.is_empty() {
        return SelectionResult::EmptyCatalog {
            message: EMPTY_CATALOG_MESSAGE,
        };
    }

    let mut eligible: Vec<Stretch> = enabled
        .into_iter()
        .filter(|s| can_offer(s.id, history, today).allowed)
        .collect();

    if eligible.is_empty() {
        let idx = rng.gen_range(0..CELEBRATION_MESSAGES.len());
        tracing::debug!("All enabled stretches reached today's limit");
        return SelectionResult::LimitReached {
            message: CELEBRATION_MESSAGES[idx],
        };
    }

    let weights = compute_weights(&eligible, history, prefs, today);
    let idx = weighted_index(&weights, rng).unwrap_or(0);
    let picked = eligible.swap_remove(idx);

    tracing::debug!(
        id = picked.id,
        name = %picked.name,
        candidates = weights.len(),
        probability = weights.get(idx).copied().unwrap_or_default(),
        "Selected stretch"
    );

    SelectionResult::Stretch(picked)
}

/// Draw an index from a probability distribution by inverting its CDF.
///
/// Returns `None` only for an empty slice.
pub fn weighted_index<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let target: f64 = rng.gen::<f64>() * weights.iter().sum::<f64>();
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if target < cumulative {
            return Some(i);
        }
    }

    // Rounding can leave the target just past the final bucket
    weights.iter().rposition(|w| *w > 0.0).or(Some(weights.len() - 1))
}

/// Record the user's response to an offered stretch.
///
/// The stretch name is copied onto the action, and both its timestamp and
/// its calendar date are taken from `at`.
pub fn record_action<S, Tz>(
    store: &S,
    stretch_id: i64,
    kind: ActionKind,
    at: &DateTime<Tz>,
) -> Result<Action>
where
    S: CatalogStore + HistoryStore + ?Sized,
    Tz: TimeZone,
{
    let stretch = require_stretch(store, stretch_id)?;
    let action = NewAction::for_stretch(&stretch, kind, at);
    let id = store.append(&action)?;

    tracing::info!(
        id,
        stretch_id,
        action = kind.as_str(),
        date = %action.date,
        "Recorded action"
    );

    Ok(action.with_id(id))
}
