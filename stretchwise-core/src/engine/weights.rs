//! Weighting engine.
//!
//! Each stretch gets `base * (1 + recency)`:
//!
//! | Input | Contribution |
//! |-------|--------------|
//! | priority high / low | `base` = `high_priority_weight` / `low_priority_weight` |
//! | no history | `recency` = `never_done_bonus` |
//! | last completed N days ago | `recency` = `min(N * recency_weight, 10)` |
//! | history but never completed | `recency` = `never_done_bonus * 0.5` |
//!
//! Weights are then normalized into a probability distribution.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{Action, Preferences, Priority, Stretch};

/// Upper bound on the recency contribution for very stale stretches.
pub const RECENCY_CAP: f64 = 10.0;

/// Share of `never_done_bonus` given to stretches that were only ever skipped.
pub const SKIPPED_ONLY_FACTOR: f64 = 0.5;

fn base_weight(priority: Priority, prefs: &Preferences) -> f64 {
    match priority {
        Priority::High => prefs.high_priority_weight,
        Priority::Low => prefs.low_priority_weight,
    }
}

/// Recency boost from one stretch's full history.
pub fn recency_score(history: &[&Action], prefs: &Preferences, today: NaiveDate) -> f64 {
    if history.is_empty() {
        return prefs.never_done_bonus;
    }

    let last_completed = history
        .iter()
        .filter(|a| a.is_completed())
        .map(|a| a.date)
        .max();

    match last_completed {
        Some(date) => {
            let days_since = (today - date).num_days().max(0) as f64;
            (days_since * prefs.recency_weight).min(RECENCY_CAP)
        }
        None => prefs.never_done_bonus * SKIPPED_ONLY_FACTOR,
    }
}

/// Unnormalized weight for one stretch.
pub fn raw_weight(
    stretch: &Stretch,
    history: &[&Action],
    prefs: &Preferences,
    today: NaiveDate,
) -> f64 {
    base_weight(stretch.priority, prefs) * (1.0 + recency_score(history, prefs, today))
}

/// Probability for each stretch, aligned by index with `stretches`.
///
/// `history` may include any stretch; each stretch only sees its own records.
pub fn compute_weights(
    stretches: &[Stretch],
    history: &[Action],
    prefs: &Preferences,
    today: NaiveDate,
) -> Vec<f64> {
    let mut by_stretch: HashMap<i64, Vec<&Action>> = HashMap::new();
    for action in history {
        by_stretch.entry(action.stretch_id).or_default().push(action);
    }

    let raw: Vec<f64> = stretches
        .iter()
        .map(|s| {
            let own = by_stretch.get(&s.id).map(Vec::as_slice).unwrap_or(&[]);
            raw_weight(s, own, prefs, today)
        })
        .collect();

    normalize(raw)
}

/// Scale weights to sum to 1, or fall back to uniform if that is impossible.
pub fn normalize(mut weights: Vec<f64>) -> Vec<f64> {
    if weights.is_empty() {
        return weights;
    }

    let total: f64 = weights.iter().sum();
    if total.is_finite() && total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
        return weights;
    }

    tracing::warn!(
        total,
        count = weights.len(),
        "Degenerate weight sum, using uniform distribution"
    );
    let uniform = 1.0 / weights.len() as f64;
    vec![uniform; weights.len()]
}
