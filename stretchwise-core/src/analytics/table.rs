//! Per-stretch success table.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{Action, ActionKind, Category, Stretch};

/// One row of the detailed stats table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StretchStatsRow {
    pub stretch_id: i64,
    pub name: String,
    pub category: Category,
    pub completed: i64,
    pub skipped: i64,
    pub total: i64,
    /// `completed / total * 100`, rounded to one decimal; 0 when `total` is 0
    pub success_rate: f64,
    pub last_completed: Option<NaiveDate>,
}

impl StretchStatsRow {
    /// e.g. `"66.7%"`, or `"0%"` for a stretch with no history.
    pub fn success_rate_display(&self) -> String {
        if self.total == 0 {
            "0%".to_string()
        } else {
            format!("{:.1}%", self.success_rate)
        }
    }

    /// `YYYY-MM-DD`, or `"Never"`.
    pub fn last_completed_display(&self) -> String {
        self.last_completed
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Never".to_string())
    }
}

#[derive(Default)]
struct Tally {
    completed: i64,
    skipped: i64,
    last_completed: Option<NaiveDate>,
}

/// One row per catalog stretch, including stretches with no history,
/// sorted by completed count descending.
///
/// Equal counts keep catalog order.
pub fn detailed_stats_table(history: &[Action], catalog: &[Stretch]) -> Vec<StretchStatsRow> {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for action in history {
        let tally = tallies.entry(action.stretch_id).or_default();
        match action.action {
            ActionKind::Completed => {
                tally.completed += 1;
                tally.last_completed = tally.last_completed.max(Some(action.date));
            }
            ActionKind::Skipped => tally.skipped += 1,
        }
    }

    let mut rows: Vec<StretchStatsRow> = catalog
        .iter()
        .map(|stretch| {
            let tally = tallies.remove(&stretch.id).unwrap_or_default();
            let total = tally.completed + tally.skipped;
            let success_rate = if total == 0 {
                0.0
            } else {
                (tally.completed as f64 / total as f64 * 1000.0).round() / 10.0
            };
            StretchStatsRow {
                stretch_id: stretch.id,
                name: stretch.name.clone(),
                category: stretch.category,
                completed: tally.completed,
                skipped: tally.skipped,
                total,
                success_rate,
                last_completed: tally.last_completed,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.completed.cmp(&a.completed));
    rows
}
