//! Totals, averages and favorites derived from action history.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::streaks::{current_streak, longest_streak};
use crate::types::{Action, DailyAggregate, Preferences};

/// Fold history into one aggregate per date, oldest first.
pub fn daily_aggregates(history: &[Action]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    for action in history {
        by_date
            .entry(action.date)
            .or_insert_with(|| DailyAggregate::new(action.date, 0, 0))
            .record(action.action);
    }
    by_date.into_values().collect()
}

/// Completions recorded on `today`.
pub fn today_completed_count(daily: &[DailyAggregate], today: NaiveDate) -> i64 {
    daily
        .iter()
        .filter(|row| row.date == today)
        .map(|row| row.completed_count)
        .sum()
}

/// All-time completions.
pub fn total_stretches_completed(history: &[Action]) -> i64 {
    history.iter().filter(|a| a.is_completed()).count() as i64
}

/// Days with at least one completion.
pub fn total_active_days(daily: &[DailyAggregate]) -> i64 {
    daily.iter().filter(|row| row.completed_count > 0).count() as i64
}

/// Mean completions per active day; days without completions are excluded.
pub fn average_daily_stretches(daily: &[DailyAggregate]) -> f64 {
    let active: Vec<i64> = daily
        .iter()
        .map(|row| row.completed_count)
        .filter(|count| *count > 0)
        .collect();
    if active.is_empty() {
        0.0
    } else {
        active.iter().sum::<i64>() as f64 / active.len() as f64
    }
}

/// Most-completed stretch name.
///
/// Ties go to the name whose first completion appears earliest in `history`.
pub fn favorite_stretch(history: &[Action]) -> Option<String> {
    let mut order: Vec<(&str, i64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for action in history.iter().filter(|a| a.is_completed()) {
        let name = action.stretch_name.as_str();
        match index.get(name) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(name, order.len());
                order.push((name, 1));
            }
        }
    }

    let mut best: Option<(&str, i64)> = None;
    for (name, count) in order {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}

/// Today's completions measured against the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub completed: i64,
    pub goal: f64,
    pub reached: bool,
}

impl GoalProgress {
    /// Progress as a percentage, capped at 100.
    pub fn percent(&self) -> f64 {
        if self.goal <= 0.0 {
            100.0
        } else {
            (self.completed as f64 / self.goal * 100.0).min(100.0)
        }
    }
}

pub fn goal_progress(daily: &[DailyAggregate], today: NaiveDate, prefs: &Preferences) -> GoalProgress {
    let completed = today_completed_count(daily, today);
    GoalProgress {
        completed,
        goal: prefs.daily_goal,
        reached: completed as f64 >= prefs.daily_goal,
    }
}

/// Everything the dashboard header shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub today_completed: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub total_completed: i64,
    pub active_days: i64,
    pub average_daily: f64,
    pub favorite: Option<String>,
}

impl StatsSummary {
    pub fn compute(history: &[Action], today: NaiveDate) -> Self {
        let daily = daily_aggregates(history);
        Self {
            today_completed: today_completed_count(&daily, today),
            current_streak: current_streak(&daily, today),
            longest_streak: longest_streak(&daily),
            total_completed: total_stretches_completed(history),
            active_days: total_active_days(&daily),
            average_daily: average_daily_stretches(&daily),
            favorite: favorite_stretch(history),
        }
    }
}
