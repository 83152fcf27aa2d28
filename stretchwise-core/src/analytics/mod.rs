//! Analytics module for stretchwise
//!
//! Pure functions over history snapshots:
//! - Daily aggregates (derived lazily from actions)
//! - Totals, averages, favorite stretch and goal progress
//! - Current and longest streaks
//! - Per-stretch success table

pub mod stats;
pub mod streaks;
pub mod table;

pub use stats::{
    average_daily_stretches, daily_aggregates, favorite_stretch, goal_progress,
    today_completed_count, total_active_days, total_stretches_completed, GoalProgress,
    StatsSummary,
};
pub use streaks::{current_streak, longest_streak, recent_days};
pub use table::{detailed_stats_table, StretchStatsRow};
