//! Daily limit gate.
//!
//! A stretch may be offered at most until it is completed once, or until it
//! has been passed over twice without a completion, within one calendar day.
//! Only records dated `today` matter; earlier days never affect the gate.

use chrono::NaiveDate;

use crate::types::{Action, ActionKind};

/// Skips allowed on one day before a never-completed stretch is held back.
pub const MAX_ATTEMPTS_WITHOUT_COMPLETION: usize = 2;

/// Why the gate decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    /// No records today
    NotDoneToday,
    /// Some records today, still under the cap
    WithinLimits,
    /// Completed at least once today
    AlreadyCompletedToday,
    /// Skipped twice today without a completion
    AttemptedTwiceNotCompleted,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateReason::NotDoneToday => "not_done_today",
            GateReason::WithinLimits => "within_limits",
            GateReason::AlreadyCompletedToday => "already_completed_today",
            GateReason::AttemptedTwiceNotCompleted => "attempted_twice_not_completed",
        }
    }
}

/// Result of [`can_offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub allowed: bool,
    pub reason: GateReason,
}

/// Decide whether `stretch_id` may be offered on `today`.
///
/// `history` may contain records for any stretch and any date.
pub fn can_offer(stretch_id: i64, history: &[Action], today: NaiveDate) -> GateDecision {
    let (completed_today, total_today) = history
        .iter()
        .filter(|a| a.stretch_id == stretch_id && a.date == today)
        .fold((0usize, 0usize), |(completed, total), a| match a.action {
            ActionKind::Completed => (completed + 1, total + 1),
            ActionKind::Skipped => (completed, total + 1),
        });

    let (allowed, reason) = if completed_today >= 1 {
        (false, GateReason::AlreadyCompletedToday)
    } else if total_today >= MAX_ATTEMPTS_WITHOUT_COMPLETION {
        (false, GateReason::AttemptedTwiceNotCompleted)
    } else if total_today == 0 {
        (true, GateReason::NotDoneToday)
    } else {
        (true, GateReason::WithinLimits)
    };

    tracing::trace!(
        stretch_id,
        completed_today,
        total_today,
        reason = reason.as_str(),
        "Daily limit gate"
    );

    GateDecision { allowed, reason }
}
