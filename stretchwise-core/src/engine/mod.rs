//! Stretch selection engine
//!
//! Control flow for one request:
//! 1. [`selector::select_next`] loads enabled stretches, history and preferences
//! 2. [`gate::can_offer`] drops stretches that hit today's limit
//! 3. [`weights::compute_weights`] scores the survivors
//! 4. one weighted random draw picks the stretch
//!
//! Every function takes `today` explicitly. Callers that want the wall clock
//! use [`local_today`], which is the same date source [`crate::NewAction`]
//! uses for local timestamps.

pub mod gate;
pub mod selector;
pub mod weights;

pub use gate::{can_offer, GateDecision, GateReason};
pub use selector::{
    choose, record_action, select_next, weighted_index, SelectionResult, CELEBRATION_MESSAGES,
    EMPTY_CATALOG_MESSAGE,
};
pub use weights::{compute_weights, normalize, raw_weight, recency_score};

use chrono::{Local, NaiveDate};

/// Today's calendar date in the local time zone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
