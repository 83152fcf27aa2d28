//! # stretchwise-core
//!
//! Core library for stretchwise - a stretch habit tracker.
//!
//! This library provides:
//! - Domain types for stretches, actions and preferences
//! - The stretch selection engine (daily limit gate, weighting, weighted draw)
//! - Progress analytics (streaks, totals, per-stretch success table)
//! - Swappable storage backends (SQLite, JSON file)
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use stretchwise_core::engine::{local_today, select_next, SelectionResult};
//! use stretchwise_core::{open_store, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = open_store(&config).expect("failed to open store");
//!
//! let mut rng = rand::thread_rng();
//! match select_next(&*store, local_today(), &mut rng).expect("selection failed") {
//!     SelectionResult::Stretch(stretch) => println!("Next up: {}", stretch.name),
//!     SelectionResult::EmptyCatalog { message } | SelectionResult::LimitReached { message } => {
//!         println!("{}", message)
//!     }
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use store::{open_store, CatalogStore, HistoryStore, JsonStore, PreferenceStore, Store};
pub use types::*;

// Public modules
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod store;
pub mod types;
pub mod validation;
