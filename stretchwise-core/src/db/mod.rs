//! Database layer for stretchwise
//!
//! This module provides the SQLite storage backend with:
//! - Schema migrations
//! - Catalog, history and preference stores on one connection

pub mod repo;
pub mod schema;

pub use repo::Database;
