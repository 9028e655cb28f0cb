//! `SQLite` persistence adapter for evalhub.
//!
//! Implements the repository ports from `evalhub-core` over `sqlx`,
//! provides schema setup, and offers composition helpers for adapters.

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

// Re-export factory for convenient access
pub use factory::CoreFactory;

// Re-export repository implementations
pub use repositories::{
    SqliteModelRepository, SqliteModuleRepository, SqlitePromptRepository,
    SqliteResultRepository, SqliteRunRepository,
};

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
