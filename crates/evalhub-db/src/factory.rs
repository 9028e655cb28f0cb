//! Composition utilities for building `AppCore` with `SQLite` backends.
//!
//! This module provides factory functions for wiring up the application
//! with `SQLite` repositories. It is focused purely on construction and
//! should not contain any domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use evalhub_core::Repos;
use evalhub_core::ports::EvaluationEngine;
use evalhub_core::services::{AppCore, KeyVault};

use crate::repositories::{
    SqliteModelRepository, SqliteModuleRepository, SqlitePromptRepository,
    SqliteResultRepository, SqliteRunRepository,
};

/// Factory for creating repository instances with `SQLite` backends.
pub struct CoreFactory;

impl CoreFactory {
    /// Build all `SQLite` repositories from a pool.
    ///
    /// This is the recommended way for adapters to obtain repositories.
    /// Returns a `Repos` struct from `evalhub-core` containing
    /// trait-object-wrapped repositories.
    pub fn build_repos(pool: SqlitePool) -> Repos {
        Repos::new(
            Arc::new(SqliteModuleRepository::new(pool.clone())),
            Arc::new(SqlitePromptRepository::new(pool.clone())),
            Arc::new(SqliteModelRepository::new(pool.clone())),
            Arc::new(SqliteRunRepository::new(pool.clone())),
            Arc::new(SqliteResultRepository::new(pool)),
        )
    }

    /// Build a complete `AppCore` instance from a pool, an engine, and
    /// a key vault.
    pub fn build_core(
        pool: SqlitePool,
        engine: Arc<dyn EvaluationEngine>,
        vault: Arc<KeyVault>,
    ) -> AppCore {
        AppCore::new(Self::build_repos(pool), engine, vault)
    }
}
