//! Module repository trait definition.
//!
//! This port covers modules, their grading-method assignments, and their
//! test cases. Grading-method writes are set-replacement and must be
//! transactional with the owning module write.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{
    Module, ModuleDetail, ModuleUpdate, NewModule, NewTestCase, ResolvedTestCase, TestCase,
};

/// Repository for module persistence operations.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// List all modules with their grading methods.
    async fn list(&self) -> Result<Vec<Module>, RepositoryError>;

    /// Get a module with its resolved default prompt and test cases.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if the module doesn't exist.
    async fn get(&self, id: i64) -> Result<ModuleDetail, RepositoryError>;

    /// Insert a new module and its grading-method set atomically.
    ///
    /// Returns the persisted module with its assigned ID.
    async fn create(&self, module: &NewModule) -> Result<Module, RepositoryError>;

    /// Update a module, replacing its grading-method set atomically.
    async fn update(&self, id: i64, update: &ModuleUpdate) -> Result<Module, RepositoryError>;

    /// Delete a module and its owned test cases.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if the module doesn't exist.
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    /// Insert a test case under a module.
    async fn add_test_case(
        &self,
        module_id: i64,
        test_case: &NewTestCase,
    ) -> Result<TestCase, RepositoryError>;

    /// List the test cases of a module.
    async fn list_test_cases(&self, module_id: i64) -> Result<Vec<TestCase>, RepositoryError>;

    /// Remove a test case from a module.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if no such (module, case)
    /// pair exists.
    async fn remove_test_case(
        &self,
        module_id: i64,
        test_case_id: i64,
    ) -> Result<(), RepositoryError>;

    /// Load test cases with their own prompt overrides resolved, for
    /// run dispatch.
    ///
    /// With `ids = Some(..)` only cases that belong to the module AND
    /// appear in the list are returned; ids outside the module are
    /// silently absent from the result so callers can enforce the
    /// subset precondition.
    async fn resolved_test_cases(
        &self,
        module_id: i64,
        ids: Option<&[i64]>,
    ) -> Result<Vec<ResolvedTestCase>, RepositoryError>;
}
