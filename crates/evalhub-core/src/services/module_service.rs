//! Module service - CRUD orchestration for modules and test cases.

use std::sync::Arc;

use crate::domain::{
    Module, ModuleDetail, ModuleUpdate, NewModule, NewTestCase, TestCase,
};
use crate::ports::{CoreError, ModuleRepository};

/// Service for module operations.
///
/// A thin facade over the injected repository; validation that belongs
/// to the domain (rather than storage) lives here.
pub struct ModuleService {
    repo: Arc<dyn ModuleRepository>,
}

impl ModuleService {
    /// Create a new module service with the given repository.
    pub fn new(repo: Arc<dyn ModuleRepository>) -> Self {
        Self { repo }
    }

    /// List all modules with their grading methods.
    pub async fn list(&self) -> Result<Vec<Module>, CoreError> {
        self.repo.list().await.map_err(CoreError::from)
    }

    /// Get a module with its test cases and resolved default prompt.
    pub async fn get(&self, id: i64) -> Result<ModuleDetail, CoreError> {
        self.repo.get(id).await.map_err(CoreError::from)
    }

    /// Create a module with its grading-method set.
    pub async fn create(&self, module: NewModule) -> Result<Module, CoreError> {
        if module.name.trim().is_empty() {
            return Err(CoreError::Validation("module name is required".to_string()));
        }
        self.repo.create(&module).await.map_err(CoreError::from)
    }

    /// Update a module, replacing its grading-method set.
    pub async fn update(&self, id: i64, update: ModuleUpdate) -> Result<Module, CoreError> {
        if update.name.trim().is_empty() {
            return Err(CoreError::Validation("module name is required".to_string()));
        }
        self.repo.update(id, &update).await.map_err(CoreError::from)
    }

    /// Delete a module and its test cases.
    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        self.repo.delete(id).await.map_err(CoreError::from)
    }

    /// Add a test case to a module.
    pub async fn add_test_case(
        &self,
        module_id: i64,
        test_case: NewTestCase,
    ) -> Result<TestCase, CoreError> {
        self.repo
            .add_test_case(module_id, &test_case)
            .await
            .map_err(CoreError::from)
    }

    /// List a module's test cases.
    pub async fn list_test_cases(&self, module_id: i64) -> Result<Vec<TestCase>, CoreError> {
        self.repo
            .list_test_cases(module_id)
            .await
            .map_err(CoreError::from)
    }

    /// Remove a test case from a module.
    pub async fn remove_test_case(
        &self,
        module_id: i64,
        test_case_id: i64,
    ) -> Result<(), CoreError> {
        self.repo
            .remove_test_case(module_id, test_case_id)
            .await
            .map_err(CoreError::from)
    }
}
