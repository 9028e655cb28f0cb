//! Domain types, independent of any infrastructure concerns.

pub mod grading;
pub mod model;
pub mod module;
pub mod prompt;
pub mod result;
pub mod run;

pub use grading::GradingMethod;
pub use model::{ApiKeyRecord, ModelRegistration, NewModelRegistration};
pub use module::{
    Module, ModuleDetail, ModuleUpdate, NewModule, NewTestCase, ResolvedTestCase, TestCase,
};
pub use prompt::{NewSystemPrompt, SystemPrompt};
pub use result::{NewTestResult, ScoreDetail, TestResult};
pub use run::{
    ActiveRun, CompletedRunGroup, NewTestRun, RunOverview, RunStatus, TestRun,
};
