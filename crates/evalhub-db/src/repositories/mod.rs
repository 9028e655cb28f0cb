//! `SQLite` repository implementations.

pub mod row_mappers;
pub mod sqlite_model_repository;
pub mod sqlite_module_repository;
pub mod sqlite_prompt_repository;
pub mod sqlite_result_repository;
pub mod sqlite_run_repository;

pub use sqlite_model_repository::SqliteModelRepository;
pub use sqlite_module_repository::SqliteModuleRepository;
pub use sqlite_prompt_repository::SqlitePromptRepository;
pub use sqlite_result_repository::SqliteResultRepository;
pub use sqlite_run_repository::SqliteRunRepository;
