//! Axum web adapter for evalhub.
//!
//! Exposes the admin API: module/test-case/prompt CRUD, the model
//! registry with encrypted API keys, run creation and cancellation, the
//! polling status surface, and the results views.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use routes::{create_router, create_spa_router};
