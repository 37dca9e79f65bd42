//! Problem Analytics Backend
//!
//! Backend API for a problem/incident dashboard: query, filter and aggregate
//! problem records from an embedded document store.
//!
//! # Module structure
//!
//! ```text
//! problem-server/src/
//! ├── core/        # configuration, state, server
//! ├── api/         # HTTP routes and handlers
//! ├── filters.rs   # request-parameter → canonical filter normalization
//! ├── db/          # storage, filter-to-SQL translation, repository
//! ├── analytics/   # in-memory aggregation engine
//! └── utils/       # errors, response envelope, logging
//! ```

pub mod analytics;
pub mod api;
pub mod core;
pub mod db;
pub mod filters;
pub mod utils;

// Re-export common types
pub use core::{Config, Server, ServerState, build_app, build_router};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
