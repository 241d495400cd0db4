/// Social API service
///
/// CRUD and social-graph operations (posts, likes, comments, follows,
/// scheduled publishing) over HTTP. Auth token issuance, file storage and
/// deferred-job execution are external collaborators.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and response shapes
/// - `services`: Business logic over PostgreSQL
/// - `models`: Entity structures
/// - `visibility`: Follow-graph visibility rules
/// - `jobs`: Deferred-job collaborator interface
/// - `middleware`: JWT authentication and requester extraction
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod visibility;

pub use config::Config;
pub use error::{AppError, Result};
