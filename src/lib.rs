//! Library exports for the salescope prediction client.
/// Application directory helpers.
pub mod app_dirs;
/// Prediction service HTTP client.
pub mod client;
/// Persisted client settings.
pub mod config;
/// Static field classification tables.
pub mod fields;
/// Form state for the selected model.
pub mod form;
mod http_client;
/// Logging setup.
pub mod logging;
/// Request payload construction and validation.
pub mod payload;
/// Result summaries.
pub mod present;
/// Named example inputs per model.
pub mod presets;
/// Model kinds and catalog parsing.
pub mod schema;
/// Session state and orchestration.
pub mod session;
