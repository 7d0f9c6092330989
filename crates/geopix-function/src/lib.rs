//! Geopix Function
//!
//! HTTP entry point for the photo upload pipeline: receives storage notifications, runs
//! [`geopix_processing::process_upload`] once per notification, and reports the outcome.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
