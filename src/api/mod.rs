//! HTTP API for the sheet conversions
//!
//! Run with `psv-server`.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_api_server, ApiConfig, AppState};
