//! CLI command handlers

pub mod commands;

pub use commands::{calc2data, data2calc, headers};
