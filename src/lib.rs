//! PSV Sheets - Pressure Safety Valve spreadsheet conversion
//!
//! Converts between the two spreadsheet layouts used for PSV sizing:
//!
//! - **Calculation Sheet**: one valve per column, property labels in column B
//! - **Data Sheet**: a form with one valve per two-row block
//!
//! Property labels are normalized through a fixed alias table, so the
//! Calculation Sheet may use any of the known spellings.
//!
//! # Example
//!
//! ```no_run
//! use psv_sheets::config::ConverterConfig;
//! use psv_sheets::pipeline::run_calc_to_data;
//! use std::path::Path;
//!
//! let config = ConverterConfig::default();
//! let output = run_calc_to_data(Path::new("Calculation Sheet.xlsm"), "Calculation Sheet.xlsm", &config)?;
//!
//! println!("{} valves → {}", output.records, output.file_name);
//! std::fs::write(&output.file_name, &output.bytes)?;
//! # Ok::<(), psv_sheets::error::PsvError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use config::ConverterConfig;
pub use error::{PsvError, PsvResult};
pub use types::{CellValue, Grid, MergeRegion, PairLine};
