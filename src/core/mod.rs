//! Sheet conversion core: header normalization and the two layout converters

pub mod calc_to_data;
pub mod data_to_calc;
pub mod header;
pub mod transforms;

pub use calc_to_data::{calc_to_data, ValveRecord};
pub use data_to_calc::{data_to_calc, form_records};
pub use header::{normalize, normalize_label, Property};
