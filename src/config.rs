//! Template locations and sheet names

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PsvResult;

pub const DEFAULT_DATA_TEMPLATE: &str = "Data Sheet.xlsm";
pub const DEFAULT_DATA_SHEET: &str = "FORM";
pub const DEFAULT_CALC_TEMPLATE: &str = "Calculation Sheet.xlsm";
pub const DEFAULT_CALC_SHEET: &str = "PSV";

/// Where the two fixed templates live and which sheet of each is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Data Sheet template (macro-enabled workbook)
    pub data_template: PathBuf,
    pub data_sheet: String,
    /// Calculation Sheet template
    pub calc_template: PathBuf,
    pub calc_sheet: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            data_template: PathBuf::from(DEFAULT_DATA_TEMPLATE),
            data_sheet: DEFAULT_DATA_SHEET.to_string(),
            calc_template: PathBuf::from(DEFAULT_CALC_TEMPLATE),
            calc_sheet: DEFAULT_CALC_SHEET.to_string(),
        }
    }
}

impl ConverterConfig {
    /// Load from a YAML file; keys left out keep their defaults
    pub fn from_yaml_file(path: &Path) -> PsvResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> PsvResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults, overlaid with an optional config file
    pub fn load(path: Option<&Path>) -> PsvResult<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }
}
