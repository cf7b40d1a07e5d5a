//! End-to-end conversions: workbook on disk → converted workbook bytes
//!
//! Shared by the CLI and the HTTP handlers. Source problems surface as
//! `Parse`/`NoRecordsFound`, template problems as `TemplateLoad`.

use std::path::Path;

use tracing::{debug, info};

use crate::config::ConverterConfig;
use crate::core::{calc_to_data, data_to_calc, form_records};
use crate::error::{PsvError, PsvResult};
use crate::excel::{GridExporter, SheetImporter, TemplateWorkbook};
use crate::types::Grid;

pub const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A converted workbook, ready to be written or streamed
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    /// Download name derived from the uploaded file
    pub file_name: String,
    /// Valve records carried over
    pub records: usize,
}

impl ConversionOutput {
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.file_name)
    }
}

fn stem(original_name: &str) -> String {
    Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string())
}

/// `Data_Sheet_filled_<stem>.xlsm`
pub fn data_sheet_file_name(original_name: &str) -> String {
    format!("Data_Sheet_filled_{}.xlsm", stem(original_name))
}

/// `Calculation_Sheet_filled_<stem>.xlsx`
pub fn calc_sheet_file_name(original_name: &str) -> String {
    format!("Calculation_Sheet_filled_{}.xlsx", stem(original_name))
}

pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".xlsm") {
        XLSM_CONTENT_TYPE
    } else {
        XLSX_CONTENT_TYPE
    }
}

fn load_template(path: &Path, sheet: &str) -> PsvResult<Grid> {
    if !path.exists() {
        return Err(PsvError::TemplateLoad(format!(
            "template not found at '{}'",
            path.display()
        )));
    }
    SheetImporter::new(path)
        .load_grid(sheet)
        .map_err(|e| PsvError::TemplateLoad(format!("{} ({})", path.display(), e)))
}

/// Calculation Sheet workbook → filled Data Sheet.
///
/// The template is edited in place: its other worksheets, styles, column
/// layout and macro project come through unchanged.
pub fn run_calc_to_data(
    input: &Path,
    original_name: &str,
    config: &ConverterConfig,
) -> PsvResult<ConversionOutput> {
    let source = SheetImporter::new(input).load_grid(&config.calc_sheet)?;

    let template = load_template(&config.data_template, &config.data_sheet)?;
    let mut workbook = TemplateWorkbook::open(&config.data_template)?;

    let mut destination = template.clone();
    let records = calc_to_data(&source, &mut destination)?;

    let written = workbook.apply(&config.data_sheet, &template, &destination)?;
    debug!(template = %workbook.path().display(), cells = written, "form written into template");
    let bytes = workbook.to_buffer()?;

    let file_name = data_sheet_file_name(original_name);
    info!(file = %file_name, records, "calculation sheet converted");
    Ok(ConversionOutput {
        bytes,
        file_name,
        records,
    })
}

/// Data Sheet workbook → Calculation Sheet with one column per valve
pub fn run_data_to_calc(
    input: &Path,
    original_name: &str,
    config: &ConverterConfig,
) -> PsvResult<ConversionOutput> {
    let source = SheetImporter::new(input).load_grid(&config.data_sheet)?;
    let template = load_template(&config.calc_template, &config.calc_sheet)?;

    let result = data_to_calc(&source, &template)?;
    let records = form_records(&source).filter(|r| r.is_valid()).count();

    let bytes = GridExporter::new(&result, config.calc_sheet.as_str()).to_buffer()?;

    let file_name = calc_sheet_file_name(original_name);
    info!(file = %file_name, records, "data sheet converted");
    Ok(ConversionOutput {
        bytes,
        file_name,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_derived_file_names() {
        assert_eq!(
            data_sheet_file_name("Calculation Sheet.xlsm"),
            "Data_Sheet_filled_Calculation Sheet.xlsm"
        );
        assert_eq!(
            calc_sheet_file_name("unit-200/Data Sheet.xlsm"),
            "Calculation_Sheet_filled_Data Sheet.xlsx"
        );
        assert_eq!(data_sheet_file_name(""), "Data_Sheet_filled_upload.xlsm");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.xlsm"), XLSM_CONTENT_TYPE);
        assert_eq!(content_type_for("a.XLSM"), XLSM_CONTENT_TYPE);
        assert_eq!(content_type_for("a.xlsx"), XLSX_CONTENT_TYPE);
    }

    #[test]
    fn test_missing_template() {
        let result = load_template(&PathBuf::from("no/such/template.xlsm"), "FORM");
        assert!(matches!(result, Err(PsvError::TemplateLoad(_))));
    }
}
