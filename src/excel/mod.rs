//! Workbook codec
//!
//! - Import: one worksheet of an .xlsx/.xlsm file → `Grid` (values and merges)
//! - Template: edits one worksheet of a template in place, keeping everything else
//! - Export: `Grid` → single-sheet workbook

mod exporter;
mod importer;
mod template;

pub use exporter::GridExporter;
pub use importer::SheetImporter;
pub use template::TemplateWorkbook;
