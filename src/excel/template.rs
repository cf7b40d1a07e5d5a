//! In-place editing of a template workbook
//!
//! The template is loaded whole, with every worksheet, style, column layout
//! and macro project, and only the cells of one worksheet that differ between
//! two grids are rewritten before it is serialized again.

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::debug;
use umya_spreadsheet::{reader::xlsx, writer, Spreadsheet, Worksheet};

use crate::error::{PsvError, PsvResult};
use crate::types::{CellValue, Grid};

/// A template workbook opened for editing
pub struct TemplateWorkbook {
    path: PathBuf,
    book: Spreadsheet,
}

impl TemplateWorkbook {
    pub fn open<P: AsRef<Path>>(path: P) -> PsvResult<Self> {
        let path = path.as_ref().to_path_buf();
        let book = xlsx::read(&path).map_err(|e| {
            PsvError::TemplateLoad(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all worksheets, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    /// Rewrite `sheet` so that it holds `after` where it held `before`.
    ///
    /// Cells equal in both grids are not touched and keep their style and
    /// formula. The merged regions of the worksheet are lifted for the writes
    /// and replaced by those of `after`. Returns the number of cells written.
    pub fn apply(&mut self, sheet: &str, before: &Grid, after: &Grid) -> PsvResult<usize> {
        let worksheet = self.book.get_sheet_by_name_mut(sheet).ok_or_else(|| {
            PsvError::TemplateLoad(format!(
                "Worksheet '{}' not found in {}",
                sheet,
                self.path.display()
            ))
        })?;

        worksheet.get_merge_cells_mut().clear();

        let changed = changed_cells(before, after);
        for &(row, col) in &changed {
            write_cell(worksheet, row, col, after.get(row, col));
        }

        for region in after.merges() {
            worksheet.add_merge_cells(region.to_string());
        }

        debug!(
            sheet,
            cells = changed.len(),
            merges = after.merges().len(),
            "template worksheet updated"
        );
        Ok(changed.len())
    }

    /// Serialize the whole workbook into memory
    pub fn to_buffer(&self) -> PsvResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        writer::xlsx::write_writer(&self.book, &mut buffer)
            .map_err(|e| PsvError::Persist(format!("Failed to serialize workbook: {}", e)))?;
        Ok(buffer.into_inner())
    }
}

/// Coordinates whose value differs between the two grids
fn changed_cells(before: &Grid, after: &Grid) -> BTreeSet<(u32, u32)> {
    before
        .cells()
        .chain(after.cells())
        .map(|(row, col, _)| (row, col))
        .filter(|&(row, col)| before.get(row, col) != after.get(row, col))
        .collect()
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u32, value: &CellValue) {
    // umya addresses cells as 1-based (col, row)
    let cell = worksheet.get_cell_mut((col + 1, row + 1));
    match value {
        CellValue::Empty => {
            cell.set_blank();
        }
        CellValue::Int(i) => {
            cell.set_value_number(*i as f64);
        }
        CellValue::Float(f) => {
            cell.set_value_number(*f);
        }
        CellValue::Text(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Bool(b) => {
            cell.set_value_bool(*b);
        }
    }
}
