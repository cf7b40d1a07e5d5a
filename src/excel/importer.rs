//! Workbook reader: one worksheet of an .xlsx/.xlsm file → Grid

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use tracing::debug;

use crate::error::{PsvError, PsvResult};
use crate::types::{CellValue, Grid, MergeRegion};

/// Reads worksheets (values and merged regions) out of a workbook
pub struct SheetImporter {
    path: PathBuf,
}

impl SheetImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> PsvResult<Xlsx<BufReader<File>>> {
        open_workbook(&self.path).map_err(|e| {
            PsvError::Parse(format!(
                "Failed to open workbook {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Names of all worksheets, in workbook order
    pub fn sheet_names(&self) -> PsvResult<Vec<String>> {
        Ok(self.open()?.sheet_names())
    }

    /// Load one worksheet by name.
    ///
    /// Cell coordinates are absolute (A1 = 0,0) regardless of where the used
    /// range starts. Merged regions are applied after the values, so only
    /// anchor cells of a merge carry content.
    pub fn load_grid(&self, sheet: &str) -> PsvResult<Grid> {
        let mut workbook = self.open()?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(PsvError::Parse(format!(
                "Worksheet '{}' not found in {}",
                sheet,
                self.path.display()
            )));
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| PsvError::Parse(format!("Failed to read worksheet '{}': {}", sheet, e)))?;

        let mut grid = Grid::new();
        if let Some((start_row, start_col)) = range.start() {
            for (row, col, data) in range.used_cells() {
                let value = cell_value(data);
                if value.is_blank() {
                    continue;
                }
                grid.set(start_row + row as u32, start_col + col as u32, value)?;
            }
        }

        workbook
            .load_merged_regions()
            .map_err(|e| PsvError::Parse(format!("Failed to read merged cells: {}", e)))?;
        for (_, _, dimensions) in workbook.merged_regions_by_sheet(sheet) {
            let (first_row, first_col) = dimensions.start;
            let (last_row, last_col) = dimensions.end;
            let region = MergeRegion::new(first_row, first_col, last_row, last_col);
            if region.is_single_cell() {
                continue;
            }
            grid.merge(region)?;
        }

        debug!(
            path = %self.path.display(),
            sheet,
            cells = grid.cells().count(),
            merges = grid.merges().len(),
            "worksheet loaded"
        );
        Ok(grid)
    }
}

/// Spreadsheet value → CellValue; dates keep their serial number
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
