//! Workbook writer: Grid → single-sheet .xlsx

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::error::{PsvError, PsvResult};
use crate::types::{CellValue, Grid};

/// Writes a grid as the only worksheet of a new workbook
pub struct GridExporter<'a> {
    grid: &'a Grid,
    sheet_name: String,
}

impl<'a> GridExporter<'a> {
    pub fn new(grid: &'a Grid, sheet_name: impl Into<String>) -> Self {
        Self {
            grid,
            sheet_name: sheet_name.into(),
        }
    }

    /// Save the workbook to a file
    pub fn save(&self, output_path: &Path) -> PsvResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| PsvError::Persist(format!("Failed to save Excel file: {}", e)))?;
        debug!(path = %output_path.display(), "workbook saved");
        Ok(())
    }

    /// Serialize the workbook into memory
    pub fn to_buffer(&self) -> PsvResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| PsvError::Persist(format!("Failed to serialize workbook: {}", e)))
    }

    fn build(&self) -> PsvResult<Workbook> {
        let mut workbook = Workbook::new();

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.sheet_name)
            .map_err(|e| PsvError::Persist(format!("Failed to set worksheet name: {}", e)))?;
        self.write_sheet(worksheet)?;

        Ok(workbook)
    }

    fn write_sheet(&self, worksheet: &mut Worksheet) -> PsvResult<()> {
        // Merges first; the anchor value written below replaces the placeholder
        let format = Format::new();
        for region in self.grid.merges() {
            if region.is_single_cell() {
                warn!(region = %region, "skipping single-cell merge");
                continue;
            }
            worksheet
                .merge_range(
                    region.first_row,
                    excel_col(region.first_col)?,
                    region.last_row,
                    excel_col(region.last_col)?,
                    "",
                    &format,
                )
                .map_err(|e| PsvError::Persist(format!("Failed to merge {}: {}", region, e)))?;
        }

        for (row, col, value) in self.grid.cells() {
            let col = excel_col(col)?;
            let result = match value {
                CellValue::Empty => continue,
                CellValue::Int(i) => worksheet.write_number(row, col, *i as f64),
                CellValue::Float(f) => worksheet.write_number(row, col, *f),
                CellValue::Text(s) => worksheet.write_string(row, col, s),
                CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
            };
            result.map_err(|e| PsvError::Persist(format!("Failed to write cell: {}", e)))?;
        }
        Ok(())
    }
}

fn excel_col(col: u32) -> PsvResult<u16> {
    u16::try_from(col).map_err(|_| PsvError::Persist(format!("Column {} out of range", col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergeRegion;

    #[test]
    fn test_to_buffer_is_zip() {
        let mut grid = Grid::new();
        grid.set(0, 0, "Tag No.").unwrap();
        grid.set(1, 3, 101.5).unwrap();
        grid.merge(MergeRegion::new(0, 0, 0, 2)).unwrap();

        let bytes = GridExporter::new(&grid, "PSV").to_buffer().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_column_out_of_range() {
        assert!(excel_col(70_000).is_err());
        assert_eq!(excel_col(3).unwrap(), 3);
    }
}
