use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::error::{PsvError, PsvResult};

//==============================================================================
// Cell Values
//==============================================================================

/// A single worksheet value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Empty cells and whitespace-only text count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed after trimming
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Empty | CellValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

static EMPTY: CellValue = CellValue::Empty;

//==============================================================================
// Record Layout
//==============================================================================

/// Which line of a two-row record block a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairLine {
    First,
    Second,
}

impl PairLine {
    pub fn offset(self) -> u32 {
        match self {
            PairLine::First => 0,
            PairLine::Second => 1,
        }
    }

    /// Line of an absolute row inside blocks that start at `block_start`
    pub fn of_row(row: u32, block_start: u32) -> Self {
        if row.saturating_sub(block_start) % 2 == 0 {
            PairLine::First
        } else {
            PairLine::Second
        }
    }
}

/// Convert column index to Excel column letter (0→A, 1→B, 25→Z, 26→AA, etc.)
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut num = col;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// Excel-style reference of a 0-based coordinate (e.g. (8, 1) → "B9")
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

//==============================================================================
// Merged Regions
//==============================================================================

/// Inclusive rectangle of merged cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeRegion {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergeRegion {
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        row == self.first_row && col == self.first_col
    }

    pub fn overlaps(&self, other: &MergeRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

impl fmt::Display for MergeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_ref(self.first_row, self.first_col),
            cell_ref(self.last_row, self.last_col)
        )
    }
}

//==============================================================================
// Cell Grid
//==============================================================================

/// Sparse, 0-indexed contents of one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: BTreeMap<(u32, u32), CellValue>,
    merges: Vec<MergeRegion>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at (row, col); anything never written reads as `Empty`
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Write a value. Fails when the cell is hidden under a merged region.
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> PsvResult<()> {
        if self
            .merges
            .iter()
            .any(|m| m.contains(row, col) && !m.is_anchor(row, col))
        {
            return Err(PsvError::MergedCell(cell_ref(row, col)));
        }

        match value.into() {
            CellValue::Empty => {
                self.cells.remove(&(row, col));
            }
            value => {
                self.cells.insert((row, col), value);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self, row: u32, col: u32) -> PsvResult<()> {
        self.set(row, col, CellValue::Empty)
    }

    /// Number of rows up to the last populated one
    pub fn height(&self) -> u32 {
        self.cells.keys().map(|(r, _)| r + 1).max().unwrap_or(0)
    }

    /// Number of columns up to the last populated one
    pub fn width(&self) -> u32 {
        self.cells.keys().map(|(_, c)| c + 1).max().unwrap_or(0)
    }

    /// Number of columns covered by populated cells or merged regions
    pub fn column_extent(&self) -> u32 {
        self.merges
            .iter()
            .map(|m| m.last_col + 1)
            .fold(self.width(), u32::max)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Populated cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    pub fn merges(&self) -> &[MergeRegion] {
        &self.merges
    }

    /// Merge a region. Values under the region other than its anchor are dropped.
    pub fn merge(&mut self, region: MergeRegion) -> PsvResult<()> {
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&region)) {
            return Err(PsvError::Parse(format!(
                "merged region {} overlaps {}",
                region, existing
            )));
        }

        self.cells.retain(|&(r, c), _| {
            !region.contains(r, c) || region.is_anchor(r, c)
        });
        self.merges.push(region);
        Ok(())
    }

    pub fn unmerge(&mut self, region: &MergeRegion) -> bool {
        let before = self.merges.len();
        self.merges.retain(|m| m != region);
        self.merges.len() != before
    }

    /// Unmerge every region for the lifetime of the returned guard.
    ///
    /// The guard re-merges exactly the recorded regions when it is dropped,
    /// whether the caller finished normally or bailed out with an error.
    pub fn unmerge_all(&mut self) -> MergeGuard<'_> {
        let regions = std::mem::take(&mut self.merges);
        MergeGuard {
            grid: self,
            regions,
        }
    }
}

/// Scope in which a grid has no merged regions; see [`Grid::unmerge_all`]
pub struct MergeGuard<'a> {
    grid: &'a mut Grid,
    regions: Vec<MergeRegion>,
}

impl MergeGuard<'_> {
    /// Regions that will be restored on drop
    pub fn regions(&self) -> &[MergeRegion] {
        &self.regions
    }
}

impl Deref for MergeGuard<'_> {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        self.grid
    }
}

impl DerefMut for MergeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Grid {
        self.grid
    }
}

impl Drop for MergeGuard<'_> {
    fn drop(&mut self) {
        // Merges added inside the scope would collide with the restored set
        self.grid.merges.clear();
        for region in std::mem::take(&mut self.regions) {
            if let Err(e) = self.grid.merge(region) {
                warn!(region = %region, error = %e, "failed to restore merged region");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_cell_value_blank_and_numeric() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::Int(0).is_blank());

        assert_eq!(CellValue::text(" 50.8 ").as_f64(), Some(50.8));
        assert_eq!(CellValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::text("F.V.").as_f64(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Float(50.8).to_string(), "50.8");
        assert_eq!(CellValue::Float(101.0).to_string(), "101");
        assert_eq!(CellValue::Int(3).to_string(), "3");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_pair_line_of_row() {
        assert_eq!(PairLine::of_row(8, 8), PairLine::First);
        assert_eq!(PairLine::of_row(9, 8), PairLine::Second);
        assert_eq!(PairLine::of_row(12, 8), PairLine::First);
    }

    #[test]
    fn test_grid_sparse_reads() {
        let mut grid = Grid::new();
        assert_eq!(grid.get(100, 100), &CellValue::Empty);
        assert_eq!(grid.height(), 0);

        grid.set(2, 4, "x").unwrap();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 5);

        grid.clear(2, 4).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_column_extent_counts_merges() {
        let mut grid = Grid::new();
        grid.set(1, 1, "Tag No.").unwrap();
        assert_eq!(grid.column_extent(), 2);

        grid.merge(MergeRegion::new(1, 1, 1, 2)).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.column_extent(), 3);
    }

    #[test]
    fn test_merge_blocks_hidden_cells() {
        let mut grid = Grid::new();
        grid.set(0, 1, "hidden").unwrap();
        grid.merge(MergeRegion::new(0, 0, 1, 2)).unwrap();

        // Non-anchor content is dropped on merge
        assert_eq!(grid.get(0, 1), &CellValue::Empty);
        assert!(grid.set(0, 0, "anchor").is_ok());
        assert!(matches!(grid.set(1, 1, "x"), Err(PsvError::MergedCell(r)) if r == "B2"));
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let mut grid = Grid::new();
        grid.merge(MergeRegion::new(0, 0, 1, 1)).unwrap();
        assert!(grid.merge(MergeRegion::new(1, 1, 2, 2)).is_err());
        assert!(grid.merge(MergeRegion::new(2, 0, 2, 3)).is_ok());
    }

    #[test]
    fn test_unmerge_single_region() {
        let mut grid = Grid::new();
        let region = MergeRegion::new(0, 0, 1, 1);
        grid.merge(region).unwrap();

        assert!(grid.unmerge(&region));
        assert!(!grid.unmerge(&region));
        assert!(grid.set(1, 1, "free").is_ok());
    }

    #[test]
    fn test_merge_guard_restores_regions() {
        let mut grid = Grid::new();
        let a = MergeRegion::new(0, 0, 0, 3);
        let b = MergeRegion::new(8, 1, 9, 1);
        grid.merge(a).unwrap();
        grid.merge(b).unwrap();

        {
            let mut scope = grid.unmerge_all();
            assert!(scope.merges().is_empty());
            assert_eq!(scope.regions().len(), 2);
            scope.set(9, 1, "written while unmerged").unwrap();
        }

        assert_eq!(grid.merges(), &[a, b]);
        assert_eq!(grid.get(9, 1), &CellValue::Empty);
    }

    #[test]
    fn test_merge_guard_restores_after_error() {
        fn failing(grid: &mut Grid) -> PsvResult<()> {
            let mut scope = grid.unmerge_all();
            scope.set(0, 0, 1.0)?;
            Err(PsvError::Persist("boom".to_string()))
        }

        let mut grid = Grid::new();
        let region = MergeRegion::new(0, 0, 2, 2);
        grid.merge(region).unwrap();

        assert!(failing(&mut grid).is_err());
        assert_eq!(grid.merges(), &[region]);
    }

    #[test]
    fn test_merge_region_display() {
        assert_eq!(MergeRegion::new(8, 0, 9, 2).to_string(), "A9:C10");
        assert!(MergeRegion::new(3, 3, 3, 3).is_single_cell());
    }
}
