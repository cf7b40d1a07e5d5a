//! Data Sheet → Calculation Sheet
//!
//! Every two rows of the Data Sheet form make one record. Each record with a
//! tag number becomes a new column appended to the Calculation Sheet template.

use tracing::{debug, info};

use super::transforms::{
    back_pressure_left, back_pressure_sum, psv_ratio, rupture_disk, state_code,
};
use crate::error::PsvResult;
use crate::types::{CellValue, Grid, PairLine};

/// Column of the form holding the tag number (first line)
pub const TAG_COL: u32 = 0;

/// A two-row block of the Data Sheet form
#[derive(Debug, Clone, Copy)]
pub struct FormRecord<'a> {
    grid: &'a Grid,
    row: u32,
}

impl<'a> FormRecord<'a> {
    pub fn new(grid: &'a Grid, row: u32) -> Self {
        Self { grid, row }
    }

    /// Cell of the block; reads past the populated area are blank
    pub fn cell(&self, line: PairLine, col: u32) -> &'a CellValue {
        self.grid.get(self.row + line.offset(), col)
    }

    pub fn first(&self, col: u32) -> &'a CellValue {
        self.cell(PairLine::First, col)
    }

    pub fn second(&self, col: u32) -> &'a CellValue {
        self.cell(PairLine::Second, col)
    }

    pub fn tag(&self) -> &'a CellValue {
        self.first(TAG_COL)
    }

    pub fn is_valid(&self) -> bool {
        !self.tag().is_blank()
    }

    /// Phase code derived from the state word in the first line
    pub fn state(&self) -> Option<&'static str> {
        state_code(self.first(9))
    }
}

/// Where a Calculation Sheet row gets its value
#[derive(Clone, Copy)]
pub enum RowSource {
    Cell { line: PairLine, col: u32 },
    Derived(fn(&FormRecord) -> CellValue),
}

/// One destination row of the appended column
#[derive(Clone, Copy)]
pub struct TargetRowRule {
    pub row: u32,
    pub source: RowSource,
}

impl TargetRowRule {
    pub fn resolve(&self, record: &FormRecord) -> CellValue {
        match self.source {
            RowSource::Cell { line, col } => record.cell(line, col).clone(),
            RowSource::Derived(derive) => derive(record),
        }
    }
}

const fn cell(row: u32, line: PairLine, col: u32) -> TargetRowRule {
    TargetRowRule {
        row,
        source: RowSource::Cell { line, col },
    }
}

const fn derived(row: u32, derive: fn(&FormRecord) -> CellValue) -> TargetRowRule {
    TargetRowRule {
        row,
        source: RowSource::Derived(derive),
    }
}

fn when_gas_or_steam(record: &FormRecord, value: &CellValue) -> CellValue {
    match record.state() {
        Some("V" | "S") => value.clone(),
        _ => CellValue::Empty,
    }
}

fn installed_count(_: &FormRecord) -> CellValue {
    CellValue::Int(1)
}

fn ratio(record: &FormRecord) -> CellValue {
    psv_ratio(record.second(16))
}

fn material(_: &FormRecord) -> CellValue {
    CellValue::text("CS")
}

fn rupture(record: &FormRecord) -> CellValue {
    rupture_disk(record.first(26))
}

fn relief_condition(_: &FormRecord) -> CellValue {
    CellValue::text("R")
}

fn state(record: &FormRecord) -> CellValue {
    record.state().map(CellValue::text).unwrap_or_default()
}

/// Liquid density is kept in g/cm³ on the form; the calc sheet wants kg/m³
fn liquid_density(record: &FormRecord) -> CellValue {
    match (record.state(), record.second(22).as_f64()) {
        (Some("L"), Some(density)) => CellValue::Float(density * 1000.0),
        _ => CellValue::Empty,
    }
}

fn molecular_weight(record: &FormRecord) -> CellValue {
    when_gas_or_steam(record, record.first(22))
}

fn compressibility(record: &FormRecord) -> CellValue {
    when_gas_or_steam(record, record.first(23))
}

fn heat_capacity_ratio(record: &FormRecord) -> CellValue {
    when_gas_or_steam(record, record.second(23))
}

fn max_back_pressure(record: &FormRecord) -> CellValue {
    back_pressure_sum(record.first(14))
}

fn min_back_pressure(record: &FormRecord) -> CellValue {
    back_pressure_left(record.first(14))
}

use PairLine::{First, Second};

/// Calculation Sheet row → source of its value. Rows 10 and 19 stay blank.
pub const TARGET_ROW_RULES: &[TargetRowRule] = &[
    cell(1, First, 0),
    cell(2, First, 3),
    cell(3, Second, 0),
    derived(4, installed_count),
    cell(5, Second, 16),
    derived(6, ratio),
    derived(7, material),
    derived(8, rupture),
    derived(9, relief_condition),
    cell(11, Second, 9),
    derived(12, state),
    cell(13, First, 10),
    derived(14, liquid_density),
    cell(15, First, 21),
    derived(16, molecular_weight),
    derived(17, compressibility),
    derived(18, heat_capacity_ratio),
    cell(20, First, 13),
    cell(21, First, 17),
    cell(22, First, 20),
    derived(23, max_back_pressure),
    derived(24, min_back_pressure),
];

/// Records of the form, in order, including ones without a tag
pub fn form_records(source: &Grid) -> impl Iterator<Item = FormRecord<'_>> {
    (0..source.height() / 2).map(move |idx| FormRecord::new(source, idx * 2))
}

/// Build a Calculation Sheet from a Data Sheet form.
///
/// The template is copied unchanged; every record with a tag number adds one
/// column to its right, past both its populated cells and its merged regions.
pub fn data_to_calc(source: &Grid, template: &Grid) -> PsvResult<Grid> {
    let mut result = template.clone();
    let first_col = template.column_extent();
    let mut col = first_col;

    for record in form_records(source) {
        if !record.is_valid() {
            debug!(row = record.row + 1, "skipping form block without tag");
            continue;
        }

        debug!(tag = %record.tag(), col, "appending calculation column");
        for rule in TARGET_ROW_RULES {
            result.set(rule.row, col, rule.resolve(&record))?;
        }
        col += 1;
    }

    info!(
        columns = col - first_col,
        "data sheet converted to calculation sheet"
    );
    Ok(result)
}
