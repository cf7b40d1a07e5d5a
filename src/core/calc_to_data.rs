//! Calculation Sheet → Data Sheet
//!
//! The Calculation Sheet holds one valve per column: tag numbers run along
//! row 2 from column D, property labels sit in column B. The Data Sheet form
//! gives every valve a two-row block starting at row 9.

use std::collections::HashMap;

use tracing::{debug, info};

use super::header::{normalize, Property};
use super::transforms::{back_pressure, convert_value, phase_state};
use crate::error::{PsvError, PsvResult};
use crate::types::{CellValue, Grid, PairLine};

/// Row of the Calculation Sheet carrying the tag numbers
pub const TAG_ROW: u32 = 1;
/// Column of the Calculation Sheet carrying the property labels
pub const LABEL_COL: u32 = 1;
/// First valve column of the Calculation Sheet
pub const FIRST_VALVE_COL: u32 = 3;

/// First row of the Data Sheet form (Excel row 9)
pub const FORM_START_ROW: u32 = 8;
/// Last row cleared before writing (Excel row 200)
pub const FORM_LAST_ROW: u32 = 199;

//==============================================================================
// Valve Records
//==============================================================================

/// Properties of one valve read from a Calculation Sheet column
#[derive(Debug, Clone, PartialEq)]
pub struct ValveRecord {
    pub tag: String,
    pub column: u32,
    values: HashMap<Property, CellValue>,
}

impl ValveRecord {
    pub fn new(tag: impl Into<String>, column: u32) -> Self {
        let tag = tag.into();
        let mut values = HashMap::new();
        values.insert(Property::TagNo, CellValue::text(tag.clone()));
        Self {
            tag,
            column,
            values,
        }
    }

    pub fn get(&self, property: Property) -> Option<&CellValue> {
        self.values.get(&property)
    }

    pub fn insert(&mut self, property: Property, value: CellValue) {
        self.values.insert(property, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Tag numbers along the tag row, trimmed, blanks dropped, left to right
pub fn read_tags(source: &Grid) -> Vec<String> {
    (FIRST_VALVE_COL..source.width())
        .map(|col| source.get(TAG_ROW, col))
        .filter(|cell| !cell.is_blank())
        .map(|cell| cell.to_string().trim().to_string())
        .collect()
}

/// Which source row feeds each recognized property; later rows win
pub fn property_rows(source: &Grid) -> Vec<(u32, Property)> {
    let mut by_property: HashMap<Property, u32> = HashMap::new();
    for row in 1..source.height() {
        match normalize(source.get(row, LABEL_COL)) {
            Some(Property::TagNo) | None => {}
            Some(property) => {
                by_property.insert(property, row);
            }
        }
    }

    let mut rows: Vec<(u32, Property)> = by_property
        .into_iter()
        .map(|(property, row)| (row, property))
        .collect();
    rows.sort();
    rows
}

/// Build one record per tag.
///
/// The record at position `i` reads column `FIRST_VALVE_COL + i`.
pub fn read_valve_records(source: &Grid) -> PsvResult<Vec<ValveRecord>> {
    let tags = read_tags(source);
    if tags.is_empty() {
        return Err(PsvError::NoRecordsFound);
    }

    let rows = property_rows(source);
    debug!(tags = tags.len(), properties = rows.len(), "reading calculation sheet");

    let records = tags
        .into_iter()
        .enumerate()
        .map(|(position, tag)| {
            let column = FIRST_VALVE_COL + position as u32;
            let mut record = ValveRecord::new(tag, column);
            for &(row, property) in &rows {
                record.insert(property, source.get(row, column).clone());
            }
            record
        })
        .collect();

    Ok(records)
}

//==============================================================================
// Field-Write Rules
//==============================================================================

/// Constant written verbatim into the form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl From<Literal> for CellValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Int(i) => CellValue::Int(i),
            Literal::Float(f) => CellValue::Float(f),
            Literal::Text(s) => CellValue::text(s),
        }
    }
}

/// Where a form cell gets its value
#[derive(Clone, Copy)]
pub enum FieldSource {
    /// Record value through `convert_value`
    Field(Property),
    /// Record value through a dedicated transform
    FieldWith(Property, fn(Option<&CellValue>) -> CellValue),
    Literal(Literal),
    /// Derived from the whole record
    Computed(fn(&ValveRecord) -> CellValue),
    /// Left cleared
    Blank,
}

/// One destination cell inside a record's two-row block
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub col: u32,
    pub line: PairLine,
    pub source: FieldSource,
}

const fn rule(col: u32, line: PairLine, source: FieldSource) -> FieldRule {
    FieldRule { col, line, source }
}

fn header_back_pressure(record: &ValveRecord) -> CellValue {
    back_pressure(
        record.get(Property::MinBpAtHeader),
        record.get(Property::MaxBpAtHeader),
    )
}

use FieldSource::{Blank, Computed, Field, FieldWith};
use PairLine::{First, Second};

pub const WRITE_RULES: &[FieldRule] = &[
    rule(0, First, Field(Property::TagNo)),
    rule(3, First, Field(Property::ReliefCase)),
    rule(6, First, Field(Property::ReliefCondition)),
    rule(9, First, FieldWith(Property::Phase, phase_state)),
    rule(10, First, Field(Property::FlowRate)),
    rule(11, First, FieldSource::Literal(Literal::Float(3.63))),
    rule(12, First, FieldSource::Literal(Literal::Text("50.8 / F.V."))),
    rule(13, First, Field(Property::SetPressure)),
    rule(14, First, Computed(header_back_pressure)),
    rule(15, First, FieldSource::Literal(Literal::Float(4.12))),
    rule(16, First, FieldSource::Literal(Literal::Text("HVG"))),
    rule(17, First, Field(Property::AllowableOverpressure)),
    rule(18, First, FieldSource::Literal(Literal::Int(104))),
    rule(19, First, FieldSource::Literal(Literal::Int(176))),
    rule(20, First, Field(Property::ReliefTemperature)),
    rule(21, First, Field(Property::Viscosity)),
    rule(22, First, Field(Property::MolecularWeight)),
    rule(23, First, Field(Property::GasZ)),
    rule(24, First, FieldSource::Literal(Literal::Text("0Ca"))),
    rule(25, First, FieldSource::Literal(Literal::Text("0Ca"))),
    rule(26, First, Field(Property::Remark)),
    rule(0, Second, Field(Property::DwgNo)),
    rule(9, Second, Field(Property::Fluid)),
    rule(16, Second, Field(Property::PsvType)),
    rule(17, Second, Blank),
    rule(26, Second, Field(Property::Remark)),
];

/// Unit labels embedded in the second line of every block
pub const PROTECTED_CELLS: &[(u32, PairLine)] = &[
    (10, Second),
    (11, Second),
    (12, Second),
    (13, Second),
    (14, Second),
    (15, Second),
    (18, Second),
    (19, Second),
    (20, Second),
    (21, Second),
    (22, Second),
    (23, Second),
];

impl FieldRule {
    /// Value this rule writes for a record, `None` when it writes nothing
    pub fn resolve(&self, record: &ValveRecord) -> Option<CellValue> {
        match self.source {
            Computed(derive) => Some(derive(record)),
            FieldSource::Literal(literal) => Some(literal.into()),
            FieldWith(property, transform) => Some(transform(record.get(property))),
            Field(property) => Some(convert_value(record.get(property))),
            Blank => None,
        }
    }
}

/// Columns touched by the write rules, inclusive
pub fn clear_span() -> (u32, u32) {
    let min = WRITE_RULES.iter().map(|r| r.col).min().unwrap_or(0);
    let max = WRITE_RULES.iter().map(|r| r.col).max().unwrap_or(26);
    (min, max)
}

pub fn is_protected(col: u32, line: PairLine) -> bool {
    PROTECTED_CELLS.contains(&(col, line))
}

//==============================================================================
// Conversion
//==============================================================================

/// Blank the form region, sparing protected unit cells
pub fn clear_form(grid: &mut Grid) -> PsvResult<()> {
    let (first_col, last_col) = clear_span();
    for row in FORM_START_ROW..=FORM_LAST_ROW {
        let line = PairLine::of_row(row, FORM_START_ROW);
        for col in first_col..=last_col {
            if !is_protected(col, line) {
                grid.clear(row, col)?;
            }
        }
    }
    Ok(())
}

fn write_record(grid: &mut Grid, base_row: u32, record: &ValveRecord) -> PsvResult<()> {
    for rule in WRITE_RULES {
        if let Some(value) = rule.resolve(record) {
            grid.set(base_row + rule.line.offset(), rule.col, value)?;
        }
    }
    Ok(())
}

/// Clear the form and write one two-row block per record, in order
pub fn fill_form(form: &mut Grid, records: &[ValveRecord]) -> PsvResult<()> {
    clear_form(form)?;
    for (idx, record) in records.iter().enumerate() {
        let base_row = FORM_START_ROW + idx as u32 * 2;
        debug!(tag = %record.tag, row = base_row + 1, "writing valve record");
        write_record(form, base_row, record)?;
    }
    Ok(())
}

/// Run `pass` on the destination with its merged regions lifted.
///
/// The recorded regions are merged again when the pass returns, whether it
/// succeeded or failed part way through.
pub fn with_regions_lifted<T>(
    destination: &mut Grid,
    pass: impl FnOnce(&mut Grid) -> PsvResult<T>,
) -> PsvResult<T> {
    let mut form = destination.unmerge_all();
    debug!(merged = form.regions().len(), "unmerged form regions");
    pass(&mut *form)
}

/// Fill a Data Sheet form from a Calculation Sheet.
///
/// Merged regions of `destination` are lifted for the clear and write passes and
/// restored afterwards, including when a write fails. Returns the number of
/// valve records written.
pub fn calc_to_data(source: &Grid, destination: &mut Grid) -> PsvResult<usize> {
    let records = read_valve_records(source)?;

    with_regions_lifted(destination, |form| fill_form(form, &records))?;

    info!(records = records.len(), "calculation sheet converted to data sheet");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergeRegion;
    use pretty_assertions::assert_eq;

    fn calc_sheet(tags: &[&str]) -> Grid {
        let mut grid = Grid::new();
        grid.set(TAG_ROW, LABEL_COL, "Tag No.").unwrap();
        for (i, tag) in tags.iter().enumerate() {
            grid.set(TAG_ROW, FIRST_VALVE_COL + i as u32, *tag).unwrap();
        }
        grid
    }

    #[test]
    fn test_read_tags_skips_blanks_and_trims() {
        let mut grid = calc_sheet(&[" PSV-101 ", "", "PSV-103"]);
        grid.set(TAG_ROW, 6, 104.0).unwrap();
        assert_eq!(read_tags(&grid), vec!["PSV-101", "PSV-103", "104"]);
    }

    #[test]
    fn test_no_tags_is_fatal() {
        let grid = calc_sheet(&[]);
        assert!(matches!(read_valve_records(&grid), Err(PsvError::NoRecordsFound)));

        let mut destination = Grid::new();
        assert!(calc_to_data(&grid, &mut destination).is_err());
    }

    #[test]
    fn test_property_rows_resolve_aliases() {
        let mut grid = calc_sheet(&["PSV-101"]);
        grid.set(2, LABEL_COL, "Pset").unwrap();
        grid.set(3, LABEL_COL, "unknown label").unwrap();
        grid.set(4, LABEL_COL, 12.0).unwrap();
        grid.set(5, LABEL_COL, "state (v/s/l)").unwrap();

        assert_eq!(
            property_rows(&grid),
            vec![(2, Property::SetPressure), (5, Property::Phase)]
        );
    }

    #[test]
    fn test_duplicate_labels_last_row_wins() {
        let mut grid = calc_sheet(&["PSV-101"]);
        grid.set(2, LABEL_COL, "Flow Rate").unwrap();
        grid.set(2, FIRST_VALVE_COL, 100.0).unwrap();
        grid.set(7, LABEL_COL, "Required Flowrate").unwrap();
        grid.set(7, FIRST_VALVE_COL, 250.0).unwrap();

        let records = read_valve_records(&grid).unwrap();
        assert_eq!(records[0].get(Property::FlowRate), Some(&CellValue::Float(250.0)));
    }

    #[test]
    fn test_records_read_by_position() {
        let mut grid = calc_sheet(&["PSV-101", "PSV-102"]);
        grid.set(2, LABEL_COL, "Pset").unwrap();
        grid.set(2, 3, 10.0).unwrap();
        grid.set(2, 4, 12.5).unwrap();

        let records = read_valve_records(&grid).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tag, "PSV-102");
        assert_eq!(records[1].column, 4);
        assert_eq!(records[1].get(Property::SetPressure), Some(&CellValue::Float(12.5)));
        assert_eq!(records[1].get(Property::TagNo), Some(&CellValue::text("PSV-102")));
        assert_eq!(records[1].get(Property::Viscosity), None);
    }

    #[test]
    fn test_rule_priority() {
        let mut record = ValveRecord::new("PSV-1", 3);
        record.insert(Property::Phase, CellValue::text("v"));
        record.insert(Property::MinBpAtHeader, CellValue::Float(50.8));
        record.insert(Property::MaxBpAtHeader, CellValue::Float(55.2));
        record.insert(Property::FlowRate, CellValue::Float(1200.0));

        let value_at = |col: u32, line: PairLine| {
            WRITE_RULES
                .iter()
                .find(|r| r.col == col && r.line == line)
                .and_then(|r| r.resolve(&record))
        };

        assert_eq!(value_at(9, First), Some(CellValue::text("VAPOR")));
        assert_eq!(value_at(10, First), Some(CellValue::Int(1200)));
        assert_eq!(value_at(11, First), Some(CellValue::Float(3.63)));
        assert_eq!(value_at(14, First), Some(CellValue::text("50.8 / 4.4")));
        assert_eq!(value_at(18, First), Some(CellValue::Int(104)));
        assert_eq!(value_at(21, First), Some(CellValue::text("-")));
        assert_eq!(value_at(17, Second), None);
    }

    #[test]
    fn test_clear_span_covers_rules() {
        assert_eq!(clear_span(), (0, 26));
    }

    #[test]
    fn test_clear_form_spares_protected_cells() {
        let mut grid = Grid::new();
        for row in FORM_START_ROW..FORM_START_ROW + 4 {
            for col in 0..=27 {
                grid.set(row, col, "stale").unwrap();
            }
        }
        grid.set(3, 0, "title").unwrap();

        clear_form(&mut grid).unwrap();

        for row in FORM_START_ROW..FORM_START_ROW + 4 {
            let line = PairLine::of_row(row, FORM_START_ROW);
            for col in 0..=26 {
                let expected = if is_protected(col, line) {
                    CellValue::text("stale")
                } else {
                    CellValue::Empty
                };
                assert_eq!(grid.get(row, col), &expected, "row {} col {}", row, col);
            }
            // Outside the span
            assert_eq!(grid.get(row, 27), &CellValue::text("stale"));
        }
        assert_eq!(grid.get(3, 0), &CellValue::text("title"));
    }

    #[test]
    fn test_calc_to_data_places_blocks_in_order() {
        let source = calc_sheet(&["PSV-101", "PSV-102", "PSV-103"]);
        let mut destination = Grid::new();

        let written = calc_to_data(&source, &mut destination).unwrap();

        assert_eq!(written, 3);
        assert_eq!(destination.get(8, 0), &CellValue::text("PSV-101"));
        assert_eq!(destination.get(10, 0), &CellValue::text("PSV-102"));
        assert_eq!(destination.get(12, 0), &CellValue::text("PSV-103"));
        assert_eq!(destination.get(9, 0), &CellValue::text("-"));
        assert_eq!(destination.get(14, 0), &CellValue::Empty);
    }

    #[test]
    fn test_calc_to_data_restores_merges() {
        let source = calc_sheet(&["PSV-101"]);
        let mut destination = Grid::new();
        let header = MergeRegion::new(0, 0, 1, 5);
        let tag_cell = MergeRegion::new(8, 0, 9, 0);
        destination.merge(header).unwrap();
        destination.merge(tag_cell).unwrap();

        calc_to_data(&source, &mut destination).unwrap();

        assert_eq!(destination.merges(), &[header, tag_cell]);
        assert_eq!(destination.get(8, 0), &CellValue::text("PSV-101"));
        // The Dwg No. written under the merge is dropped when it is restored
        assert_eq!(destination.get(9, 0), &CellValue::Empty);
    }
}
