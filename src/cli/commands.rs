use crate::config::ConverterConfig;
use crate::core::calc_to_data::LABEL_COL;
use crate::core::normalize;
use crate::error::PsvResult;
use crate::excel::SheetImporter;
use crate::pipeline::{run_calc_to_data, run_data_to_calc, ConversionOutput};
use crate::types::cell_ref;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

fn input_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Explicit output path, or the derived name next to the input
fn output_path(input: &Path, output: Option<PathBuf>, derived: &str) -> PathBuf {
    output.unwrap_or_else(|| input.with_file_name(derived))
}

fn write_output(
    input: &Path,
    output: Option<PathBuf>,
    result: &ConversionOutput,
) -> PsvResult<PathBuf> {
    let path = output_path(input, output, &result.file_name);
    fs::write(&path, &result.bytes)?;
    Ok(path)
}

fn print_templates(template: &Path, sheet: &str, verbose: bool) {
    if verbose {
        println!(
            "   Template: {} [{}]",
            template.display(),
            sheet.bright_blue()
        );
    }
}

/// Calculation Sheet → Data Sheet
pub fn calc2data(
    input: PathBuf,
    output: Option<PathBuf>,
    config: &ConverterConfig,
    verbose: bool,
) -> PsvResult<()> {
    println!("{}", "🧾 PSV Sheets - Calculation Sheet → Data Sheet".bold().green());
    println!("   Input: {} [{}]", input.display(), config.calc_sheet.bright_blue());
    print_templates(&config.data_template, &config.data_sheet, verbose);
    println!();

    let result = run_calc_to_data(&input, &input_name(&input), config)?;
    let path = write_output(&input, output, &result)?;

    println!("{}", "✅ Conversion Complete!".bold().green());
    println!("   Valves: {}", result.records.to_string().bold());
    println!("   Data Sheet: {}\n", path.display());
    Ok(())
}

/// Data Sheet → Calculation Sheet
pub fn data2calc(
    input: PathBuf,
    output: Option<PathBuf>,
    config: &ConverterConfig,
    verbose: bool,
) -> PsvResult<()> {
    println!("{}", "🧾 PSV Sheets - Data Sheet → Calculation Sheet".bold().green());
    println!("   Input: {} [{}]", input.display(), config.data_sheet.bright_blue());
    print_templates(&config.calc_template, &config.calc_sheet, verbose);
    println!();

    let result = run_data_to_calc(&input, &input_name(&input), config)?;
    let path = write_output(&input, output, &result)?;

    println!("{}", "✅ Conversion Complete!".bold().green());
    if result.records == 0 {
        println!("   {}", "⚠️  No tagged records found; template copied unchanged".yellow());
    } else {
        println!("   Valves: {}", result.records.to_string().bold());
    }
    println!("   Calculation Sheet: {}\n", path.display());
    Ok(())
}

/// List the property labels of a Calculation Sheet and what each one maps to
pub fn headers(input: PathBuf, sheet: &str) -> PsvResult<()> {
    println!("{}", "🔍 PSV Sheets - Property Labels".bold().green());
    println!("   File: {} [{}]\n", input.display(), sheet.bright_blue());

    let grid = SheetImporter::new(&input).load_grid(sheet)?;

    let mut recognized = 0;
    let mut total = 0;
    for row in 0..grid.height() {
        let label = grid.get(row, LABEL_COL);
        if label.is_blank() {
            continue;
        }
        total += 1;
        let location = cell_ref(row, LABEL_COL);
        match normalize(label) {
            Some(property) => {
                recognized += 1;
                println!(
                    "   {:<6} {} → {}",
                    location,
                    label.to_string().cyan(),
                    property.name().green()
                );
            }
            None => println!(
                "   {:<6} {} → {}",
                location,
                label.to_string().cyan(),
                "unrecognized".yellow()
            ),
        }
    }

    println!();
    println!(
        "{}",
        format!("📋 {} of {} labels recognized", recognized, total).bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_defaults_next_to_input() {
        let path = output_path(
            Path::new("sheets/unit-200.xlsm"),
            None,
            "Data_Sheet_filled_unit-200.xlsm",
        );
        assert_eq!(path, PathBuf::from("sheets/Data_Sheet_filled_unit-200.xlsm"));
    }

    #[test]
    fn test_output_path_explicit() {
        let path = output_path(
            Path::new("sheets/unit-200.xlsm"),
            Some(PathBuf::from("out.xlsm")),
            "ignored.xlsm",
        );
        assert_eq!(path, PathBuf::from("out.xlsm"));
    }

    #[test]
    fn test_input_name() {
        assert_eq!(input_name(Path::new("a/b/Calc.xlsm")), "Calc.xlsm");
    }
}
