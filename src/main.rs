use clap::{Parser, Subcommand};
use psv_sheets::cli;
use psv_sheets::config::ConverterConfig;
use psv_sheets::error::PsvResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "psv-sheets")]
#[command(about = "Convert PSV Calculation Sheets to Data Sheets and back.")]
#[command(long_about = "PSV Sheets - Pressure Safety Valve spreadsheet converter

A Calculation Sheet lists one valve per column (properties down column B,
valves from column D). A Data Sheet form lists one valve per two-row block.

COMMANDS:
  calc2data  - Calculation Sheet → Data Sheet (.xlsm, template macros kept)
  data2calc  - Data Sheet → Calculation Sheet (.xlsx)
  headers    - Show how each property label of a Calculation Sheet is read

TEMPLATES:
  Defaults are 'Data Sheet.xlsm' [FORM] and 'Calculation Sheet.xlsm' [PSV]
  in the working directory. Override with --template, --config, or the
  PSV_DATA_TEMPLATE / PSV_CALC_TEMPLATE environment variables.

EXAMPLES:
  psv-sheets calc2data \"Calculation Sheet.xlsm\"
  psv-sheets data2calc unit-200.xlsm -o unit-200-calc.xlsx
  psv-sheets headers \"Calculation Sheet.xlsm\"")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Fill the Data Sheet template from a Calculation Sheet.

Every valve column of the Calculation Sheet (Tag No. in row 2, from column D)
becomes one two-row block of the FORM sheet, starting at row 9. The form area
is cleared first, except for the unit labels in the second row of each block.
The rest of the template (other sheets, formatting, merged cells, macros) is
kept as it is.

Output defaults to Data_Sheet_filled_<input name>.xlsm next to the input.")]
    /// Calculation Sheet → Data Sheet
    Calc2data {
        /// Calculation Sheet workbook
        input: PathBuf,

        /// Output workbook path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Data Sheet template (.xlsm)
        #[arg(short, long, env = "PSV_DATA_TEMPLATE")]
        template: Option<PathBuf>,

        /// Worksheet of the input to read
        #[arg(short, long)]
        sheet: Option<String>,

        /// YAML file with template paths and sheet names
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show conversion details
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Build a Calculation Sheet from a Data Sheet.

Every two rows of the FORM sheet are one record; each record with a Tag No.
adds one column to the right of the Calculation Sheet template.

Output defaults to Calculation_Sheet_filled_<input name>.xlsx next to the input.")]
    /// Data Sheet → Calculation Sheet
    Data2calc {
        /// Data Sheet workbook
        input: PathBuf,

        /// Output workbook path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Calculation Sheet template
        #[arg(short, long, env = "PSV_CALC_TEMPLATE")]
        template: Option<PathBuf>,

        /// Worksheet of the input to read
        #[arg(short, long)]
        sheet: Option<String>,

        /// YAML file with template paths and sheet names
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show conversion details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how each property label of a Calculation Sheet is recognized
    Headers {
        /// Calculation Sheet workbook
        input: PathBuf,

        /// Worksheet to inspect
        #[arg(short, long, default_value = psv_sheets::config::DEFAULT_CALC_SHEET)]
        sheet: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "psv_sheets=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> PsvResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Calc2data {
            input,
            output,
            template,
            sheet,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = ConverterConfig::load(config.as_deref())?;
            if let Some(template) = template {
                config.data_template = template;
            }
            if let Some(sheet) = sheet {
                config.calc_sheet = sheet;
            }
            cli::calc2data(input, output, &config, verbose)
        }

        Commands::Data2calc {
            input,
            output,
            template,
            sheet,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = ConverterConfig::load(config.as_deref())?;
            if let Some(template) = template {
                config.calc_template = template;
            }
            if let Some(sheet) = sheet {
                config.data_sheet = sheet;
            }
            cli::data2calc(input, output, &config, verbose)
        }

        Commands::Headers { input, sheet } => {
            init_logging(false);
            cli::headers(input, &sheet)
        }
    }
}
