//! PSV Sheet Converter server binary
//!
//! Upload a Calculation Sheet or Data Sheet, download the converted workbook.

use std::path::PathBuf;

use clap::Parser;
use psv_sheets::api::{run_api_server, ApiConfig};
use psv_sheets::config::ConverterConfig;

#[derive(Parser, Debug)]
#[command(name = "psv-server")]
#[command(version)]
#[command(about = "PSV Sheet Converter - HTTP API for Calculation Sheet / Data Sheet conversion")]
#[command(long_about = r#"
PSV Sheet Converter - HTTP API

Conversion endpoints (multipart upload, one file field):
  - POST /api/v1/calc2data - Calculation Sheet -> Data_Sheet_filled_<name>.xlsm
  - POST /api/v1/data2calc - Data Sheet -> Calculation_Sheet_filled_<name>.xlsx

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Example usage:
  psv-server                             # Start on localhost:8080
  psv-server --host 0.0.0.0 --port 3000 --data-template templates/ds.xlsm

  curl -F "file=@Calculation Sheet.xlsm" -OJ \
    http://localhost:8080/api/v1/calc2data
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "PSV_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "PSV_PORT")]
    port: u16,

    /// YAML file with template paths and sheet names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data Sheet template (.xlsm)
    #[arg(long, env = "PSV_DATA_TEMPLATE")]
    data_template: Option<PathBuf>,

    /// Calculation Sheet template
    #[arg(long, env = "PSV_CALC_TEMPLATE")]
    calc_template: Option<PathBuf>,

    /// Largest accepted upload, in bytes
    #[arg(long, default_value_t = psv_sheets::api::server::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut converter = ConverterConfig::load(args.config.as_deref())?;
    if let Some(path) = args.data_template {
        converter.data_template = path;
    }
    if let Some(path) = args.calc_template {
        converter.calc_template = path;
    }

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes: args.max_upload_bytes,
        converter,
    };

    run_api_server(config).await
}
