//! API request handlers

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::server::AppState;
use crate::config::ConverterConfig;
use crate::error::{PsvError, PsvResult};
use crate::pipeline::{run_calc_to_data, run_data_to_calc, ConversionOutput};

/// Response header carrying the number of converted valve records
pub const RECORDS_HEADER: &str = "x-psv-records";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Failed request: status plus the message sent back in the envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PsvError> for ApiError {
    fn from(e: PsvError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "conversion request failed");
        }
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "PSV Sheet Converter".to_string(),
        version: state.version.clone(),
        description: "Converts PSV Calculation Sheets to Data Sheets and back".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint(
                "/api/v1/calc2data",
                "POST",
                "Upload a Calculation Sheet, download the filled Data Sheet (.xlsm)",
            ),
            endpoint(
                "/api/v1/data2calc",
                "POST",
                "Upload a Data Sheet, download the filled Calculation Sheet (.xlsx)",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec!["calc2data".to_string(), "data2calc".to_string()],
    }))
}

/// The two directions a workbook can be converted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    CalcToData,
    DataToCalc,
}

impl Conversion {
    pub fn upload_prefix(self) -> &'static str {
        match self {
            Conversion::CalcToData => "uploaded_calc_",
            Conversion::DataToCalc => "uploaded_data_",
        }
    }

    fn run(
        self,
        input: &Path,
        original_name: &str,
        config: &ConverterConfig,
    ) -> PsvResult<ConversionOutput> {
        match self {
            Conversion::CalcToData => run_calc_to_data(input, original_name, config),
            Conversion::DataToCalc => run_data_to_calc(input, original_name, config),
        }
    }
}

/// First multipart field that carries a file: (file name, contents)
async fn receive_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PsvError::Upload(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PsvError::Upload(e.to_string()))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(PsvError::Upload("no file was uploaded".to_string()).into())
}

async fn convert(
    state: Arc<AppState>,
    multipart: Multipart,
    conversion: Conversion,
) -> Result<Response, ApiError> {
    let (file_name, bytes) = receive_upload(multipart).await?;
    info!(?conversion, file = %file_name, size = bytes.len(), "workbook uploaded");

    let config = state.converter.clone();
    let output = tokio::task::spawn_blocking(move || -> PsvResult<ConversionOutput> {
        // Removed from disk when dropped, whatever the outcome
        let mut upload = tempfile::Builder::new()
            .prefix(conversion.upload_prefix())
            .tempfile()?;
        upload.write_all(&bytes)?;
        upload.flush()?;
        conversion.run(upload.path(), &file_name, &config)
    })
    .await
    .map_err(|e| ApiError::internal(format!("conversion task failed: {}", e)))??;

    Ok(attachment(output))
}

/// Download name safe inside a quoted header parameter
fn quoted_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect()
}

fn attachment(output: ConversionOutput) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        quoted_file_name(&output.file_name)
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, output.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static(RECORDS_HEADER),
                output.records.to_string(),
            ),
        ],
        output.bytes,
    )
        .into_response()
}

/// POST /api/v1/calc2data - Calculation Sheet → Data Sheet
pub async fn calc2data(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    convert(state, multipart, Conversion::CalcToData).await
}

/// POST /api/v1/data2calc - Data Sheet → Calculation Sheet
pub async fn data2calc(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    convert(state, multipart, Conversion::DataToCalc).await
}
