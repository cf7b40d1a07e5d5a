use thiserror::Error;

pub type PsvResult<T> = Result<T, PsvError>;

#[derive(Error, Debug)]
pub enum PsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Could not load template: {0}")]
    TemplateLoad(String),

    #[error("No valid PSV Tag No. found in Calculation Sheet (expected in row 2, col D onwards)")]
    NoRecordsFound,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to save converted workbook: {0}")]
    Persist(String),

    #[error("Cell {0} is covered by a merged region")]
    MergedCell(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl PsvError {
    /// True when the failure was caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PsvError::Parse(_) | PsvError::NoRecordsFound | PsvError::Upload(_)
        )
    }
}
