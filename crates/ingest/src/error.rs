use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0}. Supported types: pdf, txt")]
    UnsupportedFormat(String),

    #[error("Failed to decode {format} file: {reason}")]
    Decode { format: &'static str, reason: String },

    #[error("No text could be extracted from the file")]
    EmptyDocument,

    #[error("Invalid chunker configuration: {0}")]
    InvalidConfig(String),
}
