use ingest::IngestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid pipeline configuration: {0}")]
    Config(#[from] IngestError),

    #[error("Text must not be empty")]
    EmptyInput,

    #[error("Extraction failed: {0:#}")]
    Extraction(#[source] anyhow::Error),

    /// A chunk failed; the run stopped there
    #[error("Extraction failed on chunk {index} of {total}: {source:#}")]
    ChunkFailed {
        index: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("No graph generated")]
    EmptyExtraction,
}

impl PipelineError {
    /// Whether the caller's input, rather than a collaborator, is at fault
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::EmptyExtraction)
    }
}
