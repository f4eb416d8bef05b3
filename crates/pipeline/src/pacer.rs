use extract::{GraphExtractor, GraphFragment};
use ingest::TextChunk;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Drives extraction calls one after another with a flat cooldown in between
pub struct Pacer {
    cooldown: Duration,
}

impl Pacer {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Whole text in one call: reports 50% before and 100% after
    pub async fn run_single(
        &self,
        extractor: &dyn GraphExtractor,
        text: &str,
        reporter: &ProgressReporter,
    ) -> Result<GraphFragment, PipelineError> {
        reporter.emit(ProgressEvent::single_pass()).await;

        let fragment = extractor.extract(text).await.map_err(|e| {
            error!(error = %format!("{:#}", e), "Extraction failed");
            PipelineError::Extraction(e)
        })?;

        reporter.emit(ProgressEvent::complete(1)).await;
        Ok(fragment)
    }

    /// Process chunks strictly in order. The first failure aborts the run
    /// without a completion event.
    pub async fn run_chunks(
        &self,
        extractor: &dyn GraphExtractor,
        chunks: &[TextChunk],
        reporter: &ProgressReporter,
    ) -> Result<Vec<GraphFragment>, PipelineError> {
        let total = chunks.len();
        reporter.emit(ProgressEvent::starting(total)).await;

        let mut fragments = Vec::with_capacity(total);

        for (idx, chunk) in chunks.iter().enumerate() {
            let current = idx + 1;
            info!(
                chunk = current,
                total,
                chars = chunk.char_len(),
                fingerprint = %chunk.fingerprint,
                "Processing chunk"
            );
            reporter.emit(ProgressEvent::processing_chunk(current, total)).await;

            let fragment = extractor.extract(&chunk.content).await.map_err(|e| {
                error!(chunk = current, total, error = %format!("{:#}", e), "Error processing chunk");
                PipelineError::ChunkFailed {
                    index: current,
                    total,
                    source: e,
                }
            })?;

            info!(
                chunk = current,
                total,
                nodes = fragment.nodes.len(),
                relationships = fragment.relationships.len(),
                "Chunk processed"
            );
            fragments.push(fragment);

            if current < total {
                info!(cooldown_ms = self.cooldown.as_millis() as u64, "Waiting before next chunk to avoid rate limits");
                sleep(self.cooldown).await;
            }
        }

        reporter.emit(ProgressEvent::complete(total)).await;
        Ok(fragments)
    }
}
