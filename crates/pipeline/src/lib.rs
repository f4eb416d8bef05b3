pub mod aggregate;
pub mod config;
pub mod error;
pub mod pacer;
pub mod progress;

pub use aggregate::{ExtractionRun, aggregate, is_empty_extraction};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pacer::Pacer;
pub use progress::{ProgressEvent, ProgressReporter};

use extract::{GraphExtractor, GraphFragment};
use graph::ConsolidatedGraph;
use ingest::{Chunker, TextChunk, estimate_tokens};
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// How a text will be sent to the extractor
#[derive(Debug, Clone)]
pub enum ExtractionPlan {
    Single,
    Chunked(Vec<TextChunk>),
}

/// Text in, consolidated graph out. One instance serves every request; all
/// per-request state lives inside the call.
pub struct KnowledgeGraphPipeline {
    extractor: Arc<dyn GraphExtractor>,
    chunker: Chunker,
    pacer: Pacer,
    config: PipelineConfig,
}

impl KnowledgeGraphPipeline {
    pub fn new(
        extractor: Arc<dyn GraphExtractor>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let chunker = Chunker::new(config.chunker.clone())?;
        let pacer = Pacer::new(config.cooldown());

        Ok(Self {
            extractor,
            chunker,
            pacer,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn plan(&self, text: &str) -> ExtractionPlan {
        let estimated_tokens = estimate_tokens(text, self.config.chars_per_token);
        info!(
            chars = text.chars().count(),
            estimated_tokens,
            threshold = self.config.token_threshold,
            "Planning extraction"
        );

        if estimated_tokens > self.config.token_threshold {
            let chunks = self.chunker.chunk(text);
            info!(chunks = chunks.len(), "Text exceeds token threshold, chunking");
            ExtractionPlan::Chunked(chunks)
        } else {
            ExtractionPlan::Single
        }
    }

    /// Run extraction and return the fragments, unconsolidated
    pub async fn extract_fragments(
        &self,
        text: &str,
        reporter: &ProgressReporter,
    ) -> Result<Vec<GraphFragment>, PipelineError> {
        let run = match self.plan(text) {
            ExtractionPlan::Single => {
                ExtractionRun::Single(self.pacer.run_single(self.extractor.as_ref(), text, reporter).await?)
            }
            ExtractionPlan::Chunked(chunks) => ExtractionRun::Chunked(
                self.pacer.run_chunks(self.extractor.as_ref(), &chunks, reporter).await?,
            ),
        };

        Ok(aggregate(run))
    }

    /// Full pipeline for one request
    pub async fn generate(
        &self,
        text: &str,
        reporter: ProgressReporter,
    ) -> Result<ConsolidatedGraph, PipelineError> {
        let span = info_span!("generate_graph", request_id = %Uuid::new_v4());

        async move {
            if text.trim().is_empty() {
                return Err(PipelineError::EmptyInput);
            }

            let fragments = self.extract_fragments(text, &reporter).await?;
            if is_empty_extraction(&fragments) {
                return Err(PipelineError::EmptyExtraction);
            }

            Ok(graph::consolidate(&fragments))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use extract::{GraphNode, GraphRelationship};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every call; returns a two-node fragment per call, or fails on a chosen call
    struct RecordingExtractor {
        calls: Mutex<Vec<String>>,
        fail_on_call: Option<usize>,
        empty: bool,
    }

    impl RecordingExtractor {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_on_call: None, empty: false }
        }

        fn failing_on(call: usize) -> Self {
            Self { fail_on_call: Some(call), ..Self::new() }
        }

        fn returning_nothing() -> Self {
            Self { empty: true, ..Self::new() }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GraphExtractor for RecordingExtractor {
        async fn extract(&self, text: &str) -> anyhow::Result<GraphFragment> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(text.to_string());
                calls.len()
            };

            if self.fail_on_call == Some(call) {
                anyhow::bail!("rate limited");
            }
            if self.empty {
                return Ok(GraphFragment::default());
            }

            let a = format!("Entity{}a", call);
            let b = format!("Entity{}b", call);
            Ok(GraphFragment::new(
                vec![GraphNode::new(&a, "Concept"), GraphNode::new(&b, "Concept")],
                vec![GraphRelationship::new(&a, &b, "RELATED_TO")],
            ))
        }
    }

    fn pipeline(extractor: Arc<RecordingExtractor>) -> Arc<KnowledgeGraphPipeline> {
        Arc::new(KnowledgeGraphPipeline::new(extractor, PipelineConfig::default()).unwrap())
    }

    /// Run the pipeline while draining its progress channel
    async fn run_collecting(
        pipeline: Arc<KnowledgeGraphPipeline>,
        text: String,
    ) -> (Result<ConsolidatedGraph, PipelineError>, Vec<ProgressEvent>) {
        let (reporter, mut rx) = ProgressReporter::channel();
        let task = tokio::spawn(async move { pipeline.generate(&text, reporter).await });

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (task.await.unwrap(), events)
    }

    fn letters(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz".chars().cycle().take(len).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_text_is_one_call_with_two_events() {
        let extractor = Arc::new(RecordingExtractor::new());
        let text = letters(12_000); // exactly 3000 estimated tokens

        let (result, events) = run_collecting(pipeline(extractor.clone()), text.clone()).await;

        let graph = result.unwrap();
        assert_eq!(extractor.call_count(), 1);
        assert_eq!(extractor.calls.lock().unwrap()[0], text);
        assert_eq!(graph.nodes.len(), 2);

        let progress: Vec<f64> = events.iter().map(|e| e.progress).collect();
        assert_eq!(progress, vec![50.0, 100.0]);
        assert_eq!(events[1].status, "Complete");
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_text_is_chunked_and_paced() {
        let extractor = Arc::new(RecordingExtractor::new());
        let start = tokio::time::Instant::now();

        let (result, events) = run_collecting(pipeline(extractor.clone()), letters(26_000)).await;

        let graph = result.unwrap();
        assert_eq!(extractor.call_count(), 3);
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.nodes.len(), 6);

        // Two cooldowns between three chunks
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);

        let statuses: Vec<&str> = events.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(
            statuses,
            vec![
                "Starting",
                "Processing chunk 1 of 3",
                "Processing chunk 2 of 3",
                "Processing chunk 3 of 3",
                "Complete",
            ]
        );
        let currents: Vec<usize> = events.iter().map(|e| e.current).collect();
        assert_eq!(currents, vec![0, 1, 2, 3, 3]);
        assert!(events.iter().all(|e| e.total == 3));
        assert_eq!(events.last().unwrap().progress, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_failure_aborts_run() {
        let extractor = Arc::new(RecordingExtractor::failing_on(2));

        let (result, events) = run_collecting(pipeline(extractor.clone()), letters(26_000)).await;

        match result {
            Err(PipelineError::ChunkFailed { index, total, source }) => {
                assert_eq!(index, 2);
                assert_eq!(total, 3);
                assert!(source.to_string().contains("rate limited"));
            }
            other => panic!("expected chunk failure, got {:?}", other),
        }
        assert_eq!(extractor.call_count(), 2);
        assert!(events.iter().all(|e| e.status != "Complete"));
        assert_eq!(events.last().unwrap().status, "Processing chunk 2 of 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_call_failure_is_reported() {
        let extractor = Arc::new(RecordingExtractor::failing_on(1));

        let (result, events) = run_collecting(pipeline(extractor), "Ada met Babbage.".to_string()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
        assert!(err.to_string().contains("rate limited"));
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_extraction_is_an_input_error() {
        let pipeline = pipeline(Arc::new(RecordingExtractor::returning_nothing()));

        let err = pipeline.generate("Nothing to see.", ProgressReporter::disabled()).await.unwrap_err();

        assert!(matches!(err, PipelineError::EmptyExtraction));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_before_extraction() {
        let extractor = Arc::new(RecordingExtractor::new());
        let pipeline = pipeline(extractor.clone());

        let err = pipeline.generate("   \n ", ProgressReporter::disabled()).await.unwrap_err();

        assert!(matches!(err, PipelineError::EmptyInput));
        assert_eq!(extractor.call_count(), 0);
    }

    #[test]
    fn test_plan_threshold() {
        let pipeline = pipeline(Arc::new(RecordingExtractor::new()));

        assert!(matches!(pipeline.plan(&letters(12_003)), ExtractionPlan::Single));
        match pipeline.plan(&letters(12_004)) {
            ExtractionPlan::Chunked(chunks) => assert_eq!(chunks.len(), 2),
            ExtractionPlan::Single => panic!("expected chunking above the threshold"),
        }
    }

    #[test]
    fn test_invalid_chunker_config_is_rejected() {
        let config = PipelineConfig {
            chunker: ingest::ChunkerConfig { chunk_size: 10, chunk_overlap: 20, ..Default::default() },
            ..PipelineConfig::default()
        };

        let result = KnowledgeGraphPipeline::new(Arc::new(RecordingExtractor::new()), config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
