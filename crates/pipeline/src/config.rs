use ingest::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Above this many estimated tokens the text is chunked
    pub token_threshold: usize,
    pub chars_per_token: usize,
    pub chunker: ChunkerConfig,
    /// Pause between consecutive chunk extractions
    pub cooldown_ms: u64,
    /// How long a progress reader waits for an event before checking again
    pub progress_poll_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            token_threshold: 3_000,
            chars_per_token: 4,
            chunker: ChunkerConfig::default(),
            cooldown_ms: 5_000,
            progress_poll_ms: 1_000,
        }
    }
}

impl PipelineConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn progress_poll_interval(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms)
    }
}
