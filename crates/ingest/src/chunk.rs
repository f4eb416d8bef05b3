use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub content: String,
    pub index: usize, // 0-based position in the run
    pub total: usize,
    pub fingerprint: String,
}

impl TextChunk {
    pub fn new(content: String, index: usize, total: usize) -> Self {
        let fingerprint = Self::generate_fingerprint(&content);

        Self {
            content,
            index,
            total,
            fingerprint,
        }
    }

    /// Number the chunks of a run in order
    pub fn sequence(contents: Vec<String>) -> Vec<TextChunk> {
        let total = contents.len();
        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| TextChunk::new(content, index, total))
            .collect()
    }

    fn generate_fingerprint(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8]) // First 8 bytes is plenty for log lines
    }

    /// 1-based position, as shown in progress reports
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_last(&self) -> bool {
        self.ordinal() == self.total
    }
}
