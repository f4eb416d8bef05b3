pub mod chunk;
pub mod chunker;
pub mod error;
pub mod reader;

pub use chunk::TextChunk;
pub use chunker::{Chunker, ChunkerConfig, estimate_tokens};
pub use error::IngestError;
pub use reader::{FileFormat, FileReader};
