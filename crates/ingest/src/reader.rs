use tracing::info;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Txt,
}

impl FileFormat {
    pub fn from_extension(extension: &str) -> Result<Self, IngestError> {
        let normalized = extension.trim().trim_start_matches('.').to_lowercase();

        match normalized.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            _ => Err(IngestError::UnsupportedFormat(normalized)),
        }
    }

    /// Derive the format from a file name such as `paper.PDF`
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");
        Self::from_extension(extension)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }
}

pub struct FileReader;

impl FileReader {
    /// Decode raw uploaded bytes into plain text
    pub fn decode(bytes: &[u8], format: FileFormat) -> Result<String, IngestError> {
        let text = match format {
            FileFormat::Txt => String::from_utf8(bytes.to_vec()).map_err(|e| IngestError::Decode {
                format: format.as_str(),
                reason: e.to_string(),
            })?,
            FileFormat::Pdf => {
                pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Decode {
                    format: format.as_str(),
                    reason: e.to_string(),
                })?
            }
        };

        if text.trim().is_empty() {
            return Err(IngestError::EmptyDocument);
        }

        info!(
            format = format.as_str(),
            bytes = bytes.len(),
            chars = text.chars().count(),
            "Decoded uploaded file"
        );
        Ok(text)
    }

    pub fn decode_named(bytes: &[u8], filename: &str) -> Result<String, IngestError> {
        let format = FileFormat::from_filename(filename)?;
        Self::decode(bytes, format)
    }
}
