pub mod llm;
pub mod parser;
pub mod prompt;
pub mod schema;

pub use llm::{ChatClient, ChatMessage, LlmConfig};
pub use parser::UNKNOWN_NODE_TYPE;
pub use schema::{GraphFragment, GraphNode, GraphRelationship};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Turns one unit of text into a graph fragment.
///
/// Implementations make a single external call and either return the whole
/// fragment or fail; there are no partial results.
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<GraphFragment>;
}

/// Extraction backed by an OpenAI-compatible chat model
pub struct LlmGraphExtractor {
    client: ChatClient,
    max_json_repairs: usize,
}

impl LlmGraphExtractor {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: ChatClient::new(config)?,
            max_json_repairs: 1,
        })
    }
}

#[async_trait]
impl GraphExtractor for LlmGraphExtractor {
    async fn extract(&self, text: &str) -> Result<GraphFragment> {
        let user_prompt = prompt::build_extraction_prompt(text);

        let json_str = self.client
            .complete_json(prompt::SYSTEM_PROMPT, &user_prompt, self.max_json_repairs)
            .await
            .context("Failed to extract graph from text")?;

        let fragment = parser::parse_fragment(&json_str)?;

        info!(
            model = self.client.model(),
            input_chars = text.chars().count(),
            nodes = fragment.nodes.len(),
            relationships = fragment.relationships.len(),
            "Extracted graph fragment"
        );

        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_extract_parses_model_output() {
        let server = MockServer::start().await;
        let content = r#"{"nodes": [{"id": "Alan Turing", "type": "Person"}, {"id": "Bletchley Park", "type": "Location"}],
                          "relationships": [{"source": "Alan Turing", "target": "Bletchley Park", "type": "WORKED_AT"}]}"#;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
            .mount(&server)
            .await;

        let extractor = LlmGraphExtractor::new(&LlmConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        })
        .unwrap();

        let fragment = extractor.extract("Alan Turing worked at Bletchley Park.").await.unwrap();

        assert_eq!(fragment.nodes.len(), 2);
        assert_eq!(
            fragment.relationships,
            vec![GraphRelationship::new("Alan Turing", "Bletchley Park", "WORKED_AT")]
        );
    }

    #[tokio::test]
    async fn test_extract_repairs_invalid_json_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"nodes\": [")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"nodes\": [{\"id\": \"A\", \"type\": \"Concept\"}]}")))
            .mount(&server)
            .await;

        let extractor = LlmGraphExtractor::new(&LlmConfig {
            base_url: server.uri(),
            ..LlmConfig::default()
        })
        .unwrap();

        let fragment = extractor.extract("A").await.unwrap();

        assert_eq!(fragment.nodes, vec![GraphNode::new("A", "Concept")]);
        assert!(fragment.relationships.is_empty());
    }
}
