pub const SYSTEM_PROMPT: &str = r#"You are a top-tier algorithm designed for extracting information in structured formats to build a knowledge graph.

INSTRUCTIONS:
1. Identify entities (nodes) mentioned in the text: people, organizations, locations, concepts, events, works, technologies
2. Identify directed relationships between those entities
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
{
  "nodes": [
    {"id": "Marie Curie", "type": "Person"}
  ],
  "relationships": [
    {"source": "Marie Curie", "target": "University of Paris", "type": "WORKED_AT"}
  ]
}

RULES:
- A node id is the most complete human-readable name of the entity, never an integer or a placeholder
- Always use the same id for the same entity
- Node types are basic labels in PascalCase, such as Person, Organization, Location, Concept
- Relationship types are general and timeless, in UPPER_SNAKE_CASE, such as WORKS_AT or PART_OF
- Every relationship source and target must also appear in "nodes"
- Output ONLY the JSON object, no markdown, no explanations"#;

pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"Extract the knowledge graph from the following text.

TEXT:
{}

JSON OUTPUT:"#,
        text
    )
}

pub fn build_repair_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
