pub mod wikipedia;

pub use wikipedia::{SearchConfig, SearchError, WikipediaClient};
