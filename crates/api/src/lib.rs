pub mod config;
pub mod error;
pub mod routes;
pub mod stream;
pub mod telemetry;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::{AppState, router};
