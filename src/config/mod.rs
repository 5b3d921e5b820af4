pub mod schema;

pub use schema::{AgentConfig, CatalogConfig, Config};
