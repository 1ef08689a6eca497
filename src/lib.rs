pub mod config;
pub mod data_models;
pub mod error;
pub mod extractor;
pub mod relay;
pub mod retrieval;

pub use data_models::{SearchRequest, SearchResult};
pub use error::SearchError;
