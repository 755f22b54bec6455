pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CatalogConfig, UpstreamConfig};
pub use error::{CatalogError, Result};
pub use models::*;
