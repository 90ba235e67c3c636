pub mod confirmer;
pub mod config;
pub mod error;
pub mod types;

pub use confirmer::{AlwaysNo, AlwaysYes, Confirmer, Prompt};
pub use config::{AppConfig, CrawlConfig};
pub use error::{CrawlError, EngineError, ExcludedReason, IngestError, SkipReason};
pub use types::*;
