use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub database: DatabaseConfig,
    pub crawl: CrawlConfig,
    pub llm: LlmConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Fixed per-page fetch timeout in seconds.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub postgres_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    /// Initial batch size `B` for the BFS engine.
    #[serde(default = "default_batch_size")]
    pub initial_batch_size: usize,
    /// Retry patience before a domain is permanently excluded.
    #[serde(default = "default_patience")]
    pub retry_patience: u32,
    /// Hard cap on pending internal links.
    #[serde(default = "default_queue_cap")]
    pub max_queue_size: usize,
    /// Timeout-ratio threshold that triggers `TooManyCrawlingTimeouts`.
    #[serde(default = "default_timeout_ratio")]
    pub timeout_ratio_threshold: f64,
}

fn default_page_timeout_secs() -> u64 {
    5
}
fn default_batch_size() -> usize {
    25
}
fn default_patience() -> u32 {
    3
}
fn default_queue_cap() -> usize {
    1000
}
fn default_timeout_ratio() -> f64 {
    0.20
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Name of the env var holding the provider API key (read at startup, not stored).
    pub api_key_env: String,
    #[serde(default = "default_classify_model")]
    pub classify_model: String,
    #[serde(default = "default_parse_model")]
    pub parse_model: String,
}

fn default_classify_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}
fn default_parse_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_bind")]
    pub bind_addr: String,
}

fn default_api_bind() -> String {
    "0.0.0.0:8080".to_string()
}
