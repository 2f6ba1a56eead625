use serde::Deserialize;
use serde_json::{Map, Value};

pub const DETECTOR_SHOPIFY: &str = "shopify";
pub const DETECTOR_WOOCOMMERCE: &str = "woocommerce";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub cache: Cache,
	pub search: Search,
	pub commerce: Commerce,
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// How long a caller waits for a pooled connection before the store is reported unavailable.
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub tenants: CacheTier,
	pub results: ToggleCacheTier,
	pub providers: ToggleCacheTier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheTier {
	pub capacity: usize,
	/// Zero disables expiry; entries then age out through LRU eviction only.
	pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleCacheTier {
	pub enabled: bool,
	pub capacity: usize,
	pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	pub keyword_min_query_chars: usize,
	/// Overall wall-clock budget for one `search_content` call.
	pub budget_ms: u64,
	pub vector_min_similarity: f32,
	#[serde(default = "default_max_snippet_chars")]
	pub max_snippet_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commerce {
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_base_backoff_ms")]
	pub base_backoff_ms: u64,
	/// Detector names in priority order.
	pub detectors: Vec<String>,
	pub request_timeout_ms: u64,
	#[serde(default = "default_shopify_api_version")]
	pub shopify_api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	/// Base64-encoded 32-byte key used to open sealed integration credentials.
	pub credentials_key: String,
}

fn default_acquire_timeout_ms() -> u64 {
	2_000
}

fn default_max_snippet_chars() -> usize {
	600
}

fn default_max_attempts() -> u32 {
	3
}

fn default_base_backoff_ms() -> u64 {
	100
}

fn default_shopify_api_version() -> String {
	"2024-10".to_string()
}
