use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub index: Index,
	pub storage: Option<Storage>,
	pub providers: Providers,
	#[serde(default)]
	pub indexing: Indexing,
	#[serde(default)]
	pub recommend: Recommend,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
	Local,
	Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Index {
	pub backend: IndexBackend,
	/// Snapshot file for the local backend. Ignored when the backend is qdrant.
	pub snapshot_path: Option<std::path::PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub completion: CompletionProviderConfig,
}

#[derive(Debug, Deserialize)]
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

#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Indexing {
	#[serde(default = "default_embed_concurrency")]
	pub embed_concurrency: u32,
	#[serde(default = "default_upsert_batch_size")]
	pub upsert_batch_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct Recommend {
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_high_avg_threshold")]
	pub high_avg_threshold: f32,
	#[serde(default = "default_medium_avg_threshold")]
	pub medium_avg_threshold: f32,
	#[serde(default = "default_min_basis_count")]
	pub min_basis_count: u32,
}

impl Default for Indexing {
	fn default() -> Self {
		Self {
			embed_concurrency: default_embed_concurrency(),
			upsert_batch_size: default_upsert_batch_size(),
		}
	}
}

impl Default for Recommend {
	fn default() -> Self {
		Self {
			top_k: default_top_k(),
			high_avg_threshold: default_high_avg_threshold(),
			medium_avg_threshold: default_medium_avg_threshold(),
			min_basis_count: default_min_basis_count(),
		}
	}
}

fn default_embed_concurrency() -> u32 {
	4
}

fn default_upsert_batch_size() -> u32 {
	100
}

fn default_top_k() -> u32 {
	5
}

fn default_high_avg_threshold() -> f32 {
	0.85
}

fn default_medium_avg_threshold() -> f32 {
	0.65
}

fn default_min_basis_count() -> u32 {
	3
}
