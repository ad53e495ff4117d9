pub mod pipeline;
pub mod recommend;
pub mod search;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use deja_config::{CompletionProviderConfig, Config, EmbeddingProviderConfig};
use deja_index::TicketIndex;
use deja_providers::{completion, embedding};
pub use pipeline::IndexReport;
pub use recommend::{Narrative, Recommendation, ReferencedTicket};
pub use search::{SearchRequest, SearchResponse};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, deja_providers::Result<Vec<Vec<f32>>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, deja_providers::Result<String>>;

	fn complete_json<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, deja_providers::Result<Value>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Provider { message: String },
	Index { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}

pub struct DejaService {
	pub cfg: Config,
	pub index: Arc<dyn TicketIndex>,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Index { message } => write!(f, "Index error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<deja_providers::Error> for ServiceError {
	fn from(err: deja_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<deja_index::Error> for ServiceError {
	fn from(err: deja_index::Error) -> Self {
		Self::Index { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, deja_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, deja_providers::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}

	fn complete_json<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, deja_providers::Result<Value>> {
		Box::pin(completion::complete_json(cfg, messages))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, completion: Arc<dyn CompletionProvider>) -> Self {
		Self { embedding, completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

impl DejaService {
	pub fn new(cfg: Config, index: Arc<dyn TicketIndex>) -> Self {
		Self { cfg, index, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn TicketIndex>, providers: Providers) -> Self {
		Self { cfg, index, providers }
	}

	pub async fn stats(&self) -> ServiceResult<deja_index::IndexStats> {
		Ok(self.index.stats().await?)
	}
}

pub(crate) async fn embed_one(
	service: &DejaService,
	text: &str,
) -> ServiceResult<Vec<f32>> {
	let embeddings = service
		.providers
		.embedding
		.embed(&service.cfg.providers.embedding, &[text.to_string()])
		.await?;

	embeddings.into_iter().next().ok_or_else(|| ServiceError::Provider {
		message: "Embedding provider returned no vectors.".to_string(),
	})
}

pub(crate) fn chat_messages(system: &str, user: &str) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	let mut out: String = text.chars().take(max_chars).collect();

	out.push('…');

	out
}
