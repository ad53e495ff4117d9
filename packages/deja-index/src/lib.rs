pub mod local;
pub mod qdrant;

mod error;
mod models;

pub use error::{Error, Result};
pub use local::LocalIndex;
pub use models::{BatchReport, IndexEntry, IndexStats, ItemFailure, SimilarityResult, VectorField};
pub use qdrant::QdrantIndex;

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The embedding index. The local and qdrant variants are interchangeable
/// from the caller's perspective: the same method contracts and the same
/// descending-score ordering for retrieval. The backend is selected once at
/// process start from configuration.
pub trait TicketIndex
where
	Self: Send + Sync,
{
	/// Idempotent initialization. Creates backend structures when absent.
	fn ensure_ready<'a>(&'a self) -> BoxFuture<'a, Result<()>>;

	/// Inserts or replaces the entry for its ticket id. Re-upserting the same
	/// id never duplicates.
	fn upsert<'a>(&'a self, entry: IndexEntry) -> BoxFuture<'a, Result<()>>;

	/// Upserts a batch with per-item failure reporting. One bad entry never
	/// aborts the rest. `Err` is reserved for whole-batch failures such as a
	/// snapshot that cannot be persisted.
	fn upsert_batch<'a>(&'a self, entries: Vec<IndexEntry>) -> BoxFuture<'a, Result<BatchReport>>;

	/// Top-k nearest tickets to the query vector over the selected field,
	/// ordered by descending score.
	fn search<'a>(
		&'a self,
		query: &'a [f32],
		top_k: usize,
		field: VectorField,
	) -> BoxFuture<'a, Result<Vec<SimilarityResult>>>;

	fn stats<'a>(&'a self) -> BoxFuture<'a, Result<IndexStats>>;
}

fn validate_vector_dim(vector: &[f32], dimensions: u32) -> Result<()> {
	if vector.len() != dimensions as usize {
		return Err(Error::Validation {
			message: format!(
				"Vector has {} dimensions instead of the configured {dimensions}.",
				vector.len()
			),
		});
	}

	Ok(())
}

fn validate_entry(entry: &IndexEntry, dimensions: u32) -> Result<()> {
	if entry.ticket.title.trim().is_empty() && entry.ticket.body.trim().is_empty() {
		return Err(Error::Validation {
			message: format!("Ticket {} has no title or body.", entry.ticket.number),
		});
	}
	if entry.intent_vector.is_none() && entry.content_vector.is_none() {
		return Err(Error::Validation {
			message: format!("Ticket {} carries no embedding vector.", entry.ticket.number),
		});
	}

	for vector in [entry.intent_vector.as_deref(), entry.content_vector.as_deref()]
		.into_iter()
		.flatten()
	{
		validate_vector_dim(vector, dimensions)?;
	}

	Ok(())
}
