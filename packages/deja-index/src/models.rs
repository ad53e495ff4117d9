use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use deja_domain::Ticket;

/// One indexed ticket: the canonical record, its AI-derived summaries, and the
/// embedding vectors the backend searches over.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IndexEntry {
	pub ticket: Ticket,
	pub intent_summary: String,
	pub solution_summary: String,
	#[serde(default)]
	pub intent_vector: Option<Vec<f32>>,
	#[serde(default)]
	pub content_vector: Option<Vec<f32>>,
}
impl IndexEntry {
	pub fn vector(&self, field: VectorField) -> Option<&[f32]> {
		match field {
			VectorField::Intent => self.intent_vector.as_deref(),
			VectorField::Content => self.content_vector.as_deref(),
		}
	}
}

/// Which stored embedding a query runs against. Intent is the default: it is
/// derived from a summary of what the reporter asked for, so it matches on
/// user need rather than incidental wording.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorField {
	#[default]
	Intent,
	Content,
}
impl VectorField {
	pub fn vector_name(self) -> &'static str {
		match self {
			Self::Intent => "intent",
			Self::Content => "content",
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimilarityResult {
	pub ticket: Ticket,
	pub intent_summary: String,
	pub solution_summary: String,
	pub score: f32,
	/// 1-based position in the result list.
	pub rank: usize,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IndexStats {
	pub total_tickets: u64,
	pub by_state: BTreeMap<String, u64>,
	pub by_category: BTreeMap<String, u64>,
	pub by_support_level: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BatchReport {
	pub upserted: u64,
	pub failed: Vec<ItemFailure>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ItemFailure {
	pub number: u64,
	pub message: String,
}
