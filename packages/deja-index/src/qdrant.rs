use std::collections::HashMap;

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
		PayloadIncludeSelector, PointStruct, Query, QueryPointsBuilder, ScrollPointsBuilder,
		UpsertPointsBuilder, Value, Vector, VectorParamsBuilder, VectorsConfigBuilder,
		value::Kind, with_payload_selector::SelectorOptions,
	},
};
use serde_json::Value as JsonValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
	BatchReport, BoxFuture, Error, IndexEntry, IndexStats, ItemFailure, Result, SimilarityResult,
	TicketIndex, VectorField,
};
use deja_domain::{Category, SupportLevel, Ticket, TicketState};

/// Bounded scan for stats. Collections beyond this report approximate counts,
/// matching the managed backend's intended scale trade-off.
const STATS_SCAN_LIMIT: u32 = 1_000;

/// Managed vector-store index. Retrieval delegates to the backend's HNSW
/// approximate-nearest-neighbor search, so rankings may diverge from
/// brute-force order on large corpora.
pub struct QdrantIndex {
	client: Qdrant,
	collection: String,
	dimensions: u32,
	batch_size: usize,
}
impl QdrantIndex {
	pub fn new(cfg: &deja_config::Qdrant, dimensions: u32, batch_size: usize) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), dimensions, batch_size: batch_size.max(1) })
	}

	async fn create_collection(&self) -> Result<()> {
		let mut vectors_config = VectorsConfigBuilder::default();

		for field in [VectorField::Intent, VectorField::Content] {
			vectors_config.add_named_vector_params(
				field.vector_name(),
				VectorParamsBuilder::new(self.dimensions.into(), Distance::Cosine),
			);
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config),
			)
			.await?;

		for (field, field_type) in [
			("state", FieldType::Keyword),
			("category", FieldType::Keyword),
			("support_level", FieldType::Keyword),
			("complexity", FieldType::Integer),
			("title", FieldType::Text),
			("body", FieldType::Text),
		] {
			self.client
				.create_field_index(CreateFieldIndexCollectionBuilder::new(
					self.collection.clone(),
					field,
					field_type,
				))
				.await?;
		}

		tracing::info!(collection = %self.collection, "Created ticket collection.");

		Ok(())
	}

	fn build_point(&self, entry: &IndexEntry) -> Result<PointStruct> {
		let ticket = &entry.ticket;
		let mut payload = Payload::new();

		payload.insert("number", JsonValue::from(ticket.number));
		payload.insert("title", ticket.title.clone());
		payload.insert("body", ticket.body.clone());
		payload.insert("labels", JsonValue::from(ticket.labels.clone()));
		payload.insert("state", ticket.state.as_str());
		payload.insert("category", ticket.category.as_str());
		payload.insert("support_level", ticket.support_level.as_str());
		payload.insert("complexity", JsonValue::from(ticket.complexity));
		payload.insert("comment_count", JsonValue::from(ticket.comment_count));
		payload.insert("keywords", JsonValue::from(ticket.keywords.clone()));
		payload.insert("url", ticket.url.clone());
		payload.insert("created_at", format_timestamp(ticket.created_at)?);
		payload.insert(
			"closed_at",
			match ticket.closed_at {
				Some(ts) => JsonValue::String(format_timestamp(ts)?),
				None => JsonValue::Null,
			},
		);
		payload.insert("intent_summary", entry.intent_summary.clone());
		payload.insert("solution_summary", entry.solution_summary.clone());

		let mut vectors = HashMap::new();

		for field in [VectorField::Intent, VectorField::Content] {
			if let Some(vector) = entry.vector(field) {
				vectors.insert(field.vector_name().to_string(), Vector::from(vector.to_vec()));
			}
		}

		Ok(PointStruct::new(ticket.number, vectors, payload))
	}
}
impl TicketIndex for QdrantIndex {
	fn ensure_ready<'a>(&'a self) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.client.collection_exists(self.collection.clone()).await? {
				return Ok(());
			}

			self.create_collection().await
		})
	}

	fn upsert<'a>(&'a self, entry: IndexEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			crate::validate_entry(&entry, self.dimensions)?;

			let point = self.build_point(&entry)?;

			self.client
				.upsert_points(
					UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
				)
				.await?;

			Ok(())
		})
	}

	fn upsert_batch<'a>(&'a self, entries: Vec<IndexEntry>) -> BoxFuture<'a, Result<BatchReport>> {
		Box::pin(async move {
			let mut report = BatchReport::default();
			let mut points: Vec<(u64, PointStruct)> = Vec::with_capacity(entries.len());

			for entry in &entries {
				let prepared = crate::validate_entry(entry, self.dimensions)
					.and_then(|()| self.build_point(entry));

				match prepared {
					Ok(point) => points.push((entry.ticket.number, point)),
					Err(err) => {
						tracing::warn!(
							number = entry.ticket.number,
							error = %err,
							"Skipping invalid index entry."
						);
						report.failed.push(ItemFailure {
							number: entry.ticket.number,
							message: err.to_string(),
						});
					},
				}
			}

			// Fixed-size batches bound the request payload; a failed request
			// is reported against each ticket it carried, never the whole run.
			for chunk in points.chunks(self.batch_size) {
				let batch: Vec<PointStruct> = chunk.iter().map(|(_, point)| point.clone()).collect();
				let result = self
					.client
					.upsert_points(
						UpsertPointsBuilder::new(self.collection.clone(), batch).wait(true),
					)
					.await;

				match result {
					Ok(_) => report.upserted += chunk.len() as u64,
					Err(err) => {
						tracing::error!(error = %err, batch_len = chunk.len(), "Upsert batch failed.");

						let message = err.to_string();

						for (number, _) in chunk {
							report.failed.push(ItemFailure { number: *number, message: message.clone() });
						}
					},
				}
			}

			Ok(report)
		})
	}

	fn search<'a>(
		&'a self,
		query: &'a [f32],
		top_k: usize,
		field: VectorField,
	) -> BoxFuture<'a, Result<Vec<SimilarityResult>>> {
		Box::pin(async move {
			crate::validate_vector_dim(query, self.dimensions)?;

			let response = self
				.client
				.query(
					QueryPointsBuilder::new(self.collection.clone())
						.query(Query::new_nearest(query.to_vec()))
						.using(field.vector_name())
						.with_payload(true)
						.limit(top_k as u64),
				)
				.await?;
			let mut results = Vec::with_capacity(response.result.len());

			for point in response.result {
				let Some(ticket) = ticket_from_payload(&point.payload) else {
					tracing::warn!("Skipping search hit with malformed payload.");

					continue;
				};

				results.push(SimilarityResult {
					ticket,
					intent_summary: payload_str(&point.payload, "intent_summary")
						.unwrap_or_default(),
					solution_summary: payload_str(&point.payload, "solution_summary")
						.unwrap_or_default(),
					score: point.score,
					rank: results.len() + 1,
				});
			}

			Ok(results)
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, Result<IndexStats>> {
		Box::pin(async move {
			let selector = SelectorOptions::Include(PayloadIncludeSelector {
				fields: vec![
					"state".to_string(),
					"category".to_string(),
					"support_level".to_string(),
				],
			});
			let response = self
				.client
				.scroll(
					ScrollPointsBuilder::new(self.collection.clone())
						.limit(STATS_SCAN_LIMIT)
						.with_payload(selector),
				)
				.await?;
			let mut stats = IndexStats::default();

			for point in response.result {
				stats.total_tickets += 1;

				for (key, counts) in [
					("state", &mut stats.by_state),
					("category", &mut stats.by_category),
					("support_level", &mut stats.by_support_level),
				] {
					if let Some(value) = payload_str(&point.payload, key) {
						*counts.entry(value).or_default() += 1;
					}
				}
			}

			Ok(stats)
		})
	}
}

fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
	ts.format(&Rfc3339)
		.map_err(|_| Error::Validation { message: "Failed to format timestamp.".to_string() })
}

fn ticket_from_payload(payload: &HashMap<String, Value>) -> Option<Ticket> {
	let created_at = payload_timestamp(payload, "created_at")?;

	Some(Ticket {
		number: payload_u64(payload, "number")?,
		title: payload_str(payload, "title")?,
		body: payload_str(payload, "body").unwrap_or_default(),
		labels: payload_str_list(payload, "labels").unwrap_or_default(),
		state: TicketState::parse(&payload_str(payload, "state")?)?,
		created_at,
		closed_at: payload_timestamp(payload, "closed_at"),
		comment_count: payload_u64(payload, "comment_count").unwrap_or_default() as u32,
		// The search index does not store the issue thread.
		comment_excerpts: Vec::new(),
		url: payload_str(payload, "url").unwrap_or_default(),
		category: Category::parse(&payload_str(payload, "category")?)?,
		support_level: SupportLevel::parse(&payload_str(payload, "support_level")?)?,
		complexity: payload_u64(payload, "complexity").unwrap_or(1) as u8,
		keywords: payload_str_list(payload, "keywords").unwrap_or_default(),
	})
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_u64(payload: &HashMap<String, Value>, key: &str) -> Option<u64> {
	match &payload.get(key)?.kind {
		Some(Kind::IntegerValue(value)) if *value >= 0 => Some(*value as u64),
		_ => None,
	}
}

fn payload_str_list(payload: &HashMap<String, Value>, key: &str) -> Option<Vec<String>> {
	match &payload.get(key)?.kind {
		Some(Kind::ListValue(list)) => Some(
			list.values
				.iter()
				.filter_map(|value| match &value.kind {
					Some(Kind::StringValue(text)) => Some(text.clone()),
					_ => None,
				})
				.collect(),
		),
		_ => None,
	}
}

fn payload_timestamp(payload: &HashMap<String, Value>, key: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(&payload_str(payload, key)?, &Rfc3339).ok()
}
