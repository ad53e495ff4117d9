use serde::{Deserialize, Serialize};

use crate::{DejaService, ServiceError, ServiceResult, chat_messages, embed_one, truncate_chars};
use deja_domain::{ConfidenceTier, TicketState, confidence_tier};
use deja_index::{SimilarityResult, VectorField};

const CONTEXT_BODY_CHARS: usize = 600;

const RECOMMEND_SYSTEM_PROMPT: &str = "You are a support engineer drafting resolution guidance \
                                       from previously resolved tickets. Answer with a JSON \
                                       object holding exactly these keys: \"summary\" (string), \
                                       \"resolution_steps\" (array of strings), \"references\" \
                                       (array of strings), \"root_causes\" (array of strings), \
                                       \"preventive_measures\" (array of strings). Ground every \
                                       claim in the supplied tickets and cite them by number.";

/// Structured resolution guidance produced by the completion provider.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Narrative {
	#[serde(default)]
	pub summary: String,
	#[serde(default)]
	pub resolution_steps: Vec<String>,
	#[serde(default)]
	pub references: Vec<String>,
	#[serde(default)]
	pub root_causes: Vec<String>,
	#[serde(default)]
	pub preventive_measures: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReferencedTicket {
	pub number: u64,
	pub title: String,
	pub url: String,
	pub score: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
	pub confidence: ConfidenceTier,
	pub basis_count: u64,
	pub average_similarity: f32,
	pub narrative: Narrative,
	pub referenced_tickets: Vec<ReferencedTicket>,
}

impl DejaService {
	/// Retrieves the most similar indexed tickets and asks the completion
	/// provider for guidance grounded in them. An empty retrieval produces a
	/// low-confidence answer without spending a completion call.
	pub async fn recommend(&self, query: &str) -> ServiceResult<Recommendation> {
		if query.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Query must not be empty.".to_string(),
			});
		}

		let vector = embed_one(self, query).await?;
		let hits = self
			.index
			.search(&vector, self.cfg.recommend.top_k as usize, VectorField::Intent)
			.await?;

		if hits.is_empty() {
			return Ok(Recommendation {
				confidence: ConfidenceTier::Low,
				basis_count: 0,
				average_similarity: 0.,
				narrative: Narrative {
					summary: "No similar tickets were found in the index.".to_string(),
					..Default::default()
				},
				referenced_tickets: Vec::new(),
			});
		}

		let average_similarity =
			hits.iter().map(|hit| hit.score).sum::<f32>() / hits.len() as f32;
		let confidence = confidence_tier(
			average_similarity,
			hits.len(),
			self.cfg.recommend.high_avg_threshold,
			self.cfg.recommend.medium_avg_threshold,
			self.cfg.recommend.min_basis_count as usize,
		);
		let user = recommendation_context(query, &hits);
		let messages = chat_messages(RECOMMEND_SYSTEM_PROMPT, &user);
		let raw = self
			.providers
			.completion
			.complete_json(&self.cfg.providers.completion, &messages)
			.await?;
		let narrative: Narrative =
			serde_json::from_value(raw).map_err(|err| ServiceError::Provider {
				message: format!("Completion provider returned a malformed narrative: {err}"),
			})?;

		Ok(Recommendation {
			confidence,
			basis_count: hits.len() as u64,
			average_similarity,
			narrative,
			referenced_tickets: hits
				.iter()
				.map(|hit| ReferencedTicket {
					number: hit.ticket.number,
					title: hit.ticket.title.clone(),
					url: hit.ticket.url.clone(),
					score: hit.score,
				})
				.collect(),
		})
	}
}

fn recommendation_context(query: &str, hits: &[SimilarityResult]) -> String {
	let mut context = format!("New ticket:\n{query}\n\nSimilar resolved tickets:");

	for hit in hits {
		let ticket = &hit.ticket;
		let resolution = if ticket.state == TicketState::Closed {
			hit.solution_summary.as_str()
		} else {
			"Still open."
		};

		context.push_str(&format!(
			"\n\n#{} ({:.2}): {}\nCategory: {}, support level: {}, state: {}\n{}\nResolution: {}",
			ticket.number,
			hit.score,
			ticket.title,
			ticket.category,
			ticket.support_level,
			ticket.state,
			truncate_chars(&ticket.body, CONTEXT_BODY_CHARS),
			resolution,
		));
	}

	context
}
