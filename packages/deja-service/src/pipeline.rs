use std::sync::atomic::{AtomicBool, Ordering};

use futures::{StreamExt, stream};
use serde::Serialize;

use crate::{DejaService, ServiceResult, chat_messages, truncate_chars};
use deja_domain::{RawIssue, Ticket, TicketState, derive};
use deja_index::{IndexEntry, ItemFailure};

/// Solution sentinel for tickets that never reached a resolution. Emitted
/// without a completion call.
pub const OPEN_SOLUTION: &str = "Issue is still open.";
pub const NO_COMMENTS_SOLUTION: &str = "Issue closed without resolution comments.";

const SUMMARY_BODY_CHARS: usize = 2_000;
const SUMMARY_COMMENT_CHARS: usize = 500;

const INTENT_SYSTEM_PROMPT: &str = "You summarize support tickets. Reply with one sentence \
                                    describing what the reporter needs, nothing else.";
const SOLUTION_SYSTEM_PROMPT: &str = "You summarize how support tickets were resolved. Reply with \
                                      one or two sentences describing the fix that closed the \
                                      ticket, nothing else.";

#[derive(Clone, Debug, Default, Serialize)]
pub struct IndexReport {
	pub indexed: u64,
	pub skipped: u64,
	pub failed: Vec<ItemFailure>,
	pub cancelled: bool,
}

enum Prepared {
	Ready(Box<IndexEntry>),
	Skipped { number: u64 },
	Failed { number: u64, message: String },
}

impl DejaService {
	/// Derives, summarizes, embeds, and upserts the given issues. Summaries and
	/// embeddings run with bounded concurrency; a raised `cancel` flag stops
	/// new work and the already-prepared entries are still persisted.
	pub async fn index_tickets(
		&self,
		issues: Vec<RawIssue>,
		cancel: &AtomicBool,
	) -> ServiceResult<IndexReport> {
		let mut report = IndexReport::default();
		let total = issues.len();
		let outcomes: Vec<Prepared> = stream::iter(issues)
			.take_while(|_| {
				let keep_going = !cancel.load(Ordering::Relaxed);

				async move { keep_going }
			})
			.map(|issue| self.prepare_entry(issue))
			.buffer_unordered(self.cfg.indexing.embed_concurrency.max(1) as usize)
			.collect()
			.await;
		let mut entries = Vec::with_capacity(outcomes.len());

		report.cancelled = outcomes.len() < total;
		// Items never scheduled because of cancellation count as skipped.
		report.skipped += (total - outcomes.len()) as u64;

		for outcome in outcomes {
			match outcome {
				Prepared::Ready(entry) => entries.push(*entry),
				Prepared::Skipped { number } => {
					tracing::warn!(number, "Skipping ticket with no usable text.");

					report.skipped += 1;
				},
				Prepared::Failed { number, message } => {
					tracing::warn!(number, error = %message, "Failed to prepare ticket.");

					report.failed.push(ItemFailure { number, message });
				},
			}
		}

		self.ensure_index_ready().await?;

		for batch in entries.chunks(self.cfg.indexing.upsert_batch_size.max(1) as usize) {
			let batch_report = self.index.upsert_batch(batch.to_vec()).await?;

			report.indexed += batch_report.upserted;
			report.failed.extend(batch_report.failed);
		}

		tracing::info!(
			indexed = report.indexed,
			skipped = report.skipped,
			failed = report.failed.len(),
			cancelled = report.cancelled,
			"Indexing run finished."
		);

		Ok(report)
	}

	pub async fn ensure_index_ready(&self) -> ServiceResult<()> {
		Ok(self.index.ensure_ready().await?)
	}

	async fn prepare_entry(&self, issue: RawIssue) -> Prepared {
		let number = issue.number;
		let ticket = derive::derive(&issue);

		if ticket.title.trim().is_empty() && ticket.body.trim().is_empty() {
			return Prepared::Skipped { number };
		}

		let intent_summary = self.intent_summary(&ticket).await;
		let solution_summary = self.solution_summary(&ticket).await;
		let content = content_text(&ticket);
		let texts = vec![intent_summary.clone(), content];
		let embed_result =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await;
		let mut vectors = match embed_result {
			Ok(vectors) => vectors.into_iter(),
			Err(err) => return Prepared::Failed { number, message: err.to_string() },
		};
		let (Some(intent_vector), Some(content_vector)) = (vectors.next(), vectors.next()) else {
			return Prepared::Failed {
				number,
				message: "Embedding provider returned too few vectors.".to_string(),
			};
		};

		Prepared::Ready(Box::new(IndexEntry {
			ticket,
			intent_summary,
			solution_summary,
			intent_vector: Some(intent_vector),
			content_vector: Some(content_vector),
		}))
	}

	/// One-sentence summary of what the reporter asked for. Falls back to the
	/// title when the completion provider is unavailable so an indexing run
	/// never stalls on summarization.
	async fn intent_summary(&self, ticket: &Ticket) -> String {
		let user = format!(
			"Title: {}\n\nBody:\n{}",
			ticket.title,
			truncate_chars(&ticket.body, SUMMARY_BODY_CHARS),
		);
		let messages = chat_messages(INTENT_SYSTEM_PROMPT, &user);

		match self.providers.completion.complete(&self.cfg.providers.completion, &messages).await {
			Ok(summary) if !summary.trim().is_empty() => summary,
			Ok(_) => fallback_intent(ticket),
			Err(err) => {
				tracing::warn!(number = ticket.number, error = %err, "Intent summary fell back to the title.");

				fallback_intent(ticket)
			},
		}
	}

	/// How the ticket was resolved. Open tickets and closed tickets without
	/// comments get fixed sentinels without a provider call; a provider
	/// failure degrades to the trailing comment instead of failing the item.
	async fn solution_summary(&self, ticket: &Ticket) -> String {
		if ticket.state == TicketState::Open {
			return OPEN_SOLUTION.to_string();
		}
		if ticket.comment_excerpts.is_empty() {
			return NO_COMMENTS_SOLUTION.to_string();
		}

		let comments = ticket
			.comment_excerpts
			.iter()
			.map(|comment| {
				format!("{}: {}", comment.author, truncate_chars(&comment.body, SUMMARY_COMMENT_CHARS))
			})
			.collect::<Vec<_>>()
			.join("\n");
		let user = format!("Title: {}\n\nClosing comments:\n{comments}", ticket.title);
		let messages = chat_messages(SOLUTION_SYSTEM_PROMPT, &user);

		match self.providers.completion.complete(&self.cfg.providers.completion, &messages).await {
			Ok(summary) if !summary.trim().is_empty() => summary,
			Ok(_) => NO_COMMENTS_SOLUTION.to_string(),
			Err(err) => {
				tracing::warn!(number = ticket.number, error = %err, "Solution summary fell back to the trailing comment.");

				fallback_solution(ticket)
			},
		}
	}
}

fn fallback_intent(ticket: &Ticket) -> String {
	format!("Issue about: {}", ticket.title)
}

fn fallback_solution(ticket: &Ticket) -> String {
	match ticket.comment_excerpts.last() {
		Some(comment) => truncate_chars(&comment.body, SUMMARY_COMMENT_CHARS),
		None => NO_COMMENTS_SOLUTION.to_string(),
	}
}

/// Text embedded as the content vector. Carries the derived classification
/// alongside the raw text so wording and triage signals both contribute.
fn content_text(ticket: &Ticket) -> String {
	let mut text = format!(
		"Title: {}\nBody: {}\nLabels: {}\nCategory: {}\nSupport level: {}",
		ticket.title,
		truncate_chars(&ticket.body, SUMMARY_BODY_CHARS),
		ticket.labels.join(", "),
		ticket.category,
		ticket.support_level,
	);

	if ticket.state == TicketState::Closed && !ticket.comment_excerpts.is_empty() {
		text.push_str("\nResolution comments:");

		for comment in &ticket.comment_excerpts {
			text.push('\n');
			text.push_str(&truncate_chars(&comment.body, SUMMARY_COMMENT_CHARS));
		}
	}

	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use time::macros::datetime;

	fn ticket() -> Ticket {
		let issue = RawIssue {
			number: 1,
			title: "Cluster unreachable".to_string(),
			body: "kubectl times out.".to_string(),
			labels: vec![],
			state: TicketState::Closed,
			created_at: datetime!(2024-01-01 00:00:00 UTC),
			closed_at: Some(datetime!(2024-01-02 00:00:00 UTC)),
			comments: vec![],
			url: String::new(),
		};

		derive::derive(&issue)
	}

	#[test]
	fn content_text_omits_resolution_section_without_comments() {
		let text = content_text(&ticket());

		assert!(text.starts_with("Title: Cluster unreachable"));
		assert!(!text.contains("Resolution comments:"));
	}

	#[test]
	fn truncation_keeps_short_text_intact() {
		assert_eq!(truncate_chars("short", 10), "short");
		assert_eq!(truncate_chars("abcdef", 3), "abc…");
	}
}
