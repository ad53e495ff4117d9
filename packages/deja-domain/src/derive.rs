use crate::ticket::{Category, Comment, RawIssue, SupportLevel, Ticket, TicketState};

/// Comments kept from each end of a long issue thread.
pub const COMMENT_SAMPLE_EDGE: usize = 3;

const COMPLEXITY_MAX: u8 = 10;

/// Label synonyms consulted before the content scan. Earlier entries win.
const CATEGORY_LABEL_RULES: &[(Category, &[&str])] = &[
	(Category::Documentation, &["documentation"]),
	(Category::Configuration, &["config", "configuration"]),
	(Category::Operational, &["operational", "ops"]),
];

/// Content keyword sets in priority order. The first set with a hit wins, so a
/// ticket matching both documentation and configuration terms is documentation.
const CATEGORY_CONTENT_RULES: &[(Category, &[&str])] = &[
	(Category::Documentation, &["documentation", "docs", "guide", "how to", "tutorial"]),
	(Category::Configuration, &["configuration", "config", "setting", "parameter"]),
	(Category::Operational, &["operational", "operation", "incident", "outage", "down"]),
	(Category::Provisioning, &["provision", "create", "setup", "deploy"]),
];

const SUPPORT_LEVEL_SYNONYMS: &[(SupportLevel, &[&str])] = &[
	(SupportLevel::L1, &["l1", "level-1", "first-level"]),
	(SupportLevel::L2, &["l2", "level-2", "second-level"]),
	(SupportLevel::L3, &["l3", "level-3", "third-level"]),
];

/// Normalizes a raw issue into the canonical ticket. Pure and deterministic;
/// identical input always yields identical derived fields.
pub fn derive(raw: &RawIssue) -> Ticket {
	let support_level = support_level(&raw.labels);
	let category = category(&raw.title, &raw.body, &raw.labels);
	let complexity = complexity(raw, support_level);
	let keywords = keywords(category, support_level, &raw.labels, raw.state);

	Ticket {
		number: raw.number,
		title: raw.title.clone(),
		body: raw.body.clone(),
		labels: raw.labels.clone(),
		state: raw.state,
		created_at: raw.created_at,
		closed_at: raw.closed_at,
		comment_count: raw.comments.len() as u32,
		comment_excerpts: sample_comments(&raw.comments),
		url: raw.url.clone(),
		category,
		support_level,
		complexity,
		keywords,
	}
}

pub fn category(title: &str, body: &str, labels: &[String]) -> Category {
	for label in labels {
		let label = label.to_lowercase();

		for (category, synonyms) in CATEGORY_LABEL_RULES {
			if synonyms.iter().any(|synonym| label.contains(synonym)) {
				return *category;
			}
		}
	}

	let text = format!("{title} {body}").to_lowercase();

	for (category, keywords) in CATEGORY_CONTENT_RULES {
		if keywords.iter().any(|keyword| text.contains(keyword)) {
			return *category;
		}
	}

	Category::General
}

pub fn support_level(labels: &[String]) -> SupportLevel {
	for label in labels {
		let label = label.to_lowercase();

		for (level, synonyms) in SUPPORT_LEVEL_SYNONYMS {
			if synonyms.iter().any(|synonym| label.contains(synonym)) {
				return *level;
			}
		}
	}

	SupportLevel::Unspecified
}

fn complexity(raw: &RawIssue, support_level: SupportLevel) -> u8 {
	let mut score: u8 = 1;

	// Character count, not byte length: multibyte text must not jump a bracket.
	score += match raw.body.chars().count() {
		len if len > 2_000 => 3,
		len if len > 1_000 => 2,
		len if len > 500 => 1,
		_ => 0,
	};
	score += match raw.comments.len() {
		count if count > 20 => 3,
		count if count > 10 => 2,
		count if count > 5 => 1,
		_ => 0,
	};
	score += match support_level {
		SupportLevel::L3 => 2,
		SupportLevel::L2 => 1,
		_ => 0,
	};

	if raw.state == TicketState::Closed
		&& let Some(closed_at) = raw.closed_at
	{
		score += match (closed_at - raw.created_at).whole_days() {
			days if days > 30 => 2,
			days if days > 14 => 1,
			_ => 0,
		};
	}

	score.min(COMPLEXITY_MAX)
}

fn keywords(
	category: Category,
	support_level: SupportLevel,
	labels: &[String],
	state: TicketState,
) -> Vec<String> {
	let mut keywords = vec![category.as_str().to_string()];

	if support_level != SupportLevel::Unspecified {
		keywords.push(support_level.as_str().to_lowercase());
	}

	for label in labels {
		let label = label.to_lowercase();

		if !keywords.contains(&label) {
			keywords.push(label);
		}
	}

	let state = state.as_str().to_string();

	if !keywords.contains(&state) {
		keywords.push(state);
	}

	keywords
}

fn sample_comments(comments: &[Comment]) -> Vec<Comment> {
	if comments.len() <= 2 * COMMENT_SAMPLE_EDGE {
		return comments.to_vec();
	}

	let mut sample = comments[..COMMENT_SAMPLE_EDGE].to_vec();

	sample.extend_from_slice(&comments[comments.len() - COMMENT_SAMPLE_EDGE..]);

	sample
}
