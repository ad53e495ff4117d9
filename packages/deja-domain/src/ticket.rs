use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A raw issue record as exported by the issue tracker. Input to [`crate::derive`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawIssue {
	pub number: u64,
	pub title: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub labels: Vec<String>,
	pub state: TicketState,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub closed_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub comments: Vec<Comment>,
	#[serde(default)]
	pub url: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Comment {
	#[serde(default)]
	pub author: String,
	pub body: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

/// The canonical normalized ticket. Derived fields are pure functions of the
/// base attributes and are recomputed on every re-index.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ticket {
	pub number: u64,
	pub title: String,
	pub body: String,
	pub labels: Vec<String>,
	pub state: TicketState,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub closed_at: Option<OffsetDateTime>,
	pub comment_count: u32,
	/// Bounded sample of the issue thread: first three and last three comments
	/// when more than six exist, so both problem framing and resolution survive.
	pub comment_excerpts: Vec<Comment>,
	pub url: String,
	pub category: Category,
	pub support_level: SupportLevel,
	pub complexity: u8,
	pub keywords: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
	Open,
	Closed,
}
impl TicketState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Open => "open",
			Self::Closed => "closed",
		}
	}

	pub fn parse(text: &str) -> Option<Self> {
		match text {
			"open" => Some(Self::Open),
			"closed" => Some(Self::Closed),
			_ => None,
		}
	}
}
impl std::fmt::Display for TicketState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Documentation,
	Configuration,
	Operational,
	Provisioning,
	General,
}
impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Documentation => "documentation",
			Self::Configuration => "configuration",
			Self::Operational => "operational",
			Self::Provisioning => "provisioning",
			Self::General => "general",
		}
	}

	pub fn parse(text: &str) -> Option<Self> {
		match text {
			"documentation" => Some(Self::Documentation),
			"configuration" => Some(Self::Configuration),
			"operational" => Some(Self::Operational),
			"provisioning" => Some(Self::Provisioning),
			"general" => Some(Self::General),
			_ => None,
		}
	}
}
impl std::fmt::Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SupportLevel {
	L1,
	L2,
	L3,
	#[serde(rename = "unspecified")]
	Unspecified,
}
impl SupportLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::L1 => "L1",
			Self::L2 => "L2",
			Self::L3 => "L3",
			Self::Unspecified => "unspecified",
		}
	}

	pub fn parse(text: &str) -> Option<Self> {
		match text {
			"L1" => Some(Self::L1),
			"L2" => Some(Self::L2),
			"L3" => Some(Self::L3),
			"unspecified" => Some(Self::Unspecified),
			_ => None,
		}
	}
}
impl std::fmt::Display for SupportLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
