use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
	Low,
	Medium,
	High,
}
impl ConfidenceTier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "LOW",
			Self::Medium => "MEDIUM",
			Self::High => "HIGH",
		}
	}
}
impl std::fmt::Display for ConfidenceTier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Maps retrieval statistics to a confidence tier. Monotonic in `avg`: raising
/// the average similarity while holding the basis count fixed never lowers the
/// tier.
pub fn confidence_tier(
	avg: f32,
	basis_count: usize,
	high_avg: f32,
	medium_avg: f32,
	min_basis_count: usize,
) -> ConfidenceTier {
	if avg >= high_avg && basis_count >= min_basis_count {
		ConfidenceTier::High
	} else if avg >= medium_avg {
		ConfidenceTier::Medium
	} else {
		ConfidenceTier::Low
	}
}
