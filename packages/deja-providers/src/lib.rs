pub mod completion;
pub mod embedding;

mod error;
pub use error::{Error, Result};

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Retry budget shared by every provider call. Exhausting it surfaces the last
/// error to the caller; nothing retries indefinitely.
pub const MAX_ATTEMPTS: u32 = 3;

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn backoff_for_attempt(attempt: u32) -> Duration {
	let exp = attempt.saturating_sub(1).min(6);
	let millis = BASE_BACKOFF_MS.saturating_mul(1 << exp).min(MAX_BACKOFF_MS);

	Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backoff_doubles_and_caps() {
		assert_eq!(backoff_for_attempt(1), Duration::from_millis(500));
		assert_eq!(backoff_for_attempt(2), Duration::from_millis(1_000));
		assert_eq!(backoff_for_attempt(3), Duration::from_millis(2_000));
		assert_eq!(backoff_for_attempt(100), Duration::from_millis(30_000));
	}
}
