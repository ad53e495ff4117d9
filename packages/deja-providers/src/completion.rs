use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, MAX_ATTEMPTS, Result};
use deja_config::CompletionProviderConfig;

/// Chat completion returning the assistant message as plain text.
pub async fn complete(cfg: &CompletionProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		if attempt > 1 {
			tokio::time::sleep(crate::backoff_for_attempt(attempt - 1)).await;
		}

		match request_completion(&client, &url, cfg, messages).await {
			Ok(json) => match parse_completion_text(json) {
				Ok(text) => return Ok(text),
				Err(err) => last_err = Some(err),
			},
			Err(err) => {
				tracing::warn!(provider = %cfg.provider_id, error = %err, attempt, "Completion request failed.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Completion request failed without a reported error.".to_string(),
	}))
}

/// Chat completion whose assistant message must itself be a JSON object. Used
/// for structured narratives; a reply that is not valid JSON consumes a retry
/// attempt like any transport failure.
pub async fn complete_json(cfg: &CompletionProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		if attempt > 1 {
			tokio::time::sleep(crate::backoff_for_attempt(attempt - 1)).await;
		}

		match request_completion(&client, &url, cfg, messages).await {
			Ok(json) => match parse_completion_json(json) {
				Ok(parsed) => return Ok(parsed),
				Err(err) => {
					tracing::warn!(provider = %cfg.provider_id, error = %err, attempt, "Completion reply is not valid JSON.");

					last_err = Some(err);
				},
			},
			Err(err) => {
				tracing::warn!(provider = %cfg.provider_id, error = %err, attempt, "Completion request failed.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Completion request failed without a reported error.".to_string(),
	}))
}

async fn request_completion(
	client: &Client,
	url: &str,
	cfg: &CompletionProviderConfig,
	messages: &[Value],
) -> Result<Value> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	Ok(res.error_for_status()?.json().await?)
}

fn parse_completion_text(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|content| content.trim().to_string())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})
}

fn parse_completion_json(json: Value) -> Result<Value> {
	let content = parse_completion_text(json)?;
	let parsed: Value = serde_json::from_str(&content).map_err(|_| Error::InvalidResponse {
		message: "Completion content is not valid JSON.".to_string(),
	})?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Completion content is not a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_text() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "  Increase the node pool size.  " } }
			]
		});
		let text = parse_completion_text(json).expect("parse failed");

		assert_eq!(text, "Increase the node pool size.");
	}

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"summary\": \"scaling issue\"}" } }
			]
		});
		let parsed = parse_completion_json(json).expect("parse failed");

		assert_eq!(parsed.get("summary").and_then(|v| v.as_str()), Some("scaling issue"));
	}

	#[test]
	fn rejects_non_object_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "[1, 2, 3]" } }
			]
		});

		assert!(parse_completion_json(json).is_err());
	}
}
