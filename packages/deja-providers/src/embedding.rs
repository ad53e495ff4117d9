use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, MAX_ATTEMPTS, Result};
use deja_config::EmbeddingProviderConfig;

/// Requests one embedding per input text. Vectors come back in input order
/// regardless of the order the provider reports them in.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		if attempt > 1 {
			tokio::time::sleep(crate::backoff_for_attempt(attempt - 1)).await;
		}

		match request_embeddings(&client, &url, cfg, texts).await {
			Ok(vectors) => return Ok(vectors),
			Err(err) => {
				tracing::warn!(provider = %cfg.provider_id, error = %err, attempt, "Embedding request failed.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Embedding request failed without a reported error.".to_string(),
	}))
}

async fn request_embeddings(
	client: &Client,
	url: &str,
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json, texts.len(), cfg.dimensions)
}

fn parse_embedding_response(
	json: Value,
	expected_count: usize,
	dimensions: u32,
) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	if data.len() != expected_count {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response has {} vectors for {expected_count} inputs.",
				data.len()
			),
		});
	}

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;

		if embedding.len() != dimensions as usize {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding has {} dimensions instead of the configured {dimensions}.",
					embedding.len()
				),
			});
		}

		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json, 2, 2).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_wrong_dimensionality() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [1.0, 2.0, 3.0] }
			]
		});
		let err = parse_embedding_response(json, 1, 2).expect_err("Expected dimension error.");

		assert!(err.to_string().contains("3 dimensions"), "Unexpected error: {err}");
	}

	#[test]
	fn rejects_missing_vectors() {
		let json = serde_json::json!({ "data": [] });

		assert!(parse_embedding_response(json, 1, 2).is_err());
	}
}
