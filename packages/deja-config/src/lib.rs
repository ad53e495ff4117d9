mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CompletionProviderConfig, Config, EmbeddingProviderConfig, Index, IndexBackend, Indexing,
	Providers, Qdrant, Recommend, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	match cfg.index.backend {
		IndexBackend::Local => {
			if cfg.index.snapshot_path.is_none() {
				return Err(Error::Validation {
					message: "index.snapshot_path must be set for the local backend.".to_string(),
				});
			}
		},
		IndexBackend::Qdrant => {
			let Some(storage) = cfg.storage.as_ref() else {
				return Err(Error::Validation {
					message: "storage.qdrant must be set for the qdrant backend.".to_string(),
				});
			};

			if storage.qdrant.url.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.qdrant.url must be non-empty.".to_string(),
				});
			}
			if storage.qdrant.collection.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.qdrant.collection must be non-empty.".to_string(),
				});
			}
		},
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("completion", &cfg.providers.completion.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, timeout_ms) in [
		("providers.embedding", cfg.providers.embedding.timeout_ms),
		("providers.completion", cfg.providers.completion.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.indexing.embed_concurrency == 0 {
		return Err(Error::Validation {
			message: "indexing.embed_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.upsert_batch_size == 0 {
		return Err(Error::Validation {
			message: "indexing.upsert_batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.top_k == 0 {
		return Err(Error::Validation {
			message: "recommend.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.recommend.min_basis_count == 0 {
		return Err(Error::Validation {
			message: "recommend.min_basis_count must be greater than zero.".to_string(),
		});
	}

	for (label, threshold) in [
		("recommend.high_avg_threshold", cfg.recommend.high_avg_threshold),
		("recommend.medium_avg_threshold", cfg.recommend.medium_avg_threshold),
	] {
		if !threshold.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&threshold) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.recommend.high_avg_threshold < cfg.recommend.medium_avg_threshold {
		return Err(Error::Validation {
			message: "recommend.high_avg_threshold must not be below recommend.medium_avg_threshold."
				.to_string(),
		});
	}

	Ok(())
}
