use serde::Serialize;

use crate::{DejaService, ServiceError, ServiceResult, embed_one};
use deja_index::{SimilarityResult, VectorField};

#[derive(Clone, Debug)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<u32>,
	pub field: VectorField,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub results: Vec<SimilarityResult>,
}

impl DejaService {
	pub async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse> {
		if request.query.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Query must not be empty.".to_string(),
			});
		}

		let top_k = request.top_k.unwrap_or(self.cfg.recommend.top_k) as usize;
		let vector = embed_one(self, &request.query).await?;
		let results = self.index.search(&vector, top_k, request.field).await?;

		Ok(SearchResponse { results })
	}
}
