use std::sync::Arc;

use tokio::time;

use scout_config::{EmbeddingProviderConfig, Search};

use crate::{
	BoxFuture, EmbeddingProvider, Error, Result, VectorIndex,
	search::{ContentFragment, SearchMethod, SearchStrategy, StrategyRequest, ranking},
};

/// Embeds the query and ranks indexed pages by cosine similarity.
pub struct VectorSearch {
	embedding: Arc<dyn EmbeddingProvider>,
	embedding_cfg: EmbeddingProviderConfig,
	index: Arc<dyn VectorIndex>,
	min_similarity: f32,
	max_snippet_chars: usize,
}
impl VectorSearch {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		embedding_cfg: EmbeddingProviderConfig,
		index: Arc<dyn VectorIndex>,
		cfg: &Search,
	) -> Self {
		Self {
			embedding,
			embedding_cfg,
			index,
			min_similarity: cfg.vector_min_similarity,
			max_snippet_chars: cfg.max_snippet_chars,
		}
	}

	async fn run(&self, request: StrategyRequest<'_>) -> Result<Option<Vec<ContentFragment>>> {
		if request.query.trim().is_empty() {
			return Ok(None);
		}

		match time::timeout(request.budget, self.embed_and_query(request)).await {
			Ok(result) => result.map(Some),
			Err(_) => {
				tracing::warn!(
					tenant_id = request.tenant_id,
					budget_ms = request.budget.as_millis() as u64,
					"Vector search exceeded its budget."
				);

				Ok(Some(Vec::new()))
			},
		}
	}

	async fn embed_and_query(&self, request: StrategyRequest<'_>) -> Result<Vec<ContentFragment>> {
		let texts = [request.query.trim().to_string()];
		let vector = self
			.embedding
			.embed(&self.embedding_cfg, &texts)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			})?;

		if vector.len() != self.embedding_cfg.dimensions as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions; expected {}.",
					vector.len(),
					self.embedding_cfg.dimensions
				),
			});
		}

		let hits =
			self.index.nearest(request.tenant_id, &vector, request.limit, self.min_similarity).await?;

		Ok(hits
			.into_iter()
			.map(|hit| ContentFragment {
				content: ranking::snippet(&hit.content, self.max_snippet_chars),
				url: hit.url,
				title: hit.title,
				similarity: ranking::clamp_similarity(hit.score),
				search_method: SearchMethod::Vector,
			})
			.collect())
	}
}

impl SearchStrategy for VectorSearch {
	fn method(&self) -> SearchMethod {
		SearchMethod::Vector
	}

	fn search<'a>(
		&'a self,
		request: StrategyRequest<'a>,
	) -> BoxFuture<'a, Result<Option<Vec<ContentFragment>>>> {
		Box::pin(self.run(request))
	}
}
