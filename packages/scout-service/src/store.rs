//! Production bindings of the service traits onto Postgres, Qdrant, and the embedding API.

use scout_config::EmbeddingProviderConfig;
use scout_storage::{
	db::Db,
	models::{ContentHit, ContentPage, Tenant, TenantIntegration},
	qdrant::QdrantStore,
	queries,
};

use crate::{BoxFuture, ContentIndex, EmbeddingProvider, Result, TenantStore, VectorIndex};

impl TenantStore for Db {
	fn check_connection(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(Db::check_connection(self).await?) })
	}

	fn find_active_tenant_fuzzy<'a>(
		&'a self,
		domain: &'a str,
	) -> BoxFuture<'a, Result<Option<Tenant>>> {
		Box::pin(async move { Ok(queries::find_active_tenant_fuzzy(self, domain).await?) })
	}

	fn load_integration<'a>(
		&'a self,
		tenant_id: &'a str,
	) -> BoxFuture<'a, Result<Option<TenantIntegration>>> {
		Box::pin(async move { Ok(queries::load_integration(self, tenant_id).await?) })
	}
}

impl ContentIndex for Db {
	fn keyword_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>> {
		Box::pin(async move { Ok(queries::keyword_candidates(self, tenant_id, terms, limit).await?) })
	}

	fn fallback_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>> {
		Box::pin(
			async move { Ok(queries::fallback_candidates(self, tenant_id, terms, limit).await?) },
		)
	}
}

impl VectorIndex for QdrantStore {
	fn nearest<'a>(
		&'a self,
		tenant_id: &'a str,
		vector: &'a [f32],
		limit: u32,
		min_score: f32,
	) -> BoxFuture<'a, Result<Vec<ContentHit>>> {
		Box::pin(
			async move { Ok(self.search_content(tenant_id, vector, limit, min_score).await?) },
		)
	}
}

/// Embeddings over the configured OpenAI-compatible HTTP endpoint.
pub struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(scout_providers::embedding::embed(cfg, texts).await?) })
	}
}
