pub mod fallback;
pub mod keyword;
pub mod ranking;
pub mod vector;

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};

use scout_config::Search;

use crate::{BoxFuture, DomainResolver, Result, ResultCache, TenantStore};

const RESULT_KEY_PREFIX: &str = "results:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
	Keyword,
	Vector,
	Fallback,
}
impl SearchMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Keyword => "keyword",
			Self::Vector => "vector",
			Self::Fallback => "fallback",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFragment {
	pub content: String,
	pub url: String,
	pub title: String,
	/// Always within `[0, 1]`.
	pub similarity: f32,
	pub search_method: SearchMethod,
}

#[derive(Debug, Clone, Copy)]
pub struct StrategyRequest<'a> {
	pub tenant_id: &'a str,
	pub query: &'a str,
	pub limit: u32,
	/// Time left in the overall search budget when this strategy starts.
	pub budget: Duration,
	pub domain_hint: &'a str,
}

/// One independent way of finding content for a tenant.
///
/// `Ok(None)` means the strategy chose not to run for this request. `Ok(Some(vec![]))` means it
/// ran and found nothing. The orchestrator merges both the same way.
pub trait SearchStrategy
where
	Self: Send + Sync,
{
	fn method(&self) -> SearchMethod;

	fn search<'a>(
		&'a self,
		request: StrategyRequest<'a>,
	) -> BoxFuture<'a, Result<Option<Vec<ContentFragment>>>>;
}

pub struct SearchOrchestrator {
	cfg: Search,
	store: Arc<dyn TenantStore>,
	domains: Arc<DomainResolver>,
	/// Invoked in order; earlier strategies win similarity ties.
	strategies: Vec<Arc<dyn SearchStrategy>>,
	result_cache: Option<Arc<ResultCache>>,
}
impl SearchOrchestrator {
	pub fn new(
		cfg: Search,
		store: Arc<dyn TenantStore>,
		domains: Arc<DomainResolver>,
		strategies: Vec<Arc<dyn SearchStrategy>>,
		result_cache: Option<Arc<ResultCache>>,
	) -> Self {
		Self { cfg, store, domains, strategies, result_cache }
	}

	pub fn effective_limit(&self, requested: u32) -> u32 {
		let limit = if requested == 0 { self.cfg.default_limit } else { requested };

		limit.clamp(1, self.cfg.max_limit.max(1))
	}

	/// Ranked fragments for `query` on the tenant behind `domain`, never more than the effective
	/// limit. An unavailable store or unresolved domain yields an empty list.
	///
	/// Only non-empty results go into the result cache, so a query that found nothing is retried
	/// in full on the next call.
	pub async fn search_content(&self, query: &str, domain: &str, limit: u32) -> Vec<ContentFragment> {
		let started = Instant::now();

		if let Err(err) = self.store.check_connection().await {
			tracing::error!(domain, error = %err, "Tenant store is unavailable; returning no results.");

			return Vec::new();
		}

		let Some(tenant_id) = self.domains.resolve(domain).await else {
			tracing::info!(domain, "Domain did not resolve to a tenant; returning no results.");

			return Vec::new();
		};
		let limit = self.effective_limit(limit);
		let cache_key = self.result_cache_key(&tenant_id, query, limit);

		if let Some(cache) = self.result_cache.as_ref()
			&& let Some(cached) = cache.get(&cache_key)
		{
			tracing::debug!(tenant_id = tenant_id.as_str(), results = cached.len(), "Result cache hit.");

			return cached;
		}

		let deadline = started + Duration::from_millis(self.cfg.budget_ms);
		let pool = self.run_strategies(&tenant_id, query, domain, limit, deadline).await;
		let results = ranking::finalize(pool, limit);

		if !results.is_empty()
			&& let Some(cache) = self.result_cache.as_ref()
		{
			cache.set(cache_key, results.clone());
		}

		tracing::info!(
			tenant_id = tenant_id.as_str(),
			limit,
			results = results.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Search completed."
		);

		results
	}

	async fn run_strategies(
		&self,
		tenant_id: &str,
		query: &str,
		domain: &str,
		limit: u32,
		deadline: Instant,
	) -> Vec<ContentFragment> {
		let mut pool = Vec::new();

		for (index, strategy) in self.strategies.iter().enumerate() {
			let method = strategy.method().as_str();

			if index > 0 && pool.len() >= limit as usize {
				tracing::debug!(tenant_id, method, collected = pool.len(), "Limit met; skipping.");

				break;
			}

			let budget = deadline.saturating_duration_since(Instant::now());

			if budget.is_zero() {
				tracing::warn!(tenant_id, method, "Search budget exhausted before strategy ran.");

				break;
			}

			let request =
				StrategyRequest { tenant_id, query, limit, budget, domain_hint: domain };

			match time::timeout(budget, strategy.search(request)).await {
				Ok(Ok(Some(fragments))) => {
					tracing::debug!(tenant_id, method, found = fragments.len(), "Strategy returned.");

					ranking::absorb(&mut pool, fragments);
				},
				Ok(Ok(None)) => {
					tracing::debug!(tenant_id, method, "Strategy skipped.");
				},
				Ok(Err(err)) => {
					tracing::warn!(tenant_id, method, error = %err, "Strategy failed; continuing.");
				},
				Err(_) => {
					tracing::warn!(
						tenant_id,
						method,
						budget_ms = budget.as_millis() as u64,
						"Strategy timed out; continuing."
					);
				},
			}
		}

		pool
	}

	fn result_cache_key(&self, tenant_id: &str, query: &str, limit: u32) -> String {
		let mut hasher = blake3::Hasher::new();
		let parts: [&[u8]; 6] = [
			tenant_id.as_bytes(),
			query.as_bytes(),
			&limit.to_le_bytes(),
			&self.cfg.keyword_min_query_chars.to_le_bytes(),
			&self.cfg.vector_min_similarity.to_le_bytes(),
			&self.cfg.max_snippet_chars.to_le_bytes(),
		];

		for part in parts {
			hasher.update(&(part.len() as u64).to_le_bytes());
			hasher.update(part);
		}

		format!("{RESULT_KEY_PREFIX}{}", hasher.finalize().to_hex())
	}
}
