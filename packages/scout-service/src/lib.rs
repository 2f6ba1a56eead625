pub mod cache;
pub mod commerce;
pub mod domain;
pub mod search;
pub mod store;

mod error;

pub use cache::{CacheStats, ResolutionCache};
pub use commerce::{
	CommerceProviderResolver, ProviderDetector, ProviderResolution, ResolutionAttempt, RetryPolicy,
	Sleeper, TokioSleeper,
	detectors::{ShopifyDetector, WooCommerceDetector, build_detectors},
};
pub use domain::{DomainResolution, DomainResolver, ResolutionMethod};
pub use error::{Error, Result};
pub use scout_providers::commerce::{CommerceProvider, Platform, ProductSummary};
pub use search::{
	ContentFragment, SearchMethod, SearchOrchestrator, SearchStrategy, StrategyRequest,
	fallback::FallbackSearch, keyword::KeywordSearch, vector::VectorSearch,
};

use std::{future::Future, pin::Pin, sync::Arc};

use scout_config::{Config, EmbeddingProviderConfig};
use scout_storage::{
	db::Db,
	models::{ContentHit, ContentPage, Tenant, TenantIntegration},
	qdrant::QdrantStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type TenantCache = ResolutionCache<String>;
pub type ResultCache = ResolutionCache<Vec<ContentFragment>>;
pub type ProviderCache = ResolutionCache<Arc<dyn CommerceProvider>>;

/// Relational tenant-configuration store.
///
/// A missing row is `Ok(None)`. A connection that cannot be established is
/// [`Error::Unavailable`]; any other failure is a storage error.
pub trait TenantStore
where
	Self: Send + Sync,
{
	fn check_connection(&self) -> BoxFuture<'_, Result<()>>;

	fn find_active_tenant_fuzzy<'a>(
		&'a self,
		domain: &'a str,
	) -> BoxFuture<'a, Result<Option<Tenant>>>;

	fn load_integration<'a>(
		&'a self,
		tenant_id: &'a str,
	) -> BoxFuture<'a, Result<Option<TenantIntegration>>>;
}

/// Lexical access to a tenant's indexed pages.
pub trait ContentIndex
where
	Self: Send + Sync,
{
	fn keyword_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>>;

	fn fallback_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn nearest<'a>(
		&'a self,
		tenant_id: &'a str,
		vector: &'a [f32],
		limit: u32,
		min_score: f32,
	) -> BoxFuture<'a, Result<Vec<ContentHit>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Everything the pipeline talks to outside this process.
pub struct Backends {
	pub tenants: Arc<dyn TenantStore>,
	pub content: Arc<dyn ContentIndex>,
	pub vectors: Arc<dyn VectorIndex>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub detectors: Vec<Arc<dyn ProviderDetector>>,
	pub sleeper: Arc<dyn Sleeper>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStatsReport {
	pub tenants: CacheStats,
	pub results: Option<CacheStats>,
	pub providers: Option<CacheStats>,
}

pub struct ScoutService {
	pub cfg: Config,
	pub tenant_cache: Arc<TenantCache>,
	pub result_cache: Option<Arc<ResultCache>>,
	pub provider_cache: Option<Arc<ProviderCache>>,
	pub domains: Arc<DomainResolver>,
	pub search: SearchOrchestrator,
	pub commerce: CommerceProviderResolver,
}
impl ScoutService {
	/// Wires the Postgres, Qdrant, and HTTP backends described by `cfg`. No network I/O happens
	/// here; an unreachable store is reported per call.
	pub fn connect(cfg: Config) -> Result<Self> {
		let db = Arc::new(Db::connect(&cfg.storage.postgres)?);
		let qdrant = Arc::new(QdrantStore::new(&cfg.storage.qdrant)?);
		let key = scout_providers::credentials::decode_key(&cfg.security.credentials_key)?;
		let detectors = build_detectors(&cfg.commerce, key);
		let backends = Backends {
			tenants: db.clone(),
			content: db,
			vectors: qdrant,
			embedding: Arc::new(store::DefaultProviders),
			detectors,
			sleeper: Arc::new(TokioSleeper),
		};

		Ok(Self::new(cfg, backends))
	}

	pub fn new(cfg: Config, backends: Backends) -> Self {
		let tenant_cache = Arc::new(TenantCache::with_ttl_seconds(
			cfg.cache.tenants.capacity,
			cfg.cache.tenants.ttl_seconds,
		));
		let result_cache = cfg.cache.results.enabled.then(|| {
			Arc::new(ResultCache::with_ttl_seconds(
				cfg.cache.results.capacity,
				cfg.cache.results.ttl_seconds,
			))
		});
		let provider_cache = cfg.cache.providers.enabled.then(|| {
			Arc::new(ProviderCache::with_ttl_seconds(
				cfg.cache.providers.capacity,
				cfg.cache.providers.ttl_seconds,
			))
		});
		let domains = Arc::new(DomainResolver::new(tenant_cache.clone(), backends.tenants.clone()));
		let strategies: Vec<Arc<dyn SearchStrategy>> = vec![
			Arc::new(KeywordSearch::new(backends.content.clone(), &cfg.search)),
			Arc::new(VectorSearch::new(
				backends.embedding,
				cfg.providers.embedding.clone(),
				backends.vectors,
				&cfg.search,
			)),
			Arc::new(FallbackSearch::new(backends.content, &cfg.search)),
		];
		let search = SearchOrchestrator::new(
			cfg.search.clone(),
			backends.tenants.clone(),
			domains.clone(),
			strategies,
			result_cache.clone(),
		);
		let mut commerce = CommerceProviderResolver::new(
			domains.clone(),
			backends.tenants,
			backends.detectors,
			RetryPolicy::from_config(&cfg.commerce),
			backends.sleeper,
		);

		if let Some(cache) = provider_cache.as_ref() {
			commerce = commerce.with_provider_cache(cache.clone());
		}

		Self { cfg, tenant_cache, result_cache, provider_cache, domains, search, commerce }
	}

	pub async fn search_content(
		&self,
		query: &str,
		domain: &str,
		limit: u32,
	) -> Vec<ContentFragment> {
		self.search.search_content(query, domain, limit).await
	}

	pub async fn resolve_provider(&self, domain: &str) -> Option<Arc<dyn CommerceProvider>> {
		self.commerce.resolve_provider(domain).await
	}

	pub async fn resolve_domain(&self, domain: &str) -> Option<String> {
		self.domains.resolve(domain).await
	}

	pub fn invalidate_provider(&self, tenant_id: &str) -> bool {
		self.commerce.invalidate_provider(tenant_id)
	}

	pub fn cache_stats(&self) -> CacheStatsReport {
		CacheStatsReport {
			tenants: self.tenant_cache.stats(),
			results: self.result_cache.as_ref().map(|cache| cache.stats()),
			providers: self.provider_cache.as_ref().map(|cache| cache.stats()),
		}
	}
}
