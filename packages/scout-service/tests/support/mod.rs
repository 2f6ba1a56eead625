#![allow(dead_code)]

use std::{
	collections::VecDeque,
	io,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use parking_lot::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use scout_config::{EmbeddingProviderConfig, Search};
use scout_service::{
	BoxFuture, CommerceProvider, ContentFragment, ContentIndex, EmbeddingProvider, Error, Platform,
	ProductSummary, ProviderDetector, Result, SearchMethod, SearchStrategy, Sleeper,
	StrategyRequest, TenantStore, VectorIndex,
};
use scout_storage::models::{ContentHit, ContentPage, Tenant, TenantIntegration};

const SAMPLE_CONFIG: &str = include_str!("../../../scout-config/tests/fixtures/sample_config.toml");

pub fn config() -> scout_config::Config {
	scout_config::parse(SAMPLE_CONFIG).expect("Sample config must parse.")
}

pub fn search_cfg() -> Search {
	Search {
		default_limit: 5,
		max_limit: 20,
		keyword_min_query_chars: 3,
		budget_ms: 1_500,
		vector_min_similarity: 0.2,
		max_snippet_chars: 600,
	}
}

pub fn tenant(tenant_id: &str, domain: &str, active: bool) -> Tenant {
	Tenant { tenant_id: tenant_id.to_string(), domain: domain.to_string(), active }
}

pub fn page(tenant_id: &str, url: &str, title: &str, content: &str) -> ContentPage {
	ContentPage {
		page_id: Uuid::new_v4(),
		tenant_id: tenant_id.to_string(),
		url: url.to_string(),
		title: title.to_string(),
		content: content.to_string(),
		updated_at: OffsetDateTime::UNIX_EPOCH,
	}
}

pub fn integration(tenant_id: &str, domain: &str) -> TenantIntegration {
	TenantIntegration {
		tenant_id: tenant_id.to_string(),
		domain: domain.to_string(),
		shopify_shop: None,
		shopify_access_token_sealed: None,
		woocommerce_url: None,
		woocommerce_consumer_key_sealed: None,
		woocommerce_consumer_secret_sealed: None,
		updated_at: OffsetDateTime::UNIX_EPOCH,
	}
}

pub fn fragment(url: &str, similarity: f32, method: SearchMethod) -> ContentFragment {
	ContentFragment {
		content: format!("content of {url}"),
		url: url.to_string(),
		title: url.to_string(),
		similarity,
		search_method: method,
	}
}

#[derive(Clone)]
pub enum IntegrationReply {
	Found(TenantIntegration),
	Missing,
	Fail,
}

/// Tenant rows, integration replies, and content pages held in memory.
///
/// Fuzzy matching mirrors the SQL: case-insensitive containment in either direction against the
/// stored domain without its `www.` prefix.
pub struct FakeStore {
	pub tenants: Mutex<Vec<Tenant>>,
	pub pages: Mutex<Vec<ContentPage>>,
	/// Replayed in order; the last reply repeats once the queue runs dry. A found row only answers
	/// reads for its own tenant id.
	pub integration_replies: Mutex<VecDeque<IntegrationReply>>,
	pub integration_requests: Mutex<Vec<String>>,
	pub available: AtomicBool,
	pub fail_lookups: AtomicBool,
	pub lookup_delay: Mutex<Option<Duration>>,
	pub connection_checks: AtomicUsize,
	pub fuzzy_lookups: AtomicUsize,
	pub integration_reads: AtomicUsize,
	pub keyword_queries: AtomicUsize,
	pub fallback_queries: AtomicUsize,
}
impl FakeStore {
	pub fn new() -> Self {
		Self {
			tenants: Mutex::new(Vec::new()),
			pages: Mutex::new(Vec::new()),
			integration_replies: Mutex::new(VecDeque::new()),
			integration_requests: Mutex::new(Vec::new()),
			available: AtomicBool::new(true),
			fail_lookups: AtomicBool::new(false),
			lookup_delay: Mutex::new(None),
			connection_checks: AtomicUsize::new(0),
			fuzzy_lookups: AtomicUsize::new(0),
			integration_reads: AtomicUsize::new(0),
			keyword_queries: AtomicUsize::new(0),
			fallback_queries: AtomicUsize::new(0),
		}
	}

	pub fn with_tenants(tenants: Vec<Tenant>) -> Arc<Self> {
		let store = Self::new();

		*store.tenants.lock() = tenants;

		Arc::new(store)
	}

	pub fn set_integration_replies(&self, replies: Vec<IntegrationReply>) {
		*self.integration_replies.lock() = replies.into();
	}

	pub fn fuzzy_lookups(&self) -> usize {
		self.fuzzy_lookups.load(Ordering::SeqCst)
	}

	pub fn integration_reads(&self) -> usize {
		self.integration_reads.load(Ordering::SeqCst)
	}

	pub fn integration_requests(&self) -> Vec<String> {
		self.integration_requests.lock().clone()
	}

	fn fuzzy_match(&self, domain: &str) -> Option<Tenant> {
		let needle = domain.to_lowercase();

		if needle.is_empty() {
			return None;
		}

		let tenants = self.tenants.lock();
		let mut matches: Vec<&Tenant> = tenants
			.iter()
			.filter(|tenant| tenant.active)
			.filter(|tenant| {
				let stored = tenant.domain.to_lowercase();
				let stored = stored.strip_prefix("www.").unwrap_or(&stored).to_string();

				!stored.is_empty() && (stored.contains(&needle) || needle.contains(&stored))
			})
			.collect();

		matches.sort_by_key(|tenant| (tenant.domain.len(), tenant.tenant_id.clone()));

		matches.first().map(|tenant| (*tenant).clone())
	}

	fn matching_pages(
		&self,
		tenant_id: &str,
		terms: &[String],
		limit: u32,
		haystack: impl Fn(&ContentPage) -> String,
	) -> Vec<ContentPage> {
		self.pages
			.lock()
			.iter()
			.filter(|page| page.tenant_id == tenant_id)
			.filter(|page| {
				let text = haystack(page).to_lowercase();

				terms.iter().any(|term| text.contains(term.as_str()))
			})
			.take(limit as usize)
			.cloned()
			.collect()
	}

	fn unavailable() -> Error {
		Error::Unavailable { message: "connection refused".to_string() }
	}
}

impl TenantStore for FakeStore {
	fn check_connection(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.connection_checks.fetch_add(1, Ordering::SeqCst);

			if self.available.load(Ordering::SeqCst) { Ok(()) } else { Err(Self::unavailable()) }
		})
	}

	fn find_active_tenant_fuzzy<'a>(
		&'a self,
		domain: &'a str,
	) -> BoxFuture<'a, Result<Option<Tenant>>> {
		Box::pin(async move {
			self.fuzzy_lookups.fetch_add(1, Ordering::SeqCst);

			let delay = *self.lookup_delay.lock();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail_lookups.load(Ordering::SeqCst) {
				return Err(Error::Storage { message: "query failed".to_string() });
			}

			Ok(self.fuzzy_match(domain))
		})
	}

	fn load_integration<'a>(
		&'a self,
		tenant_id: &'a str,
	) -> BoxFuture<'a, Result<Option<TenantIntegration>>> {
		Box::pin(async move {
			self.integration_reads.fetch_add(1, Ordering::SeqCst);
			self.integration_requests.lock().push(tenant_id.to_string());

			let reply = {
				let mut replies = self.integration_replies.lock();

				if replies.len() > 1 { replies.pop_front() } else { replies.front().cloned() }
			};

			match reply.unwrap_or(IntegrationReply::Missing) {
				IntegrationReply::Found(integration) =>
					Ok((integration.tenant_id == tenant_id).then_some(integration)),
				IntegrationReply::Missing => Ok(None),
				IntegrationReply::Fail =>
					Err(Error::Storage { message: "integration read failed".to_string() }),
			}
		})
	}
}

impl ContentIndex for FakeStore {
	fn keyword_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>> {
		Box::pin(async move {
			self.keyword_queries.fetch_add(1, Ordering::SeqCst);

			Ok(self.matching_pages(tenant_id, terms, limit, |page| {
				format!("{} {}", page.title, page.content)
			}))
		})
	}

	fn fallback_candidates<'a>(
		&'a self,
		tenant_id: &'a str,
		terms: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ContentPage>>> {
		Box::pin(async move {
			self.fallback_queries.fetch_add(1, Ordering::SeqCst);

			if terms.is_empty() {
				return Ok(self
					.pages
					.lock()
					.iter()
					.filter(|page| page.tenant_id == tenant_id)
					.take(limit as usize)
					.cloned()
					.collect());
			}

			Ok(self.matching_pages(tenant_id, terms, limit, |page| {
				format!("{} {}", page.title, page.url)
			}))
		})
	}
}

/// Returns one fixed vector, optionally after a delay, and records every call.
pub struct FakeEmbedding {
	pub vector: Vec<f32>,
	pub delay: Option<Duration>,
	pub calls: AtomicUsize,
}
impl FakeEmbedding {
	pub fn new(dimensions: usize) -> Arc<Self> {
		Arc::new(Self { vector: vec![0.5; dimensions], delay: None, calls: AtomicUsize::new(0) })
	}

	pub fn slow(dimensions: usize, delay: Duration) -> Arc<Self> {
		Arc::new(Self {
			vector: vec![0.5; dimensions],
			delay: Some(delay),
			calls: AtomicUsize::new(0),
		})
	}
}

impl EmbeddingProvider for FakeEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			Ok(texts.iter().map(|_| self.vector.clone()).collect())
		})
	}
}

pub struct FakeVectors {
	pub hits: Vec<ContentHit>,
	pub calls: AtomicUsize,
}
impl FakeVectors {
	pub fn new(hits: Vec<ContentHit>) -> Arc<Self> {
		Arc::new(Self { hits, calls: AtomicUsize::new(0) })
	}
}

impl VectorIndex for FakeVectors {
	fn nearest<'a>(
		&'a self,
		_tenant_id: &'a str,
		_vector: &'a [f32],
		limit: u32,
		min_score: f32,
	) -> BoxFuture<'a, Result<Vec<ContentHit>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(self
				.hits
				.iter()
				.filter(|hit| hit.score >= min_score)
				.take(limit as usize)
				.cloned()
				.collect())
		})
	}
}

pub enum StrategyReply {
	Found(Vec<ContentFragment>),
	Skipped,
	Fail,
	/// Sleeps before answering with the fragments.
	Slow(Duration, Vec<ContentFragment>),
}

pub struct FakeStrategy {
	pub method: SearchMethod,
	pub reply: StrategyReply,
	pub calls: AtomicUsize,
}
impl FakeStrategy {
	pub fn new(method: SearchMethod, reply: StrategyReply) -> Arc<Self> {
		Arc::new(Self { method, reply, calls: AtomicUsize::new(0) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl SearchStrategy for FakeStrategy {
	fn method(&self) -> SearchMethod {
		self.method
	}

	fn search<'a>(
		&'a self,
		_request: StrategyRequest<'a>,
	) -> BoxFuture<'a, Result<Option<Vec<ContentFragment>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			match &self.reply {
				StrategyReply::Found(fragments) => Ok(Some(fragments.clone())),
				StrategyReply::Skipped => Ok(None),
				StrategyReply::Fail => Err(Error::Provider { message: "boom".to_string() }),
				StrategyReply::Slow(delay, fragments) => {
					tokio::time::sleep(*delay).await;

					Ok(Some(fragments.clone()))
				},
			}
		})
	}
}

pub struct FakeProvider {
	pub platform: Platform,
	pub tenant_id: String,
}

impl CommerceProvider for FakeProvider {
	fn platform(&self) -> Platform {
		self.platform
	}

	fn tenant_id(&self) -> &str {
		&self.tenant_id
	}

	fn store_url(&self) -> &str {
		"https://shop.example.com"
	}

	fn search_products<'a>(
		&'a self,
		_query: &'a str,
		_limit: u32,
	) -> BoxFuture<'a, scout_providers::Result<Vec<ProductSummary>>> {
		Box::pin(async { Ok(Vec::new()) })
	}
}

pub enum DetectorReply {
	Provider,
	Nothing,
	Fail,
}

pub struct FakeDetector {
	pub platform: Platform,
	pub reply: DetectorReply,
	pub calls: AtomicUsize,
}
impl FakeDetector {
	pub fn new(platform: Platform, reply: DetectorReply) -> Arc<Self> {
		Arc::new(Self { platform, reply, calls: AtomicUsize::new(0) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl ProviderDetector for FakeDetector {
	fn platform(&self) -> Platform {
		self.platform
	}

	fn detect<'a>(
		&'a self,
		integration: &'a TenantIntegration,
	) -> BoxFuture<'a, Result<Option<Arc<dyn CommerceProvider>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			match self.reply {
				DetectorReply::Provider => Ok(Some(Arc::new(FakeProvider {
					platform: self.platform,
					tenant_id: integration.tenant_id.clone(),
				}) as Arc<dyn CommerceProvider>)),
				DetectorReply::Nothing => Ok(None),
				DetectorReply::Fail =>
					Err(Error::Provider { message: "detector network error".to_string() }),
			}
		})
	}
}

/// Records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
	pub slept: Mutex<Vec<Duration>>,
}
impl RecordingSleeper {
	pub fn slept(&self) -> Vec<Duration> {
		self.slept.lock().clone()
	}
}

impl Sleeper for RecordingSleeper {
	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
		self.slept.lock().push(duration);

		Box::pin(async {})
	}
}

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);
impl LogBuffer {
	pub fn lines(&self) -> Vec<String> {
		String::from_utf8_lossy(&self.0.lock()).lines().map(str::to_string).collect()
	}
}

impl io::Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().extend_from_slice(buf);

		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

/// Routes this thread's events into a buffer until the guard drops. Only meaningful on the
/// current-thread runtime that `#[tokio::test]` uses by default.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
	let buffer = LogBuffer::default();
	let writer = buffer.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_ansi(false)
		.with_max_level(tracing::Level::DEBUG)
		.with_writer(move || writer.clone())
		.finish();

	(tracing::subscriber::set_default(subscriber), buffer)
}
