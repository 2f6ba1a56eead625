//! Commerce backend resolution with bounded retry.
//!
//! Each attempt resolves the domain to its tenant through the shared domain resolver, reads that
//! tenant's integration row once, and runs the detectors in priority order. The first detector
//! that builds a client wins. When no detector does, or the domain does not resolve, the resolver
//! sleeps `base * 2^(n - 1)` and tries again, up to `max_attempts` attempts in total.

pub mod detectors;

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;

use scout_config::Commerce;
use scout_storage::models::TenantIntegration;

use crate::{
	BoxFuture, CommerceProvider, DomainResolver, Platform, ProviderCache, Result, TenantStore,
};

/// Builds a live client for one platform from a tenant's integration row.
///
/// `Ok(None)` means the tenant has no usable integration for this platform. An error is treated
/// as transient and the resolver moves on to the next detector.
pub trait ProviderDetector
where
	Self: Send + Sync,
{
	fn platform(&self) -> Platform;

	fn detect<'a>(
		&'a self,
		integration: &'a TenantIntegration,
	) -> BoxFuture<'a, Result<Option<Arc<dyn CommerceProvider>>>>;
}

/// The only source of intentional delay in the resolver, injectable for tests.
pub trait Sleeper
where
	Self: Send + Sync,
{
	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

pub struct TokioSleeper;
impl Sleeper for TokioSleeper {
	fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
		Box::pin(tokio::time::sleep(duration))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &Commerce) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			base_backoff: Duration::from_millis(cfg.base_backoff_ms),
		}
	}

	/// Delay after failed attempt `attempt` (1-based).
	pub fn backoff_for(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1).min(31);

		self.base_backoff.saturating_mul(1_u32 << exponent)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: 3, base_backoff: Duration::from_millis(100) }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
	pub attempt_number: u32,
	pub max_attempts: u32,
	pub domain: String,
	pub timestamp: OffsetDateTime,
}

pub struct ProviderResolution {
	pub provider: Option<Arc<dyn CommerceProvider>>,
	pub attempts: Vec<ResolutionAttempt>,
	pub backoffs: Vec<Duration>,
	pub config_reads: u32,
	pub from_cache: bool,
}
impl ProviderResolution {
	fn empty() -> Self {
		Self {
			provider: None,
			attempts: Vec::new(),
			backoffs: Vec::new(),
			config_reads: 0,
			from_cache: false,
		}
	}
}

pub struct CommerceProviderResolver {
	domains: Arc<DomainResolver>,
	store: Arc<dyn TenantStore>,
	detectors: Vec<Arc<dyn ProviderDetector>>,
	policy: RetryPolicy,
	sleeper: Arc<dyn Sleeper>,
	provider_cache: Option<Arc<ProviderCache>>,
}
impl CommerceProviderResolver {
	/// `domains` must share `store` so a domain maps to the same tenant here as it does in search.
	pub fn new(
		domains: Arc<DomainResolver>,
		store: Arc<dyn TenantStore>,
		detectors: Vec<Arc<dyn ProviderDetector>>,
		policy: RetryPolicy,
		sleeper: Arc<dyn Sleeper>,
	) -> Self {
		Self { domains, store, detectors, policy, sleeper, provider_cache: None }
	}

	/// Keeps resolved providers per tenant until [`Self::invalidate_provider`] is called.
	pub fn with_provider_cache(mut self, cache: Arc<ProviderCache>) -> Self {
		self.provider_cache = Some(cache);

		self
	}

	pub async fn resolve_provider(&self, domain: &str) -> Option<Arc<dyn CommerceProvider>> {
		self.resolve_provider_traced(domain).await.provider
	}

	pub fn invalidate_provider(&self, tenant_id: &str) -> bool {
		self.provider_cache.as_ref().is_some_and(|cache| cache.invalidate(tenant_id))
	}

	pub async fn resolve_provider_traced(&self, domain: &str) -> ProviderResolution {
		let resolution = self.resolve_inner(domain).await;
		let provider = resolution.provider.as_ref();

		tracing::info!(
			domain,
			has_provider = provider.is_some(),
			platform = provider.map(|p| p.platform().as_str()),
			total_attempts = resolution.attempts.len(),
			from_cache = resolution.from_cache,
			"Provider resolution completed."
		);

		resolution
	}

	async fn resolve_inner(&self, domain: &str) -> ProviderResolution {
		if let Err(err) = self.store.check_connection().await {
			tracing::error!(domain, error = %err, "Tenant store is unavailable; not retrying.");

			return ProviderResolution::empty();
		}

		if let Some(cache) = self.provider_cache.as_ref()
			&& let Some(tenant_id) = self.domains.resolve(domain).await
			&& let Some(provider) = cache.get(&tenant_id)
		{
			tracing::debug!(domain, tenant_id = tenant_id.as_str(), "Provider cache hit.");

			return ProviderResolution {
				provider: Some(provider),
				from_cache: true,
				..ProviderResolution::empty()
			};
		}

		let resolution = self.run_attempts(domain).await;

		if let (Some(cache), Some(provider)) =
			(self.provider_cache.as_ref(), resolution.provider.as_ref())
		{
			cache.set(provider.tenant_id(), provider.clone());
		}

		resolution
	}

	async fn run_attempts(&self, domain: &str) -> ProviderResolution {
		let max_attempts = self.policy.max_attempts.max(1);
		let mut resolution = ProviderResolution::empty();

		for attempt in 1..=max_attempts {
			let record = ResolutionAttempt {
				attempt_number: attempt,
				max_attempts,
				domain: domain.to_string(),
				timestamp: OffsetDateTime::now_utc(),
			};

			tracing::info!(
				domain,
				attempt,
				max_attempts,
				timestamp = %record.timestamp,
				"Resolving commerce provider."
			);

			resolution.attempts.push(record);

			let will_retry = attempt < max_attempts;

			// Resolved per attempt; a Tier 3 store error surfaces here as an unresolved domain.
			match self.domains.resolve(domain).await {
				Some(tenant_id) => {
					resolution.config_reads += 1;

					if let Some(provider) =
						self.attempt_once(domain, &tenant_id, attempt, will_retry).await
					{
						resolution.provider = Some(provider);

						return resolution;
					}
				},
				None => {
					tracing::info!(domain, attempt, will_retry, "Domain did not resolve to a tenant.");
				},
			}

			if !will_retry {
				break;
			}

			let backoff = self.policy.backoff_for(attempt);

			tracing::info!(
				domain,
				attempt,
				backoff_ms = backoff.as_millis() as u64,
				"No provider detected; backing off."
			);

			resolution.backoffs.push(backoff);
			self.sleeper.sleep(backoff).await;
		}

		resolution
	}

	async fn attempt_once(
		&self,
		domain: &str,
		tenant_id: &str,
		attempt: u32,
		will_retry: bool,
	) -> Option<Arc<dyn CommerceProvider>> {
		let integration = match self.store.load_integration(tenant_id).await {
			Ok(Some(integration)) => integration,
			Ok(None) => {
				tracing::info!(
					domain,
					tenant_id,
					attempt,
					will_retry,
					"No integration configured for tenant."
				);

				return None;
			},
			Err(err) => {
				tracing::error!(
					domain,
					tenant_id,
					attempt,
					will_retry,
					error = %err,
					"Failed to load integration configuration."
				);

				return None;
			},
		};

		for detector in &self.detectors {
			let platform = detector.platform().as_str();

			match detector.detect(&integration).await {
				Ok(Some(provider)) => {
					tracing::info!(
						domain,
						attempt,
						platform,
						tenant_id,
						"Commerce provider detected."
					);

					return Some(provider);
				},
				Ok(None) => {
					tracing::debug!(domain, attempt, platform, "Detector found no integration.");
				},
				Err(err) => {
					tracing::error!(
						domain,
						attempt,
						platform,
						will_retry,
						error = %err,
						"Detector failed."
					);
				},
			}
		}

		None
	}
}
