//! Domain → tenant resolution.
//!
//! Three tiers, each tried only when the previous one misses:
//!
//! 1. the cache, keyed by the domain with a leading `www.` removed;
//! 2. the cache again, under alternate spellings of that domain;
//! 3. a fuzzy lookup against the tenant store, written back to the cache on success.
//!
//! An unresolved domain is a normal outcome and is reported as `None`.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::{TenantCache, TenantStore};

const WWW_PREFIX: &str = "www.";
const ATTEMPTED_METHODS: [&str; 3] = ["cache", "alternative-formats", "direct-db-fuzzy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
	CacheHit,
	AlternativeFormat,
	/// Another in-flight call for the same domain populated the cache while this one waited.
	Coalesced,
	DirectDbFuzzy,
}
impl ResolutionMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::CacheHit => "cache-hit",
			Self::AlternativeFormat => "alternative-format",
			Self::Coalesced => "coalesced",
			Self::DirectDbFuzzy => "direct-db-fuzzy",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainResolution {
	pub tenant_id: String,
	pub method: ResolutionMethod,
	/// The cache key or store domain that produced the match.
	pub matched: String,
}

pub struct DomainResolver {
	cache: Arc<TenantCache>,
	store: Arc<dyn TenantStore>,
	in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl DomainResolver {
	pub fn new(cache: Arc<TenantCache>, store: Arc<dyn TenantStore>) -> Self {
		Self { cache, store, in_flight: Mutex::new(HashMap::new()) }
	}

	pub async fn resolve(&self, raw_domain: &str) -> Option<String> {
		self.resolve_detailed(raw_domain).await.map(|resolution| resolution.tenant_id)
	}

	pub async fn resolve_detailed(&self, raw_domain: &str) -> Option<DomainResolution> {
		let search_domain = search_domain(raw_domain);
		let stats = self.cache.stats();

		tracing::info!(
			original_domain = raw_domain,
			search_domain,
			cache_size = stats.size,
			cache_hit_rate = stats.hit_rate,
			"Resolving domain."
		);

		if let Some(tenant_id) = self.cache.get(search_domain) {
			tracing::info!(
				search_domain,
				tenant_id = tenant_id.as_str(),
				method = ResolutionMethod::CacheHit.as_str(),
				"Domain resolved."
			);

			return Some(DomainResolution {
				tenant_id,
				method: ResolutionMethod::CacheHit,
				matched: search_domain.to_string(),
			});
		}

		if let Some(resolution) = self.probe_aliases(search_domain) {
			return Some(resolution);
		}

		let resolution = self.lookup_store(search_domain).await;

		if resolution.is_none() {
			tracing::info!(
				original_domain = raw_domain,
				search_domain,
				attempted_methods = ?ATTEMPTED_METHODS,
				cache_size = self.cache.len(),
				"Domain not resolved."
			);
		}

		resolution
	}

	fn probe_aliases(&self, search_domain: &str) -> Option<DomainResolution> {
		for alias in domain_aliases(search_domain) {
			// Tier 1 already probed the search domain itself.
			if alias == search_domain {
				continue;
			}

			let Some(tenant_id) = self.cache.get(&alias) else {
				continue;
			};

			self.cache.set(search_domain, tenant_id.clone());

			tracing::info!(
				search_domain,
				alias = alias.as_str(),
				tenant_id = tenant_id.as_str(),
				method = ResolutionMethod::AlternativeFormat.as_str(),
				"Domain resolved."
			);

			return Some(DomainResolution {
				tenant_id,
				method: ResolutionMethod::AlternativeFormat,
				matched: alias,
			});
		}

		None
	}

	async fn lookup_store(&self, search_domain: &str) -> Option<DomainResolution> {
		let permit = self.flight_permit(search_domain);
		// Declared after `permit` so it drops first, including when the caller cancels.
		let _guard = permit.gate.lock().await;

		self.lookup_store_locked(search_domain).await
	}

	async fn lookup_store_locked(&self, search_domain: &str) -> Option<DomainResolution> {
		if let Some(tenant_id) = self.cache.peek(search_domain) {
			tracing::info!(
				search_domain,
				tenant_id = tenant_id.as_str(),
				method = ResolutionMethod::Coalesced.as_str(),
				"Domain resolved."
			);

			return Some(DomainResolution {
				tenant_id,
				method: ResolutionMethod::Coalesced,
				matched: search_domain.to_string(),
			});
		}

		match self.store.find_active_tenant_fuzzy(search_domain).await {
			Ok(Some(tenant)) if tenant.active => {
				self.cache.set(search_domain, tenant.tenant_id.clone());

				tracing::info!(
					search_domain,
					stored_domain = tenant.domain.as_str(),
					tenant_id = tenant.tenant_id.as_str(),
					method = ResolutionMethod::DirectDbFuzzy.as_str(),
					"Domain resolved."
				);

				Some(DomainResolution {
					tenant_id: tenant.tenant_id,
					method: ResolutionMethod::DirectDbFuzzy,
					matched: tenant.domain,
				})
			},
			Ok(Some(tenant)) => {
				tracing::warn!(
					search_domain,
					tenant_id = tenant.tenant_id.as_str(),
					"Store returned an inactive tenant; ignoring it."
				);

				None
			},
			Ok(None) => {
				tracing::debug!(search_domain, "No active tenant matched the domain.");

				None
			},
			Err(err) => {
				tracing::error!(search_domain, error = %err, "Tenant lookup failed.");

				None
			},
		}
	}

	fn flight_permit<'a>(&'a self, search_domain: &'a str) -> FlightPermit<'a> {
		let gate = self.in_flight.lock().entry(search_domain.to_string()).or_default().clone();

		FlightPermit { in_flight: &self.in_flight, search_domain, gate }
	}
}

/// A caller's claim on the single-flight gate of one domain. Dropping the last claim removes the
/// gate from the map, whether the lookup finished or was cancelled.
struct FlightPermit<'a> {
	in_flight: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
	search_domain: &'a str,
	gate: Arc<AsyncMutex<()>>,
}
impl Drop for FlightPermit<'_> {
	fn drop(&mut self) {
		let mut in_flight = self.in_flight.lock();

		// One reference lives in the map and one is ours; anything more is another claim.
		if let Some(current) = in_flight.get(self.search_domain)
			&& Arc::ptr_eq(current, &self.gate)
			&& Arc::strong_count(&self.gate) <= 2
		{
			in_flight.remove(self.search_domain);
		}
	}
}

/// Strips one leading `www.`; nothing else (schemes, ports, case) is normalized here.
pub fn search_domain(raw_domain: &str) -> &str {
	raw_domain.strip_prefix(WWW_PREFIX).unwrap_or(raw_domain)
}

/// Cache-probe spellings of `search_domain`, in probe order and without duplicates.
pub fn domain_aliases(search_domain: &str) -> Vec<String> {
	let lowered = search_domain.to_lowercase();
	let lowered_bare = lowered.strip_prefix(WWW_PREFIX).unwrap_or(&lowered).to_string();
	let candidates = [
		search_domain.to_string(),
		format!("{WWW_PREFIX}{search_domain}"),
		lowered_bare.clone(),
		format!("{WWW_PREFIX}{lowered_bare}"),
	];
	let mut out: Vec<String> = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		if candidate.is_empty() || candidate == WWW_PREFIX || out.contains(&candidate) {
			continue;
		}

		out.push(candidate);
	}

	out
}
