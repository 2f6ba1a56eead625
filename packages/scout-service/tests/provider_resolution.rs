mod support;

use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use scout_service::{
	CommerceProviderResolver, DomainResolver, Platform, ProviderCache, ProviderDetector,
	RetryPolicy, TenantCache,
};
use scout_storage::models::Tenant;

use support::{
	DetectorReply, FakeDetector, FakeStore, IntegrationReply, RecordingSleeper, capture_logs,
	integration, tenant,
};

fn resolver(
	store: Arc<FakeStore>,
	detectors: Vec<Arc<dyn ProviderDetector>>,
	sleeper: Arc<RecordingSleeper>,
) -> CommerceProviderResolver {
	resolver_with_policy(store, detectors, sleeper, RetryPolicy::default())
}

fn resolver_with_policy(
	store: Arc<FakeStore>,
	detectors: Vec<Arc<dyn ProviderDetector>>,
	sleeper: Arc<RecordingSleeper>,
	policy: RetryPolicy,
) -> CommerceProviderResolver {
	let domains =
		Arc::new(DomainResolver::new(Arc::new(TenantCache::new(16, None)), store.clone()));

	CommerceProviderResolver::new(domains, store, detectors, policy, sleeper)
}

fn example_tenants() -> Vec<Tenant> {
	vec![tenant("t-1", "example.com", true)]
}

fn ms(values: &[u64]) -> Vec<Duration> {
	values.iter().copied().map(Duration::from_millis).collect()
}

#[tokio::test]
async fn first_attempt_success_reads_once_and_never_sleeps() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let shopify = FakeDetector::new(Platform::Shopify, DetectorReply::Provider);
	let woo = FakeDetector::new(Platform::WooCommerce, DetectorReply::Provider);
	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(store.clone(), vec![shopify.clone(), woo.clone()], sleeper.clone());
	let resolution = resolver.resolve_provider_traced("example.com").await;
	let provider = resolution.provider.expect("no provider");

	assert_eq!(provider.platform(), Platform::Shopify);
	assert_eq!(provider.tenant_id(), "t-1");
	assert_eq!(resolution.attempts.len(), 1);
	assert_eq!(resolution.config_reads, 1);
	assert_eq!(store.integration_reads(), 1);
	assert!(sleeper.slept().is_empty());
	assert_eq!(woo.calls(), 0);
}

#[tokio::test]
async fn not_found_then_found_retries_once() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![
		IntegrationReply::Missing,
		IntegrationReply::Found(integration("t-1", "example.com")),
	]);

	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(
		store.clone(),
		vec![FakeDetector::new(Platform::WooCommerce, DetectorReply::Provider)],
		sleeper.clone(),
	);
	let resolution = resolver.resolve_provider_traced("example.com").await;

	assert!(resolution.provider.is_some());
	assert_eq!(resolution.attempts.len(), 2);
	assert_eq!(resolution.backoffs, ms(&[100]));
	assert_eq!(sleeper.slept(), ms(&[100]));
	assert_eq!(store.integration_reads(), 2);
}

#[tokio::test]
async fn exhausted_attempts_back_off_exponentially_and_return_none() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Fail]);

	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(
		store.clone(),
		vec![FakeDetector::new(Platform::Shopify, DetectorReply::Provider)],
		sleeper.clone(),
	);
	let resolution = resolver.resolve_provider_traced("example.com").await;

	assert!(resolution.provider.is_none());
	assert_eq!(
		resolution.attempts.iter().map(|a| a.attempt_number).collect::<Vec<_>>(),
		vec![1, 2, 3]
	);
	assert!(resolution.attempts.iter().all(|a| a.max_attempts == 3 && a.domain == "example.com"));
	assert_eq!(resolution.backoffs, ms(&[100, 200]));
	assert_eq!(sleeper.slept(), ms(&[100, 200]));
	assert_eq!(store.integration_reads(), 3);
}

#[tokio::test]
async fn detectors_with_nothing_to_offer_exhaust_attempts() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let shopify = FakeDetector::new(Platform::Shopify, DetectorReply::Nothing);
	let woo = FakeDetector::new(Platform::WooCommerce, DetectorReply::Nothing);
	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(store.clone(), vec![shopify.clone(), woo.clone()], sleeper.clone());

	assert!(resolver.resolve_provider("example.com").await.is_none());
	assert_eq!(shopify.calls(), 3);
	assert_eq!(woo.calls(), 3);
	assert_eq!(sleeper.slept().len(), 2);
}

#[tokio::test]
async fn failing_detector_falls_through_to_the_next_one() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let shopify = FakeDetector::new(Platform::Shopify, DetectorReply::Fail);
	let woo = FakeDetector::new(Platform::WooCommerce, DetectorReply::Provider);
	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(store.clone(), vec![shopify.clone(), woo.clone()], sleeper.clone());
	let provider = resolver.resolve_provider("example.com").await.expect("no provider");

	assert_eq!(provider.platform(), Platform::WooCommerce);
	assert_eq!(shopify.calls(), 1);
	assert!(sleeper.slept().is_empty());
}

#[tokio::test]
async fn unavailable_store_returns_none_without_attempts() {
	let store = FakeStore::with_tenants(example_tenants());

	store.available.store(false, Ordering::SeqCst);

	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(
		store.clone(),
		vec![FakeDetector::new(Platform::Shopify, DetectorReply::Provider)],
		sleeper.clone(),
	);
	let resolution = resolver.resolve_provider_traced("example.com").await;

	assert!(resolution.provider.is_none());
	assert!(resolution.attempts.is_empty());
	assert_eq!(store.integration_reads(), 0);
	assert!(sleeper.slept().is_empty());
}

#[tokio::test]
async fn single_attempt_policy_never_sleeps() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Missing]);

	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver_with_policy(
		store.clone(),
		vec![FakeDetector::new(Platform::Shopify, DetectorReply::Provider)],
		sleeper.clone(),
		RetryPolicy { max_attempts: 1, base_backoff: Duration::from_millis(100) },
	);

	assert!(resolver.resolve_provider("example.com").await.is_none());
	assert_eq!(store.integration_reads(), 1);
	assert!(sleeper.slept().is_empty());
}

#[tokio::test]
async fn provider_cache_serves_repeat_calls_until_invalidated() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let detector = FakeDetector::new(Platform::Shopify, DetectorReply::Provider);
	let cache = Arc::new(ProviderCache::new(16, None));
	let resolver = resolver(
		store.clone(),
		vec![detector.clone()],
		Arc::new(RecordingSleeper::default()),
	)
	.with_provider_cache(cache.clone());
	let first = resolver.resolve_provider_traced("example.com").await;
	let second = resolver.resolve_provider_traced("www.example.com").await;

	assert!(!first.from_cache);
	assert!(second.from_cache);
	assert!(Arc::ptr_eq(
		first.provider.as_ref().expect("no provider"),
		second.provider.as_ref().expect("no provider"),
	));
	assert_eq!(detector.calls(), 1);
	assert_eq!(store.integration_reads(), 1);

	assert!(resolver.invalidate_provider("t-1"));
	assert!(resolver.resolve_provider("example.com").await.is_some());
	assert_eq!(detector.calls(), 2);
}

#[tokio::test]
async fn fuzzy_resolved_domain_reads_integration_by_tenant_id() {
	let store = FakeStore::with_tenants(vec![tenant("t-1", "www.example.com", true)]);

	store.set_integration_replies(vec![IntegrationReply::Found(integration(
		"t-1",
		"www.example.com",
	))]);

	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(
		store.clone(),
		vec![FakeDetector::new(Platform::WooCommerce, DetectorReply::Provider)],
		sleeper.clone(),
	);
	let resolution = resolver.resolve_provider_traced("shop.example.com").await;
	let provider = resolution.provider.expect("no provider");

	assert_eq!(provider.tenant_id(), "t-1");
	assert_eq!(resolution.attempts.len(), 1);
	assert_eq!(store.integration_requests(), vec!["t-1".to_string()]);
	assert!(sleeper.slept().is_empty());
}

#[tokio::test]
async fn unresolved_domain_is_a_failed_attempt_without_config_reads() {
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let detector = FakeDetector::new(Platform::Shopify, DetectorReply::Provider);
	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(store.clone(), vec![detector.clone()], sleeper.clone());
	let resolution = resolver.resolve_provider_traced("unknown.org").await;

	assert!(resolution.provider.is_none());
	assert_eq!(resolution.attempts.len(), 3);
	assert_eq!(resolution.config_reads, 0);
	assert_eq!(resolution.backoffs, ms(&[100, 200]));
	assert_eq!(store.integration_reads(), 0);
	assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn detector_failure_is_logged_as_error_and_retried() {
	let (_guard, logs) = capture_logs();
	let store = FakeStore::with_tenants(example_tenants());

	store.set_integration_replies(vec![IntegrationReply::Found(integration("t-1", "example.com"))]);

	let detector = FakeDetector::new(Platform::Shopify, DetectorReply::Fail);
	let sleeper = Arc::new(RecordingSleeper::default());
	let resolver = resolver(store.clone(), vec![detector.clone()], sleeper.clone());

	assert!(resolver.resolve_provider("example.com").await.is_none());
	assert_eq!(detector.calls(), 3);
	assert_eq!(sleeper.slept(), ms(&[100, 200]));

	let failures: Vec<String> =
		logs.lines().into_iter().filter(|line| line.contains("Detector failed.")).collect();

	assert_eq!(failures.len(), 3);
	assert!(failures.iter().all(|line| line.contains("ERROR")));
	assert!(failures[0].contains("will_retry=true"));
	assert!(failures[2].contains("will_retry=false"));
}
