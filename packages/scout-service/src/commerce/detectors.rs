use std::{sync::Arc, time::Duration};

use scout_config::{Commerce, DETECTOR_SHOPIFY, DETECTOR_WOOCOMMERCE};
use scout_providers::{
	commerce::{ShopifyClient, WooCommerceClient},
	credentials::{self, CredentialsKey},
};
use scout_storage::models::TenantIntegration;

use crate::{BoxFuture, CommerceProvider, Platform, ProviderDetector, Result};

pub struct ShopifyDetector {
	key: CredentialsKey,
	api_version: String,
	timeout: Duration,
}
impl ShopifyDetector {
	pub fn new(key: CredentialsKey, api_version: &str, timeout: Duration) -> Self {
		Self { key, api_version: api_version.to_string(), timeout }
	}

	fn build(&self, integration: &TenantIntegration) -> Result<Option<Arc<dyn CommerceProvider>>> {
		let (Some(shop), Some(sealed_token)) = (
			non_blank(integration.shopify_shop.as_deref()),
			non_blank(integration.shopify_access_token_sealed.as_deref()),
		) else {
			return Ok(None);
		};
		let access_token = credentials::open(&self.key, sealed_token)?;
		let client = ShopifyClient::new(
			&integration.tenant_id,
			shop,
			&access_token,
			&self.api_version,
			self.timeout,
		)?;

		Ok(Some(Arc::new(client)))
	}
}

impl ProviderDetector for ShopifyDetector {
	fn platform(&self) -> Platform {
		Platform::Shopify
	}

	fn detect<'a>(
		&'a self,
		integration: &'a TenantIntegration,
	) -> BoxFuture<'a, Result<Option<Arc<dyn CommerceProvider>>>> {
		Box::pin(async move { self.build(integration) })
	}
}

pub struct WooCommerceDetector {
	key: CredentialsKey,
	timeout: Duration,
}
impl WooCommerceDetector {
	pub fn new(key: CredentialsKey, timeout: Duration) -> Self {
		Self { key, timeout }
	}

	fn build(&self, integration: &TenantIntegration) -> Result<Option<Arc<dyn CommerceProvider>>> {
		let (Some(url), Some(sealed_key), Some(sealed_secret)) = (
			non_blank(integration.woocommerce_url.as_deref()),
			non_blank(integration.woocommerce_consumer_key_sealed.as_deref()),
			non_blank(integration.woocommerce_consumer_secret_sealed.as_deref()),
		) else {
			return Ok(None);
		};
		let consumer_key = credentials::open(&self.key, sealed_key)?;
		let consumer_secret = credentials::open(&self.key, sealed_secret)?;
		let client = WooCommerceClient::new(
			&integration.tenant_id,
			url,
			&consumer_key,
			&consumer_secret,
			self.timeout,
		)?;

		Ok(Some(Arc::new(client)))
	}
}

impl ProviderDetector for WooCommerceDetector {
	fn platform(&self) -> Platform {
		Platform::WooCommerce
	}

	fn detect<'a>(
		&'a self,
		integration: &'a TenantIntegration,
	) -> BoxFuture<'a, Result<Option<Arc<dyn CommerceProvider>>>> {
		Box::pin(async move { self.build(integration) })
	}
}

/// Detectors in the order listed by `commerce.detectors`. Unknown names are skipped; config
/// validation rejects them before this point.
pub fn build_detectors(cfg: &Commerce, key: CredentialsKey) -> Vec<Arc<dyn ProviderDetector>> {
	let timeout = Duration::from_millis(cfg.request_timeout_ms);

	cfg.detectors
		.iter()
		.filter_map(|name| -> Option<Arc<dyn ProviderDetector>> {
			match name.as_str() {
				DETECTOR_SHOPIFY =>
					Some(Arc::new(ShopifyDetector::new(key, &cfg.shopify_api_version, timeout))),
				DETECTOR_WOOCOMMERCE => Some(Arc::new(WooCommerceDetector::new(key, timeout))),
				other => {
					tracing::warn!(detector = other, "Unknown commerce detector; skipping.");

					None
				},
			}
		})
		.collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
