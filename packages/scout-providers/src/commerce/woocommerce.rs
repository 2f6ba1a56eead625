use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{
	BoxFuture, Error, Result,
	commerce::{CommerceProvider, Platform, ProductSummary, json_id},
};

pub struct WooCommerceClient {
	client: Client,
	tenant_id: String,
	store_url: String,
	consumer_key: String,
	consumer_secret: String,
}
impl WooCommerceClient {
	pub fn new(
		tenant_id: &str,
		store_url: &str,
		consumer_key: &str,
		consumer_secret: &str,
		timeout: Duration,
	) -> Result<Self> {
		let store_url = store_url.trim().trim_end_matches('/');

		if !store_url.starts_with("https://") && !store_url.starts_with("http://") {
			return Err(Error::InvalidConfig {
				message: "WooCommerce url must include an http(s) scheme.".to_string(),
			});
		}
		if consumer_key.trim().is_empty() || consumer_secret.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "WooCommerce consumer key and secret must be non-empty.".to_string(),
			});
		}

		Ok(Self {
			client: Client::builder().timeout(timeout).build()?,
			tenant_id: tenant_id.to_string(),
			store_url: store_url.to_string(),
			consumer_key: consumer_key.trim().to_string(),
			consumer_secret: consumer_secret.trim().to_string(),
		})
	}

	async fn fetch_products(&self, query: &str, limit: u32) -> Result<Vec<ProductSummary>> {
		let url = format!("{}/wp-json/wc/v3/products", self.store_url);
		let res = self
			.client
			.get(url)
			.basic_auth(&self.consumer_key, Some(&self.consumer_secret))
			.query(&[("search", query.to_string()), ("per_page", limit.to_string())])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_products(&json)
	}
}

impl CommerceProvider for WooCommerceClient {
	fn platform(&self) -> Platform {
		Platform::WooCommerce
	}

	fn tenant_id(&self) -> &str {
		&self.tenant_id
	}

	fn store_url(&self) -> &str {
		&self.store_url
	}

	fn search_products<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ProductSummary>>> {
		Box::pin(self.fetch_products(query, limit))
	}
}

fn parse_products(json: &Value) -> Result<Vec<ProductSummary>> {
	let products = json.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "WooCommerce response must be a product array.".to_string(),
	})?;

	Ok(products
		.iter()
		.filter_map(|product| {
			let id = json_id(product.get("id"))?;

			Some(ProductSummary {
				id,
				title: product.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
				price: product
					.get("price")
					.and_then(Value::as_str)
					.filter(|price| !price.is_empty())
					.map(str::to_string),
				url: product.get("permalink").and_then(Value::as_str).map(str::to_string),
			})
		})
		.collect())
}
