use std::time::Duration;

use reqwest::{Client, header::HeaderValue};
use serde_json::Value;

use crate::{
	BoxFuture, Error, Result,
	commerce::{CommerceProvider, Platform, ProductSummary, json_id},
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

pub struct ShopifyClient {
	client: Client,
	tenant_id: String,
	store_url: String,
	api_version: String,
	access_token: HeaderValue,
}
impl ShopifyClient {
	/// `shop` is the `*.myshopify.com` host, with or without a scheme.
	pub fn new(
		tenant_id: &str,
		shop: &str,
		access_token: &str,
		api_version: &str,
		timeout: Duration,
	) -> Result<Self> {
		let host = shop.trim().trim_start_matches("https://").trim_start_matches("http://");
		let host = host.trim_end_matches('/');

		if host.is_empty() {
			return Err(Error::InvalidConfig { message: "Shopify shop must be non-empty.".to_string() });
		}
		if access_token.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "Shopify access token must be non-empty.".to_string(),
			});
		}

		let mut access_token = HeaderValue::from_str(access_token.trim())?;

		access_token.set_sensitive(true);

		Ok(Self {
			client: Client::builder().timeout(timeout).build()?,
			tenant_id: tenant_id.to_string(),
			store_url: format!("https://{host}"),
			api_version: api_version.to_string(),
			access_token,
		})
	}

	async fn fetch_products(&self, query: &str, limit: u32) -> Result<Vec<ProductSummary>> {
		let url = format!("{}/admin/api/{}/products.json", self.store_url, self.api_version);
		let res = self
			.client
			.get(url)
			.header(ACCESS_TOKEN_HEADER, self.access_token.clone())
			.query(&[("title", query.to_string()), ("limit", limit.to_string())])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_products(&json, &self.store_url)
	}
}

impl CommerceProvider for ShopifyClient {
	fn platform(&self) -> Platform {
		Platform::Shopify
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

fn parse_products(json: &Value, store_url: &str) -> Result<Vec<ProductSummary>> {
	let products = json.get("products").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Shopify response is missing products array.".to_string() }
	})?;
	let mut out = Vec::with_capacity(products.len());

	for product in products {
		let Some(id) = json_id(product.get("id")) else {
			continue;
		};
		let title = product.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
		let price = product
			.get("variants")
			.and_then(Value::as_array)
			.and_then(|variants| variants.first())
			.and_then(|variant| variant.get("price"))
			.and_then(Value::as_str)
			.map(str::to_string);
		let url = product
			.get("handle")
			.and_then(Value::as_str)
			.map(|handle| format!("{store_url}/products/{handle}"));

		out.push(ProductSummary { id, title, price, url });
	}

	Ok(out)
}
