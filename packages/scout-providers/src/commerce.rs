//! Commerce backend clients bound to one tenant's opened credentials.

pub mod shopify;
pub mod woocommerce;

pub use shopify::ShopifyClient;
pub use woocommerce::WooCommerceClient;

use std::fmt;

use crate::{BoxFuture, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	Shopify,
	WooCommerce,
}
impl Platform {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Shopify => "shopify",
			Self::WooCommerce => "woocommerce",
		}
	}
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProductSummary {
	pub id: String,
	pub title: String,
	pub price: Option<String>,
	pub url: Option<String>,
}

pub trait CommerceProvider
where
	Self: Send + Sync,
{
	fn platform(&self) -> Platform;

	fn tenant_id(&self) -> &str;

	fn store_url(&self) -> &str;

	fn search_products<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ProductSummary>>>;
}

fn json_id(value: Option<&serde_json::Value>) -> Option<String> {
	match value? {
		serde_json::Value::String(text) => Some(text.clone()),
		serde_json::Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
