use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tenant {
	pub tenant_id: String,
	pub domain: String,
	pub active: bool,
}

/// A tenant's commerce integration row. Credential columns hold sealed strings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantIntegration {
	pub tenant_id: String,
	pub domain: String,
	pub shopify_shop: Option<String>,
	pub shopify_access_token_sealed: Option<String>,
	pub woocommerce_url: Option<String>,
	pub woocommerce_consumer_key_sealed: Option<String>,
	pub woocommerce_consumer_secret_sealed: Option<String>,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentPage {
	pub page_id: Uuid,
	pub tenant_id: String,
	pub url: String,
	pub title: String,
	pub content: String,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentHit {
	pub url: String,
	pub title: String,
	pub content: String,
	pub score: f32,
}
