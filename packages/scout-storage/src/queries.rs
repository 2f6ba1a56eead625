use crate::{
	Result,
	db::Db,
	models::{ContentPage, Tenant, TenantIntegration},
};

/// Finds one active tenant whose stored domain (without a leading `www.`) contains `domain`, or is
/// contained by it. Comparison is case-insensitive and an empty `domain` never matches.
pub async fn find_active_tenant_fuzzy(db: &Db, domain: &str) -> Result<Option<Tenant>> {
	let tenant = sqlx::query_as::<_, Tenant>(
		"\
SELECT tenant_id, domain, active
FROM tenants
WHERE active
	AND $1 <> ''
	AND domain <> ''
	AND (
		strpos(lower(regexp_replace(domain, '^www[.]', '')), lower($1)) > 0
		OR strpos(lower($1), lower(regexp_replace(domain, '^www[.]', ''))) > 0
	)
ORDER BY length(domain), tenant_id
LIMIT 1",
	)
	.bind(domain)
	.fetch_optional(&db.pool)
	.await?;

	Ok(tenant)
}

/// Integration row of an active tenant.
pub async fn load_integration(db: &Db, tenant_id: &str) -> Result<Option<TenantIntegration>> {
	let integration = sqlx::query_as::<_, TenantIntegration>(
		"\
SELECT
	t.tenant_id,
	t.domain,
	i.shopify_shop,
	i.shopify_access_token_sealed,
	i.woocommerce_url,
	i.woocommerce_consumer_key_sealed,
	i.woocommerce_consumer_secret_sealed,
	i.updated_at
FROM tenants t
JOIN tenant_integrations i ON i.tenant_id = t.tenant_id
WHERE i.tenant_id = $1
	AND t.active",
	)
	.bind(tenant_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(integration)
}

/// Pages whose title or content contains any of `terms`, newest first.
pub async fn keyword_candidates(
	db: &Db,
	tenant_id: &str,
	terms: &[String],
	limit: u32,
) -> Result<Vec<ContentPage>> {
	if terms.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let patterns = like_patterns(terms);
	let pages = sqlx::query_as::<_, ContentPage>(
		"\
SELECT page_id, tenant_id, url, title, content, updated_at
FROM content_pages
WHERE tenant_id = $1
	AND (title ILIKE ANY($2) OR content ILIKE ANY($2))
ORDER BY updated_at DESC, page_id
LIMIT $3",
	)
	.bind(tenant_id)
	.bind(patterns.as_slice())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(pages)
}

/// Looser candidate set: pages whose title or url mentions any term, or the most recently updated
/// pages when there are no usable terms.
pub async fn fallback_candidates(
	db: &Db,
	tenant_id: &str,
	terms: &[String],
	limit: u32,
) -> Result<Vec<ContentPage>> {
	if limit == 0 {
		return Ok(Vec::new());
	}
	if terms.is_empty() {
		let pages = sqlx::query_as::<_, ContentPage>(
			"\
SELECT page_id, tenant_id, url, title, content, updated_at
FROM content_pages
WHERE tenant_id = $1
ORDER BY updated_at DESC, page_id
LIMIT $2",
		)
		.bind(tenant_id)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

		return Ok(pages);
	}

	let patterns = like_patterns(terms);
	let pages = sqlx::query_as::<_, ContentPage>(
		"\
SELECT page_id, tenant_id, url, title, content, updated_at
FROM content_pages
WHERE tenant_id = $1
	AND (title ILIKE ANY($2) OR url ILIKE ANY($2))
ORDER BY updated_at DESC, page_id
LIMIT $3",
	)
	.bind(tenant_id)
	.bind(patterns.as_slice())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(pages)
}

fn like_patterns(terms: &[String]) -> Vec<String> {
	terms.iter().map(|term| format!("%{}%", escape_like(term))).collect()
}

fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
