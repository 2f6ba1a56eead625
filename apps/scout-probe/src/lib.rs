use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

use scout_providers::credentials;
use scout_service::{ContentFragment, ScoutService};
use scout_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = scout_cli::VERSION,
	rename_all = "kebab",
	styles = scout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Resolve a domain to its tenant and report which tier matched.
	ResolveDomain { domain: String },
	/// Run the hybrid content search for a domain.
	Search {
		#[arg(long, short = 'd')]
		domain: String,
		#[arg(long, short = 'q')]
		query: String,
		/// Zero uses `search.default_limit`.
		#[arg(long, short = 'l', default_value_t = 0)]
		limit: u32,
	},
	/// Resolve the commerce backend serving a domain.
	ResolveProvider {
		domain: String,
		/// Also search the resolved store's catalog.
		#[arg(long, value_name = "QUERY")]
		products: Option<String>,
		#[arg(long, default_value_t = 5)]
		product_limit: u32,
	},
	/// Resolve each domain twice and print the cache statistics.
	CacheStats {
		#[arg(required = true)]
		domains: Vec<String>,
	},
	/// Seal a credential with `security.credentials_key` for storage in `tenant_integrations`.
	SealCredential { plaintext: String },
	/// Apply the bundled schema to the configured Postgres database.
	InitSchema,
}

#[derive(Debug, Serialize)]
struct DomainReport<'a> {
	domain: &'a str,
	tenant_id: Option<String>,
	method: Option<&'static str>,
	matched: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchReport<'a> {
	domain: &'a str,
	query: &'a str,
	results: Vec<ContentFragment>,
}

#[derive(Debug, Serialize)]
struct AttemptReport {
	attempt: u32,
	max_attempts: u32,
	timestamp: String,
}

#[derive(Debug, Serialize)]
struct ProviderReport<'a> {
	domain: &'a str,
	platform: Option<&'static str>,
	tenant_id: Option<String>,
	store_url: Option<String>,
	from_cache: bool,
	attempts: Vec<AttemptReport>,
	backoffs_ms: Vec<u64>,
	products: Option<Vec<scout_service::ProductSummary>>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scout_config::load(&args.config)?;

	init_tracing(&config)?;

	match args.command {
		Command::ResolveDomain { domain } => {
			let service = ScoutService::connect(config)?;
			let resolution = service.domains.resolve_detailed(&domain).await;
			let report = DomainReport {
				domain: &domain,
				tenant_id: resolution.as_ref().map(|r| r.tenant_id.clone()),
				method: resolution.as_ref().map(|r| r.method.as_str()),
				matched: resolution.map(|r| r.matched),
			};

			print_json(&report)
		},
		Command::Search { domain, query, limit } => {
			let service = ScoutService::connect(config)?;
			let results = service.search_content(&query, &domain, limit).await;

			print_json(&SearchReport { domain: &domain, query: &query, results })
		},
		Command::ResolveProvider { domain, products, product_limit } => {
			let service = ScoutService::connect(config)?;

			resolve_provider(&service, &domain, products.as_deref(), product_limit).await
		},
		Command::CacheStats { domains } => {
			let service = ScoutService::connect(config)?;

			for domain in &domains {
				for _ in 0..2 {
					service.resolve_domain(domain).await;
				}
			}

			print_json(&service.cache_stats())
		},
		Command::SealCredential { plaintext } => {
			let key = credentials::decode_key(&config.security.credentials_key)?;
			let sealed = credentials::seal(&key, &random_nonce(), &plaintext)?;

			println!("{sealed}");

			Ok(())
		},
		Command::InitSchema => {
			let db = Db::connect(&config.storage.postgres)?;

			db.ensure_schema().await?;

			tracing::info!("Schema applied.");

			Ok(())
		},
	}
}

async fn resolve_provider(
	service: &ScoutService,
	domain: &str,
	products_query: Option<&str>,
	product_limit: u32,
) -> color_eyre::Result<()> {
	let resolution = service.commerce.resolve_provider_traced(domain).await;
	let provider = resolution.provider.as_ref();
	let products = match (provider, products_query) {
		(Some(provider), Some(query)) => Some(provider.search_products(query, product_limit).await?),
		_ => None,
	};
	let mut attempts = Vec::with_capacity(resolution.attempts.len());

	for attempt in &resolution.attempts {
		attempts.push(AttemptReport {
			attempt: attempt.attempt_number,
			max_attempts: attempt.max_attempts,
			timestamp: attempt.timestamp.format(&Rfc3339)?,
		});
	}

	let report = ProviderReport {
		domain,
		platform: provider.map(|p| p.platform().as_str()),
		tenant_id: provider.map(|p| p.tenant_id().to_string()),
		store_url: provider.map(|p| p.store_url().to_string()),
		from_cache: resolution.from_cache,
		attempts,
		backoffs_ms: resolution.backoffs.iter().map(|d| d.as_millis() as u64).collect(),
		products,
	};

	print_json(&report)
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn random_nonce() -> [u8; credentials::NONCE_LEN] {
	let bytes = uuid::Uuid::new_v4().into_bytes();
	let mut nonce = [0; credentials::NONCE_LEN];

	nonce.copy_from_slice(&bytes[..credentials::NONCE_LEN]);

	nonce
}

fn init_tracing(config: &scout_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre::eyre!("Failed to install tracing subscriber: {err}."))?;

	Ok(())
}
