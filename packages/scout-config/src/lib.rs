mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, CacheTier, Commerce, Config, DETECTOR_SHOPIFY, DETECTOR_WOOCOMMERCE,
	EmbeddingProviderConfig, Postgres, Providers, Qdrant, Search, Security, Service, Storage,
	ToggleCacheTier,
};

use std::{collections::HashSet, fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

const CREDENTIALS_KEY_BYTES: usize = 32;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}

	for (label, capacity) in [
		("cache.tenants.capacity", cfg.cache.tenants.capacity),
		("cache.results.capacity", cfg.cache.results.capacity),
		("cache.providers.capacity", cfg.cache.providers.capacity),
	] {
		if capacity == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.search.max_limit == 0 {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 || cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must be between 1 and search.max_limit.".to_string(),
		});
	}
	if cfg.search.budget_ms == 0 {
		return Err(Error::Validation {
			message: "search.budget_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.vector_min_similarity.is_finite() {
		return Err(Error::Validation {
			message: "search.vector_min_similarity must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.vector_min_similarity) {
		return Err(Error::Validation {
			message: "search.vector_min_similarity must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.search.max_snippet_chars == 0 {
		return Err(Error::Validation {
			message: "search.max_snippet_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.commerce.max_attempts == 0 {
		return Err(Error::Validation {
			message: "commerce.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.commerce.detectors.is_empty() {
		return Err(Error::Validation {
			message: "commerce.detectors must be non-empty.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for name in &cfg.commerce.detectors {
		if !matches!(name.as_str(), DETECTOR_SHOPIFY | DETECTOR_WOOCOMMERCE) {
			return Err(Error::Validation {
				message: format!(
					"commerce.detectors entry {name:?} must be one of shopify or woocommerce."
				),
			});
		}
		if !seen.insert(name.as_str()) {
			return Err(Error::Validation {
				message: format!("commerce.detectors lists {name:?} more than once."),
			});
		}
	}

	let key = BASE64.decode(cfg.security.credentials_key.trim()).map_err(|_| Error::Validation {
		message: "security.credentials_key must be valid base64.".to_string(),
	})?;

	if key.len() != CREDENTIALS_KEY_BYTES {
		return Err(Error::Validation {
			message: "security.credentials_key must decode to 32 bytes.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for name in &mut cfg.commerce.detectors {
		*name = name.trim().to_ascii_lowercase();
	}

	cfg.security.credentials_key = cfg.security.credentials_key.trim().to_string();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
