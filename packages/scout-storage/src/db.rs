use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Error, Result, schema};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	/// Builds the pool without dialing Postgres. An unreachable server surfaces later as
	/// [`Error::Unavailable`] from [`Db::check_connection`] or as a failed query.
	pub fn connect(cfg: &scout_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.acquire_timeout(Duration::from_millis(cfg.acquire_timeout_ms))
			.connect_lazy(&cfg.dsn)?;

		Ok(Self { pool })
	}

	pub async fn check_connection(&self) -> Result<()> {
		self.pool.acquire().await.map(drop).map_err(|err| Error::Unavailable(err.to_string()))
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 7_341_992;
		// Advisory locks are held per connection, so scope it to one transaction.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
