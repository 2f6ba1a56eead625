pub const DENSE_VECTOR_NAME: &str = "dense";

use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Filter, Query, QueryPointsBuilder, ScoredPoint, Value, value::Kind,
};

use crate::{Error, Result, models::ContentHit};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &scout_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest content fragments for one tenant, best first. Points without a `content` payload
	/// are skipped.
	pub async fn search_content(
		&self,
		tenant_id: &str,
		vector: &[f32],
		limit: u32,
		min_score: f32,
	) -> Result<Vec<ContentHit>> {
		check_dimensions(self.vector_dim, vector)?;

		let request = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.filter(Filter::must([Condition::matches("tenant_id", tenant_id.to_string())]))
			.score_threshold(min_score)
			.limit(u64::from(limit))
			.with_payload(true);
		let response = self.client.query(request).await?;

		Ok(response.result.iter().filter_map(point_to_hit).collect())
	}
}

fn check_dimensions(expected: u32, vector: &[f32]) -> Result<()> {
	if vector.len() != expected as usize {
		return Err(Error::InvalidArgument(format!(
			"Query vector has {} dimensions; collection expects {expected}.",
			vector.len()
		)));
	}

	Ok(())
}

fn point_to_hit(point: &ScoredPoint) -> Option<ContentHit> {
	let content = payload_string(&point.payload, "content")?;

	Some(ContentHit {
		url: payload_string(&point.payload, "url").unwrap_or_default(),
		title: payload_string(&point.payload, "title").unwrap_or_default(),
		content,
		score: point.score,
	})
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}
