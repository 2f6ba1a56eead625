use std::sync::Arc;

use scout_config::Search;

use crate::{
	BoxFuture, ContentIndex, Result,
	search::{ContentFragment, SearchMethod, SearchStrategy, StrategyRequest, ranking},
};

const BASE_SIMILARITY: f32 = 0.1;
const COVERAGE_WEIGHT: f32 = 0.3;

/// Broad, low-precision recall used to top up a short result list.
///
/// Scores fall in `[0.1, 0.4]`. That keeps fallback fragments under strong keyword and vector
/// hits, but a weak keyword hit (few query terms matched) can still rank below them.
pub struct FallbackSearch {
	index: Arc<dyn ContentIndex>,
	max_snippet_chars: usize,
}
impl FallbackSearch {
	pub fn new(index: Arc<dyn ContentIndex>, cfg: &Search) -> Self {
		Self { index, max_snippet_chars: cfg.max_snippet_chars }
	}

	async fn run(&self, request: StrategyRequest<'_>) -> Result<Option<Vec<ContentFragment>>> {
		let terms = ranking::tokenize_query(request.query);
		let pages = self.index.fallback_candidates(request.tenant_id, &terms, request.limit).await?;
		let fragments = pages
			.into_iter()
			.map(|page| {
				let haystack = format!(
					"{}\n{}\n{}",
					page.title.to_lowercase(),
					page.url.to_lowercase(),
					page.content.to_lowercase()
				);
				let coverage = ranking::term_coverage(&terms, &haystack);

				ContentFragment {
					content: ranking::snippet(&page.content, self.max_snippet_chars),
					url: page.url,
					title: page.title,
					similarity: similarity(coverage),
					search_method: SearchMethod::Fallback,
				}
			})
			.collect();

		Ok(Some(fragments))
	}
}

fn similarity(coverage: f32) -> f32 {
	BASE_SIMILARITY + COVERAGE_WEIGHT * coverage.clamp(0.0, 1.0)
}

impl SearchStrategy for FallbackSearch {
	fn method(&self) -> SearchMethod {
		SearchMethod::Fallback
	}

	fn search<'a>(
		&'a self,
		request: StrategyRequest<'a>,
	) -> BoxFuture<'a, Result<Option<Vec<ContentFragment>>>> {
		Box::pin(self.run(request))
	}
}
