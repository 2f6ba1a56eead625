use std::sync::Arc;

use scout_config::Search;
use scout_storage::models::ContentPage;

use crate::{
	BoxFuture, ContentIndex, Result,
	search::{ContentFragment, SearchMethod, SearchStrategy, StrategyRequest, ranking},
};

const CANDIDATE_MULTIPLIER: u32 = 4;
const TERM_WEIGHT: f32 = 0.55;
const PHRASE_WEIGHT: f32 = 0.25;
const TITLE_WEIGHT: f32 = 0.2;

/// Lexical matching over page titles and bodies.
pub struct KeywordSearch {
	index: Arc<dyn ContentIndex>,
	min_query_chars: usize,
	max_snippet_chars: usize,
}
impl KeywordSearch {
	pub fn new(index: Arc<dyn ContentIndex>, cfg: &Search) -> Self {
		Self {
			index,
			min_query_chars: cfg.keyword_min_query_chars,
			max_snippet_chars: cfg.max_snippet_chars,
		}
	}

	async fn run(&self, request: StrategyRequest<'_>) -> Result<Option<Vec<ContentFragment>>> {
		let query = request.query.trim();

		if query.chars().count() < self.min_query_chars {
			return Ok(None);
		}

		let terms = ranking::tokenize_query(query);

		if terms.is_empty() {
			return Ok(None);
		}

		let candidate_limit = request.limit.saturating_mul(CANDIDATE_MULTIPLIER);
		let pages = self.index.keyword_candidates(request.tenant_id, &terms, candidate_limit).await?;
		let phrase = query.to_lowercase();
		let mut fragments: Vec<ContentFragment> = pages
			.into_iter()
			.filter_map(|page| self.score_page(page, &terms, &phrase))
			.collect();

		fragments.sort_by(|a, b| ranking::cmp_f32_desc(a.similarity, b.similarity));
		fragments.truncate(request.limit as usize);

		Ok(Some(fragments))
	}

	fn score_page(
		&self,
		page: ContentPage,
		terms: &[String],
		phrase: &str,
	) -> Option<ContentFragment> {
		let title = page.title.to_lowercase();
		let body = format!("{title}\n{}", page.content.to_lowercase());
		let coverage = ranking::term_coverage(terms, &body);

		if coverage == 0.0 {
			return None;
		}

		let phrase_hit = if body.contains(phrase) { 1.0 } else { 0.0 };
		let title_coverage = ranking::term_coverage(terms, &title);
		let similarity =
			TERM_WEIGHT * coverage + PHRASE_WEIGHT * phrase_hit + TITLE_WEIGHT * title_coverage;

		Some(ContentFragment {
			content: ranking::snippet(&page.content, self.max_snippet_chars),
			url: page.url,
			title: page.title,
			similarity: ranking::clamp_similarity(similarity),
			search_method: SearchMethod::Keyword,
		})
	}
}

impl SearchStrategy for KeywordSearch {
	fn method(&self) -> SearchMethod {
		SearchMethod::Keyword
	}

	fn search<'a>(
		&'a self,
		request: StrategyRequest<'a>,
	) -> BoxFuture<'a, Result<Option<Vec<ContentFragment>>>> {
		Box::pin(self.run(request))
	}
}
