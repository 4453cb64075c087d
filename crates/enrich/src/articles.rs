use coinbot_core::template::{substitute, TemplateParam};
use coinbot_core::DialogResponse;

use crate::clients::{SearchBackend, SearchQuery};
use crate::error::UpstreamError;
use crate::NO_ANSWER_FALLBACK;

/// Fills the article template with flattened `[title, url]` pairs in rank
/// order. Substitution is bounded by the results actually returned: a short
/// result set fills what exists (missing title/url render empty) and leaves
/// the remaining placeholders literal.
pub(crate) async fn apply(
    search: &dyn SearchBackend,
    slug: &str,
    response: &mut DialogResponse,
) -> Result<(), UpstreamError> {
    let data = search.query(&SearchQuery::articles(slug)).await?;

    let output = response.ensure_output();
    if data.results.is_empty() {
        output.text.push(NO_ANSWER_FALLBACK.to_owned());
        return Ok(());
    }

    let mut params = Vec::with_capacity(data.results.len() * 2);
    for result in data.results.iter().take(5) {
        params.push(TemplateParam::Text(result.title.clone().unwrap_or_default()));
        params.push(TemplateParam::Text(result.url.clone().unwrap_or_default()));
    }

    output.text = substitute(&output.text, &params);
    Ok(())
}
