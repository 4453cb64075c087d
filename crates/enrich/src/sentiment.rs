use coinbot_core::template::{substitute, TemplateParam};
use coinbot_core::{DialogResponse, SentimentLabel};

use crate::clients::{SearchBackend, SearchQuery, SearchResponse};
use crate::error::UpstreamError;
use crate::NO_ANSWER_FALLBACK;

/// Queries recent coverage for the asset and fills the sentiment template
/// with `[label, total matches, positive count, negative count]`.
pub(crate) async fn apply(
    search: &dyn SearchBackend,
    slug: &str,
    response: &mut DialogResponse,
) -> Result<(), UpstreamError> {
    let data = search.query(&SearchQuery::sentiment(slug)).await?;

    let output = response.ensure_output();
    if data.results.is_empty() {
        output.text.push(NO_ANSWER_FALLBACK.to_owned());
        return Ok(());
    }

    let label = SentimentLabel::from_score(average_score(&data));
    let (positive, negative) = label_counts(&data);

    let params = [
        TemplateParam::Text(label.to_string()),
        TemplateParam::from(data.matching_results),
        TemplateParam::from(positive),
        TemplateParam::from(negative),
    ];
    output.text = substitute(&output.text, &params);
    Ok(())
}

fn average_score(data: &SearchResponse) -> f64 {
    data.aggregations.first().and_then(|aggregation| aggregation.value).unwrap_or(0.0)
}

/// Positive/negative document counts from the label term aggregation. Reads
/// are bounded by the buckets actually returned; an absent label counts zero.
fn label_counts(data: &SearchResponse) -> (u64, u64) {
    let mut positive = 0;
    let mut negative = 0;
    if let Some(terms) = data.aggregations.get(1) {
        for bucket in &terms.results {
            match bucket.key.as_str() {
                "positive" => positive = bucket.matching_results,
                "negative" => negative = bucket.matching_results,
                _ => {}
            }
        }
    }
    (positive, negative)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use coinbot_core::dialog::OutputPayload;
    use coinbot_core::DialogResponse;

    use crate::clients::{
        Aggregation, AggregationBucket, SearchBackend, SearchQuery, SearchResponse, SearchResult,
    };
    use crate::error::UpstreamError;
    use crate::NO_ANSWER_FALLBACK;

    struct FixedSearch(SearchResponse);

    #[async_trait]
    impl SearchBackend for FixedSearch {
        async fn query(&self, _query: &SearchQuery) -> Result<SearchResponse, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    fn template_response() -> DialogResponse {
        DialogResponse {
            output: Some(OutputPayload {
                text: vec!["Sentiment is {0} across {1} articles ({2} positive, {3} negative)."
                    .to_owned()],
                ..OutputPayload::default()
            }),
            ..DialogResponse::default()
        }
    }

    fn backend_response() -> SearchResponse {
        SearchResponse {
            matching_results: 42,
            results: vec![SearchResult::default(); 3],
            aggregations: vec![
                Aggregation { value: Some(0.45), results: vec![] },
                Aggregation {
                    value: None,
                    results: vec![
                        AggregationBucket { key: "positive".to_owned(), matching_results: 30 },
                        AggregationBucket { key: "negative".to_owned(), matching_results: 7 },
                        AggregationBucket { key: "neutral".to_owned(), matching_results: 5 },
                    ],
                },
            ],
        }
    }

    #[tokio::test]
    async fn substitutes_label_and_counts() {
        let search = FixedSearch(backend_response());
        let mut response = template_response();

        super::apply(&search, "bitcoin", &mut response).await.expect("apply");

        let text = &response.output.expect("output").text;
        assert_eq!(
            text,
            &vec!["Sentiment is very positive across 42 articles (30 positive, 7 negative)."
                .to_owned()]
        );
    }

    #[tokio::test]
    async fn zero_results_appends_fallback_line() {
        let search = FixedSearch(SearchResponse::default());
        let mut response = template_response();

        super::apply(&search, "bitcoin", &mut response).await.expect("apply");

        let text = &response.output.expect("output").text;
        assert_eq!(text.len(), 2);
        assert_eq!(text[1], NO_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn missing_label_buckets_count_zero() {
        let mut data = backend_response();
        data.aggregations[1].results.truncate(1); // keep only "positive"
        let search = FixedSearch(data);
        let mut response = template_response();

        super::apply(&search, "bitcoin", &mut response).await.expect("apply");

        let text = &response.output.expect("output").text;
        assert!(text[0].contains("(30 positive, 0 negative)"));
    }

    #[tokio::test]
    async fn absent_aggregations_classify_neutral() {
        let data = SearchResponse {
            matching_results: 3,
            results: vec![SearchResult::default()],
            aggregations: vec![],
        };
        let search = FixedSearch(data);
        let mut response = template_response();

        super::apply(&search, "bitcoin", &mut response).await.expect("apply");

        let text = &response.output.expect("output").text;
        assert!(text[0].starts_with("Sentiment is neutral"));
    }
}
