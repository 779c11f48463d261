//! HTTP review source backed by `reqwest`.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use review_core::review::check_star_rating;
use review_core::{FilterCriteria, Review, ReviewError, ReviewId, ReviewQuery, ReviewResult};

use crate::config::SourceConfig;
use crate::endpoint::Endpoint;
use crate::retry::AttemptFailure;
use crate::source::{
    check_analysis_text, HelpfulAck, RatingAck, ReviewSource, ReviewStats, SupportedLanguage,
    TextAnalysis,
};
use crate::timeout::TimeoutConfig;
use crate::wire::{AckEnvelope, AnalyzeEnvelope, EnvelopeStatus, LanguagesResponse, ReviewsEnvelope, WireStats};

/// Review source talking to the review service over HTTP.
///
/// Reads are retried on connection errors, timeouts and 5xx responses
/// according to the configured policy. Writes and analysis are sent once.
#[derive(Debug)]
pub struct HttpReviewSource {
    client: Client,
    config: SourceConfig,
}

impl HttpReviewSource {
    /// Create a new source.
    ///
    /// Fails if an API key cannot be sent as a header value.
    pub fn new(config: SourceConfig) -> ReviewResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.api_keys.headers() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ReviewError::validation(format!("invalid header name {}", name)))?;
            let value = HeaderValue::from_str(value.trim()).map_err(|_| {
                ReviewError::validation(format!("{} contains characters not allowed in a header", name))
            })?;
            headers.insert(header, value);
        }

        let connect = config.timeout.unwrap_or_default().connect;
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(connect)
            .build()
            .map_err(|e| ReviewError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Send a request, retrying per the endpoint's policy, and return the
    /// body of the first successful response.
    async fn send<F>(&self, endpoint: Endpoint, build: F) -> ReviewResult<String>
    where
        F: Fn(&Client, &str) -> RequestBuilder + Send + Sync,
    {
        let policy = self.config.policy_for(endpoint);
        let url = self.config.url(endpoint);
        let mut attempt = 0u32;

        loop {
            let started = Instant::now();
            debug!(%endpoint, attempt, "sending request");
            let result = build(&self.client, &url)
                .timeout(policy.timeout.total)
                .send()
                .await;

            let reason = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .map_err(|e| transport_error(endpoint, &policy.timeout, e))?;
                        debug!(
                            %endpoint,
                            status = status.as_u16(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "request completed"
                        );
                        return Ok(body);
                    }

                    let code = status.as_u16();
                    if !policy.retry.should_retry(AttemptFailure::Status(code), attempt) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(status_error(code, status.canonical_reason(), &body));
                    }
                    format!("HTTP {}", code)
                }
                Err(e) => {
                    let failure = if e.is_timeout() {
                        AttemptFailure::Timeout
                    } else if e.is_connect() {
                        AttemptFailure::Connect
                    } else {
                        AttemptFailure::Other
                    };
                    if !policy.retry.should_retry(failure, attempt) {
                        return Err(transport_error(endpoint, &policy.timeout, e));
                    }
                    e.to_string()
                }
            };

            let delay = policy.retry.backoff.delay_after(attempt);
            warn!(%endpoint, attempt, reason = %reason, delay_ms = delay.as_millis() as u64, "retrying request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, String)],
    ) -> ReviewResult<T> {
        let body = self
            .send(endpoint, |client, url| client.get(url).query(query))
            .await?;
        decode(endpoint, &body)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: &serde_json::Value,
    ) -> ReviewResult<T> {
        let body = self
            .send(endpoint, |client, url| client.post(url).json(payload))
            .await?;
        decode(endpoint, &body)
    }
}

#[async_trait]
impl ReviewSource for HttpReviewSource {
    async fn fetch_stats(&self) -> ReviewResult<ReviewStats> {
        let stats: WireStats = self.get_json(Endpoint::Stats, &[]).await?;
        stats.into_stats()
    }

    async fn fetch_reviews(&self, criteria: &FilterCriteria) -> ReviewResult<Vec<Review>> {
        let query = ReviewQuery::new(criteria.clone());
        let fetched_at = Utc::now();
        let envelope: ReviewsEnvelope = self
            .get_json(Endpoint::Reviews, &query.to_query_pairs())
            .await?;
        let received = envelope.into_reviews(fetched_at)?;

        // The service may ignore some parameters; the local predicate is
        // authoritative.
        let received_len = received.len();
        let reviews = query.apply_owned(received);
        if reviews.len() != received_len {
            debug!(
                received = received_len,
                kept = reviews.len(),
                "dropped reviews outside the requested criteria"
            );
        }
        Ok(reviews)
    }

    async fn submit_rating(&self, review_id: &ReviewId, rating: i64) -> ReviewResult<RatingAck> {
        let rating = check_star_rating(rating)?;
        let payload = json!({ "reviewId": review_id.to_json(), "rating": rating });
        let ack: AckEnvelope = self.post_json(Endpoint::Rate, &payload).await?;
        ack.status.check()?;
        Ok(RatingAck {
            review_id: review_id.clone(),
            rating,
        })
    }

    async fn analyze_text(&self, text: &str, language: &str) -> ReviewResult<TextAnalysis> {
        check_analysis_text(text)?;
        let payload = json!({ "text": text, "language": language });
        let envelope: AnalyzeEnvelope = self.post_json(Endpoint::Analyze, &payload).await?;
        envelope.into_analysis(language)
    }

    async fn mark_helpful(&self, review_id: &ReviewId, increment: bool) -> ReviewResult<HelpfulAck> {
        let payload = json!({ "reviewId": review_id.to_json(), "increment": increment });
        let ack: AckEnvelope = self.post_json(Endpoint::Helpful, &payload).await?;
        ack.status.check()?;
        Ok(HelpfulAck {
            review_id: review_id.clone(),
            increment,
        })
    }

    async fn fetch_languages(&self) -> ReviewResult<Vec<SupportedLanguage>> {
        let languages: LanguagesResponse = self.get_json(Endpoint::Languages, &[]).await?;
        Ok(languages)
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> ReviewResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ReviewError::parse(format!("unexpected response from {}: {}", endpoint, e)))
}

/// Map a non-success status, taking the message from a JSON error body
/// when there is one.
fn status_error(status: u16, reason: Option<&str>, body: &str) -> ReviewError {
    let message = serde_json::from_str::<EnvelopeStatus>(body)
        .ok()
        .and_then(|env| env.message())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());
    ReviewError::http_status(status, message)
}

fn transport_error(endpoint: Endpoint, timeout: &TimeoutConfig, e: reqwest::Error) -> ReviewError {
    if e.is_timeout() {
        ReviewError::network(format!(
            "{} timed out after {}ms",
            endpoint,
            timeout.total.as_millis()
        ))
    } else if e.is_decode() {
        ReviewError::parse(format!("unreadable response from {}: {}", endpoint, e))
    } else {
        ReviewError::network(format!("{} failed: {}", endpoint, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_envelope_message() {
        let err = status_error(
            400,
            Some("Bad Request"),
            r#"{"success": false, "error": "Invalid rating data"}"#,
        );
        assert_eq!(err, ReviewError::http_status(400, "Invalid rating data"));
    }

    #[test]
    fn test_status_error_falls_back_to_reason() {
        let err = status_error(503, Some("Service Unavailable"), "<html>down</html>");
        assert_eq!(err, ReviewError::http_status(503, "Service Unavailable"));
    }

    #[test]
    fn test_rejects_keys_that_are_not_header_safe() {
        let config = SourceConfig::default().with_api_keys(crate::config::ApiKeys {
            sentiment: "bad\nkey".to_string(),
            ..Default::default()
        });
        assert!(HttpReviewSource::new(config).unwrap_err().is_validation());
    }
}
