//! Vocabulary file download with content negotiation and a per-fetch
//! deadline.
//!
//! A fetch never returns an error: every outcome, including transport
//! failures and deadline expiry, is folded into [`FetchOutcome`] so the
//! pipeline can record it per vocabulary without special cases.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header;
use tokio::time::timeout;

/// `Accept` negotiation preferring the supported serializations.
pub const ACCEPT: &str = "text/turtle, application/trig;q=0.9, application/n-triples;q=0.9, application/n-quads;q=0.8, */*;q=0.1";

/// Everything the pipeline needs to know about one fetch attempt.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub succeeded: bool,
    /// HTTP status, or 0 when the request never produced a response.
    pub http_status: u16,
    pub declared_content_type: Option<String>,
    pub body: Option<String>,
    /// Final URL after redirects; equals the request URL on transport
    /// failure.
    pub resolved_url: String,
    pub error_message: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchOutcome {
    fn failure(url: &str, http_status: u16, message: String, fetched_at: DateTime<Utc>) -> Self {
        Self {
            succeeded: false,
            http_status,
            declared_content_type: None,
            body: None,
            resolved_url: url.to_string(),
            error_message: Some(message),
            fetched_at,
        }
    }
}

/// Fetches a vocabulary file, following redirects, bounded by
/// `deadline` for the whole request including the body read.
pub async fn fetch_vocabulary(client: &Client, url: &str, deadline: Duration) -> FetchOutcome {
    let fetched_at = Utc::now();

    let request = client.get(url).header(header::ACCEPT, ACCEPT).send();
    let response = match timeout(deadline, request).await {
        Err(_) => {
            return FetchOutcome::failure(
                url,
                0,
                format!("fetch timed out after {}s", deadline.as_secs()),
                fetched_at,
            );
        }
        Ok(Err(err)) => {
            return FetchOutcome::failure(url, 0, format!("request failed: {err}"), fetched_at);
        }
        Ok(Ok(response)) => response,
    };

    let status = response.status();
    let resolved_url = response.url().to_string();
    let declared_content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if !status.is_success() {
        return FetchOutcome {
            succeeded: false,
            http_status: status.as_u16(),
            declared_content_type,
            body: None,
            resolved_url,
            error_message: Some(format!("server returned {status}")),
            fetched_at,
        };
    }

    let body = match timeout(deadline, response.text()).await {
        Err(_) => {
            return FetchOutcome::failure(
                &resolved_url,
                status.as_u16(),
                format!("body read timed out after {}s", deadline.as_secs()),
                fetched_at,
            );
        }
        Ok(Err(err)) => {
            return FetchOutcome::failure(
                &resolved_url,
                status.as_u16(),
                format!("body read failed: {err}"),
                fetched_at,
            );
        }
        Ok(Ok(body)) => body,
    };

    FetchOutcome {
        succeeded: true,
        http_status: status.as_u16(),
        declared_content_type,
        body: Some(body),
        resolved_url,
        error_message: None,
        fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn successful_fetch_records_status_type_and_resolved_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v.ttl");
                then.status(200)
                    .header("content-type", "text/turtle")
                    .body("<a> <b> <c> .");
            })
            .await;

        let client = Client::new();
        let outcome =
            fetch_vocabulary(&client, &server.url("/v.ttl"), Duration::from_secs(5)).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.http_status, 200);
        assert_eq!(outcome.declared_content_type.as_deref(), Some("text/turtle"));
        assert_eq!(outcome.body.as_deref(), Some("<a> <b> <c> ."));
        assert!(outcome.resolved_url.ends_with("/v.ttl"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_recorded_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.ttl");
                then.status(404);
            })
            .await;

        let client = Client::new();
        let outcome =
            fetch_vocabulary(&client, &server.url("/gone.ttl"), Duration::from_secs(5)).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.http_status, 404);
        assert!(outcome.body.is_none());
        assert!(outcome.error_message.is_some());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_failure_with_status_zero() {
        let client = Client::new();
        // Port 1 on loopback; nothing listens there.
        let outcome = fetch_vocabulary(
            &client,
            "http://127.0.0.1:1/never.ttl",
            Duration::from_secs(2),
        )
        .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.http_status, 0);
        assert!(outcome.error_message.is_some());
    }
}
