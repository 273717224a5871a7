//! AML risk API adapter (reqwest).
//!
//! `GET {base_url}/check/address/{address}` and `GET {base_url}/check/transaction/{hash}`
//! with a static bearer key. One request per call, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use amlbot_core::{domain::CheckResult, errors::Error, ports::AmlProvider, Result};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct AmlApiClient {
    api_key: String,
    base_url: Url,
    http: reqwest::Client,
}

/// Upstream body; unknown fields (e.g. the echoed `address`) are ignored.
/// `details` is either a list or a single string depending on the provider.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    is_suspicious: bool,
    risk_score: f64,
    #[serde(default)]
    details: Details,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Details {
    Many(Vec<String>),
    One(String),
}

impl Default for Details {
    fn default() -> Self {
        Details::Many(Vec::new())
    }
}

impl Details {
    /// First entry, or an empty string when the provider sent none.
    fn first(self) -> String {
        match self {
            Details::Many(v) => v.into_iter().next().unwrap_or_default(),
            Details::One(s) => s,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum CheckKind {
    Address,
    Transaction,
}

impl CheckKind {
    fn path_segment(self) -> &'static str {
        match self {
            CheckKind::Address => "address",
            CheckKind::Transaction => "transaction",
        }
    }
}

impl AmlApiClient {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        Self::with_timeout(api_key, base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid AML base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "invalid AML base URL {base_url}: cannot be a base"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            http,
        })
    }

    /// `{base}/check/{kind}/{id}`, with `id` percent-encoded as a single path segment.
    fn check_url(&self, kind: CheckKind, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["check", kind.path_segment(), id]);
        }
        url
    }

    async fn check(&self, kind: CheckKind, id: &str) -> Result<CheckResult> {
        let url = self.check_url(kind, id);
        tracing::debug!(kind = kind.path_segment(), id = %id, "AML check request");

        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(kind = kind.path_segment(), id = %id, error = %e, "AML request failed");
                Error::Upstream(format!("request failed: {}", describe_reqwest_error(&e)))
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            tracing::warn!(
                kind = kind.path_segment(),
                id = %id,
                status = status.as_u16(),
                body = %excerpt,
                "AML API returned non-200 status"
            );
            return Err(Error::Upstream(format!(
                "unexpected status code: {}",
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("failed to read response body: {e}")))?;
        let parsed: CheckResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("failed to parse response: {e}")))?;

        Ok(CheckResult {
            is_suspicious: parsed.is_suspicious,
            risk_score: parsed.risk_score,
            details: parsed.details.first(),
        })
    }
}

// reqwest's Display includes the full URL; keep user-facing text to the failure class.
fn describe_reqwest_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "network error"
    }
}

#[async_trait]
impl AmlProvider for AmlApiClient {
    async fn check_address(&self, address: &str) -> Result<CheckResult> {
        if address.trim().is_empty() {
            return Err(Error::InvalidInput("address cannot be empty".to_string()));
        }
        self.check(CheckKind::Address, address.trim()).await
    }

    async fn check_transaction(&self, tx_hash: &str) -> Result<CheckResult> {
        if tx_hash.trim().is_empty() {
            return Err(Error::InvalidInput(
                "transaction hash cannot be empty".to_string(),
            ));
        }
        self.check(CheckKind::Transaction, tx_hash.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client(server: &ServerGuard) -> AmlApiClient {
        AmlApiClient::new("test-key", &server.url()).unwrap()
    }

    #[tokio::test]
    async fn empty_identifiers_are_rejected_without_a_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let c = client(&server);
        assert!(matches!(
            c.check_address("").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            c.check_address("   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            c.check_transaction("").await,
            Err(Error::InvalidInput(_))
        ));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn address_check_sends_bearer_key_and_parses_list_details() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/check/address/0xabc")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"address":"0xabc","is_suspicious":false,"risk_score":0.1,"details":["clean","second"]}"#)
            .create_async()
            .await;

        let result = client(&server).check_address("0xabc").await.unwrap();
        assert_eq!(
            result,
            CheckResult {
                is_suspicious: false,
                risk_score: 0.1,
                details: "clean".to_string(),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transaction_check_accepts_string_details() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/check/transaction/0xdef")
            .with_status(200)
            .with_body(r#"{"is_suspicious":true,"risk_score":0.8,"details":"high risk"}"#)
            .create_async()
            .await;

        let result = client(&server).check_transaction("0xdef").await.unwrap();
        assert!(result.is_suspicious);
        assert_eq!(result.risk_score, 0.8);
        assert_eq!(result.details, "high risk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_or_missing_details_become_empty_string() {
        let mut server = Server::new_async().await;
        let _empty = server
            .mock("GET", "/check/address/0x1")
            .with_status(200)
            .with_body(r#"{"is_suspicious":false,"risk_score":0.0,"details":[]}"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/check/address/0x2")
            .with_status(200)
            .with_body(r#"{"is_suspicious":false,"risk_score":0.0}"#)
            .create_async()
            .await;

        let c = client(&server);
        assert_eq!(c.check_address("0x1").await.unwrap().details, "");
        assert_eq!(c.check_address("0x2").await.unwrap().details, "");
    }

    #[tokio::test]
    async fn non_200_status_is_upstream_error() {
        let mut server = Server::new_async().await;
        for (id, status) in [("0xa", 201), ("0xb", 404), ("0xc", 500)] {
            server
                .mock("GET", format!("/check/address/{id}").as_str())
                .with_status(status)
                .with_body(r#"{"is_suspicious":false,"risk_score":0.0,"details":[]}"#)
                .create_async()
                .await;
        }

        let c = client(&server);
        for (id, status) in [("0xa", 201), ("0xb", 404), ("0xc", 500)] {
            let err = c.check_address(id).await.unwrap_err();
            assert!(
                matches!(err, Error::Upstream(ref m) if m == &format!("unexpected status code: {status}")),
                "{id}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/check/address/0xbad")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;
        server
            .mock("GET", "/check/address/0xschema")
            .with_status(200)
            .with_body(r#"{"risk_score":"high"}"#)
            .create_async()
            .await;

        let c = client(&server);
        assert!(matches!(c.check_address("0xbad").await, Err(Error::Decode(_))));
        assert!(matches!(
            c.check_address("0xschema").await,
            Err(Error::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_upstream_error() {
        // Port 9 (discard) on localhost is not expected to accept connections here.
        let c = AmlApiClient::with_timeout("k", "http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            c.check_address("0xabc").await,
            Err(Error::Upstream(_))
        ));
    }

    #[test]
    fn builds_urls_under_base_path() {
        let c = AmlApiClient::new("k", "https://aml.example.com/api/v1/").unwrap();
        assert_eq!(
            c.check_url(CheckKind::Address, "0xabc").as_str(),
            "https://aml.example.com/api/v1/check/address/0xabc"
        );
        assert_eq!(
            c.check_url(CheckKind::Transaction, "a/b?c").as_str(),
            "https://aml.example.com/api/v1/check/transaction/a%2Fb%3Fc"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            AmlApiClient::new("k", "not a url"),
            Err(Error::Config(_))
        ));
    }
}
