//! HTTP client for a running sentiscope server.

use reqwest::StatusCode;
use sentiscope_analysis::{AnalysisRequest, AnalysisResult, ErrorCategory, ErrorDescriptor};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SuccessEnvelope {
    data: AnalysisResult,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct AnalyzeClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalyzeClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub(crate) fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sentiscope-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `POST {base_url}/api/analyze`, unwrapping the response envelope.
    ///
    /// Transport failures surface as [`ErrorCategory::ExecutionFailure`]; a
    /// success body that does not hold a result is
    /// [`ErrorCategory::MalformedOutput`].
    pub(crate) async fn analyze(&self, keyword: &str) -> Result<AnalysisResult, ErrorDescriptor> {
        let url = format!("{}/api/analyze", self.base_url);
        tracing::debug!(%url, keyword, "requesting remote analysis");

        let response = self
            .http
            .post(&url)
            .json(&AnalysisRequest::new(keyword))
            .send()
            .await
            .map_err(|e| ErrorDescriptor::execution_failure(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ErrorDescriptor::execution_failure(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str::<SuccessEnvelope>(&body)
                .map(|envelope| envelope.data)
                .map_err(|_| ErrorDescriptor::malformed_output(body));
        }

        tracing::debug!(%status, "remote analysis failed");
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(ErrorEnvelope { error }) => {
                let descriptor =
                    ErrorDescriptor::new(category_for(&error.code, status), error.message);
                Err(match error.details {
                    Some(details) => descriptor.with_details(details),
                    None => descriptor,
                })
            }
            Err(_) => Err(ErrorDescriptor::new(
                category_for_status(status),
                format!("server responded with {status}"),
            )
            .with_details(body)),
        }
    }
}

fn category_for(code: &str, status: StatusCode) -> ErrorCategory {
    match code {
        "validation_error" | "bad_request" => ErrorCategory::InvalidInput,
        other => serde_json::from_value(serde_json::Value::String(other.to_string()))
            .unwrap_or_else(|_| category_for_status(status)),
    }
}

fn category_for_status(status: StatusCode) -> ErrorCategory {
    match status {
        StatusCode::BAD_REQUEST => ErrorCategory::InvalidInput,
        StatusCode::SERVICE_UNAVAILABLE => ErrorCategory::Busy,
        StatusCode::GATEWAY_TIMEOUT => ErrorCategory::Timeout,
        _ => ErrorCategory::ExternalToolFailure,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(server: &MockServer) -> AnalyzeClient {
        AnalyzeClient::new(&server.uri()).expect("failed to build test client")
    }

    #[tokio::test]
    async fn unwraps_result_from_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .and(body_json(json!({"keyword": "rust"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "total_posts": 10,
                    "upvotes": 420,
                    "comments": 37,
                    "users": 9,
                    "hashtags": [{"name": "r/rust", "mentions": 8}]
                },
                "meta": {"request_id": "abc", "timestamp": "2026-01-01T00:00:00Z"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server)
            .analyze("rust")
            .await
            .expect("expected Ok");

        assert_eq!(result.total_posts, 10);
        assert_eq!(result.upvotes, 420);
        assert_eq!(result.top_sources()[0].name, "r/rust");
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            AnalyzeClient::new(&format!("{}/", server.uri())).expect("failed to build client");
        let result = client.analyze("rust").await.expect("expected Ok");

        assert_eq!(result, AnalysisResult::default());
    }

    #[tokio::test]
    async fn error_envelope_keeps_category_and_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {
                    "code": "external_tool_failure",
                    "message": "failed to analyze sentiment",
                    "details": "Reddit API is required"
                },
                "meta": {"request_id": "abc", "timestamp": "2026-01-01T00:00:00Z"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).analyze("rust").await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::ExternalToolFailure);
        assert_eq!(err.message, "failed to analyze sentiment");
        assert_eq!(err.details.as_deref(), Some("Reddit API is required"));
    }

    #[tokio::test]
    async fn validation_error_maps_to_invalid_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": "validation_error", "message": "keyword is required"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).analyze(" ").await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::InvalidInput);
        assert!(err.details.is_none());
    }

    #[tokio::test]
    async fn non_envelope_error_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let err = test_client(&server).analyze("rust").await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::Busy);
        assert_eq!(err.details.as_deref(), Some("upstream overloaded"));
    }

    #[tokio::test]
    async fn success_without_envelope_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = test_client(&server).analyze("rust").await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::MalformedOutput);
        assert_eq!(err.details.as_deref(), Some("<html>proxy</html>"));
    }

    #[tokio::test]
    async fn unreachable_server_is_execution_failure() {
        // Port 9 (discard) is closed on test hosts.
        let client = AnalyzeClient::new("http://127.0.0.1:9").expect("client");

        let err = client.analyze("rust").await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::ExecutionFailure);
    }
}
