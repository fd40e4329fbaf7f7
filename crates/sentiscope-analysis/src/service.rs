//! Analysis orchestration: validate, invoke, extract, shape.

use std::time::Duration;

use sentiscope_core::AppConfig;
use tokio::sync::Semaphore;

use crate::error::InvokeError;
use crate::extract::extract_framed;
use crate::invoker::{Invoker, ProcessInvoker};
use crate::types::{AnalysisRequest, AnalysisResult, ErrorDescriptor};

const DEFAULT_MAX_CONCURRENT: usize = 4;
const DEFAULT_QUEUE_WAIT: Duration = Duration::from_secs(30);

/// Runs one analyzer process per request and turns its output into an
/// [`AnalysisResult`] or an [`ErrorDescriptor`].
///
/// At most `max_concurrent` analyzer processes run at once. Further requests
/// queue in arrival order for up to `queue_wait` and are then rejected as
/// [`ErrorCategory::Busy`](crate::ErrorCategory::Busy). Nothing is retried.
#[derive(Debug)]
pub struct AnalysisService<I> {
    invoker: I,
    permits: Semaphore,
    queue_wait: Duration,
    result_marker: Option<String>,
}

impl AnalysisService<ProcessInvoker> {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(ProcessInvoker::from_config(config))
            .with_max_concurrent(config.max_concurrent_analyses)
            .with_queue_wait(config.queue_wait())
            .with_result_marker(config.result_marker.clone())
    }
}

impl<I: Invoker> AnalysisService<I> {
    #[must_use]
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            permits: Semaphore::new(DEFAULT_MAX_CONCURRENT),
            queue_wait: DEFAULT_QUEUE_WAIT,
            result_marker: None,
        }
    }

    /// Clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Semaphore::new(max_concurrent.clamp(1, Semaphore::MAX_PERMITS));
        self
    }

    #[must_use]
    pub fn with_queue_wait(mut self, queue_wait: Duration) -> Self {
        self.queue_wait = queue_wait;
        self
    }

    #[must_use]
    pub fn with_result_marker(mut self, marker: Option<String>) -> Self {
        self.result_marker = marker;
        self
    }

    /// Analyze one keyword end to end.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorDescriptor`] whose category says which stage failed:
    /// empty keyword, process could not start, nonzero exit (details carry
    /// stderr), unparseable output (details carry raw stdout), queue wait
    /// exceeded, or analyzer timeout.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ErrorDescriptor> {
        let Some(keyword) = request.validated_keyword() else {
            tracing::warn!("rejecting analysis request without a keyword");
            return Err(ErrorDescriptor::invalid_input());
        };

        let _permit = match tokio::time::timeout(self.queue_wait, self.permits.acquire()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(
                    keyword,
                    queue_wait = ?self.queue_wait,
                    "no analysis slot became free; rejecting request"
                );
                return Err(ErrorDescriptor::busy());
            }
        };

        tracing::info!(keyword, "analyzing sentiment");

        let outcome = match self.invoker.invoke(keyword).await {
            Ok(outcome) => outcome,
            Err(err @ InvokeError::TimedOut { .. }) => {
                tracing::error!(keyword, error = %err, "analyzer timed out");
                return Err(ErrorDescriptor::timeout(err.to_string()));
            }
            Err(err) => {
                tracing::error!(keyword, error = %err, "analyzer could not be run");
                return Err(ErrorDescriptor::execution_failure(err.to_string()));
            }
        };

        if !outcome.succeeded() {
            tracing::error!(
                keyword,
                exit_code = outcome.exit_code,
                stderr = %outcome.stderr,
                "analyzer exited with failure"
            );
            return Err(ErrorDescriptor::external_tool_failure(outcome.stderr));
        }

        let payload = match extract_framed(&outcome.stdout, self.result_marker.as_deref()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(keyword, error = %err, "failed to parse analyzer output");
                tracing::debug!(keyword, raw = %outcome.stdout, "raw analyzer output");
                return Err(ErrorDescriptor::malformed_output(outcome.stdout));
            }
        };

        let result = AnalysisResult::from_payload(payload);
        tracing::info!(
            keyword,
            total_posts = result.total_posts,
            "analysis completed"
        );
        Ok(result)
    }
}
