use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A request to analyze sentiment for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub keyword: String,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// The trimmed keyword, or `None` when nothing but whitespace was supplied.
    #[must_use]
    pub fn validated_keyword(&self) -> Option<&str> {
        let keyword = self.keyword.trim();
        (!keyword.is_empty()).then_some(keyword)
    }
}

/// Captured result of one analyzer process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Process exit status; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Sentiment report produced from the analyzer's structured payload.
///
/// Counters default to zero when the analyzer omits them. The remaining
/// sections are carried through exactly as the analyzer emitted them; the
/// typed accessors below give a best-effort view for presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub users: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Value>,
    #[serde(
        rename = "wordCloud",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub word_cloud: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Value>,
    /// Any other fields the analyzer emitted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Shape a parsed analyzer payload into a result.
    #[must_use]
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let total_posts = unsigned_counter(payload.remove("total_posts"));
        let upvotes = signed_counter(payload.remove("upvotes"));
        let comments = unsigned_counter(payload.remove("comments"));
        let users = unsigned_counter(payload.remove("users"));

        Self {
            total_posts,
            upvotes,
            comments,
            users,
            sentiment: payload.remove("sentiment"),
            timeline: payload.remove("timeline"),
            word_cloud: payload.remove("wordCloud"),
            hashtags: payload.remove("hashtags"),
            extra: payload,
        }
    }

    #[must_use]
    pub fn sentiment_buckets(&self) -> Vec<SentimentBucket> {
        view(self.sentiment.as_ref())
    }

    #[must_use]
    pub fn timeline_points(&self) -> Vec<TimelinePoint> {
        view(self.timeline.as_ref())
    }

    #[must_use]
    pub fn word_weights(&self) -> Vec<WordWeight> {
        view(self.word_cloud.as_ref())
    }

    #[must_use]
    pub fn top_sources(&self) -> Vec<SourceMention> {
        view(self.hashtags.as_ref())
    }

    /// Engagement counters in display order.
    #[must_use]
    pub fn engagement(&self) -> [EngagementMetric; 4] {
        let clamp = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        [
            EngagementMetric {
                metric: "Posts",
                value: clamp(self.total_posts),
            },
            EngagementMetric {
                metric: "Upvotes",
                value: self.upvotes,
            },
            EngagementMetric {
                metric: "Comments",
                value: clamp(self.comments),
            },
            EngagementMetric {
                metric: "Users",
                value: clamp(self.users),
            },
        ]
    }
}

/// Missing, null, negative and non-numeric values all read as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unsigned_counter(value: Option<Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn signed_counter(value: Option<Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

fn view<T: DeserializeOwned>(section: Option<&Value>) -> Vec<T> {
    section
        .and_then(|v| Vec::<T>::deserialize(v).ok())
        .unwrap_or_default()
}

/// One slice of the overall sentiment distribution (percentages).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentBucket {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimelinePoint {
    pub time: String,
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WordWeight {
    pub text: String,
    pub value: u64,
}

/// A source community and how many collected posts came from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceMention {
    pub name: String,
    pub mentions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngagementMetric {
    pub metric: &'static str,
    pub value: i64,
}

/// Why an analysis could not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    ExecutionFailure,
    ExternalToolFailure,
    MalformedOutput,
    Busy,
    Timeout,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ExecutionFailure => "execution_failure",
            Self::ExternalToolFailure => "external_tool_failure",
            Self::MalformedOutput => "malformed_output",
            Self::Busy => "busy",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned in place of an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct ErrorDescriptor {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDescriptor {
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn invalid_input() -> Self {
        Self::new(ErrorCategory::InvalidInput, "keyword is required")
    }

    #[must_use]
    pub fn execution_failure(details: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::ExecutionFailure,
            "failed to start analysis process",
        )
        .with_details(details)
    }

    /// `stderr` is kept verbatim for diagnosis.
    #[must_use]
    pub fn external_tool_failure(stderr: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ExternalToolFailure, "failed to analyze sentiment")
            .with_details(stderr)
    }

    /// `stdout` is kept verbatim for diagnosis.
    #[must_use]
    pub fn malformed_output(stdout: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::MalformedOutput,
            "failed to parse analysis results",
        )
        .with_details(stdout)
    }

    #[must_use]
    pub fn busy() -> Self {
        Self::new(ErrorCategory::Busy, "analysis capacity exhausted")
    }

    #[must_use]
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, "analysis timed out").with_details(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn whitespace_keyword_is_not_valid() {
        assert_eq!(AnalysisRequest::new("   \t").validated_keyword(), None);
        assert_eq!(AnalysisRequest::new("").validated_keyword(), None);
    }

    #[test]
    fn keyword_is_trimmed() {
        assert_eq!(
            AnalysisRequest::new("  rust lang ").validated_keyword(),
            Some("rust lang")
        );
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let result = AnalysisResult::from_payload(payload(json!({ "total_posts": 5 })));
        assert_eq!(result.total_posts, 5);
        assert_eq!(result.upvotes, 0);
        assert_eq!(result.comments, 0);
        assert_eq!(result.users, 0);
    }

    #[test]
    fn non_numeric_counters_default_to_zero() {
        let result = AnalysisResult::from_payload(payload(json!({
            "total_posts": "many",
            "comments": null,
            "users": -3,
            "upvotes": 12.7
        })));
        assert_eq!(result.total_posts, 0);
        assert_eq!(result.comments, 0);
        assert_eq!(result.users, 0);
        assert_eq!(result.upvotes, 12);
    }

    #[test]
    fn sections_pass_through_unchanged() {
        let timeline = json!([{ "time": "00:00", "positive": 1, "negative": 0, "neutral": 2 }]);
        let result = AnalysisResult::from_payload(payload(json!({
            "timeline": timeline.clone(),
            "wordCloud": "not a list",
            "averageSentiment": 0.4
        })));
        assert_eq!(result.timeline, Some(timeline));
        assert_eq!(result.word_cloud, Some(json!("not a list")));
        assert_eq!(result.extra.get("averageSentiment"), Some(&json!(0.4)));
        assert!(result.word_weights().is_empty());
    }

    #[test]
    fn typed_views_read_well_formed_sections() {
        let result = AnalysisResult::from_payload(payload(json!({
            "sentiment": [
                { "name": "Positive", "value": 50.0, "color": "#10B981" },
                { "name": "Neutral", "value": 30.0 },
                { "name": "Negative", "value": 20.0 }
            ],
            "hashtags": [{ "name": "r/rust", "mentions": 9 }],
            "wordCloud": [{ "text": "borrow", "value": 4 }]
        })));
        let buckets = result.sentiment_buckets();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].color.as_deref(), Some("#10B981"));
        assert!(buckets[1].color.is_none());
        assert_eq!(result.top_sources()[0].mentions, 9);
        assert_eq!(result.word_weights()[0].text, "borrow");
        assert!(result.timeline_points().is_empty());
    }

    #[test]
    fn serialized_result_keeps_analyzer_field_names() {
        let result = AnalysisResult::from_payload(payload(json!({
            "total_posts": 2,
            "wordCloud": [],
            "totalTweets": 2
        })));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["total_posts"], 2);
        assert_eq!(json["totalTweets"], 2);
        assert!(json["wordCloud"].is_array());
        assert!(json.get("sentiment").is_none());
    }

    #[test]
    fn engagement_follows_counters() {
        let result = AnalysisResult {
            total_posts: 3,
            upvotes: -2,
            comments: 7,
            users: 1,
            ..AnalysisResult::default()
        };
        let metrics = result.engagement();
        assert_eq!(metrics[0].metric, "Posts");
        assert_eq!(metrics[0].value, 3);
        assert_eq!(metrics[1].value, -2);
        assert_eq!(metrics[3].metric, "Users");
    }

    #[test]
    fn error_descriptor_serializes_snake_case_category() {
        let json = serde_json::to_value(ErrorDescriptor::external_tool_failure("boom"))
            .expect("serialize");
        assert_eq!(json["category"], "external_tool_failure");
        assert_eq!(json["details"], "boom");

        let json = serde_json::to_value(ErrorDescriptor::invalid_input()).expect("serialize");
        assert!(json.get("details").is_none());
    }
}
