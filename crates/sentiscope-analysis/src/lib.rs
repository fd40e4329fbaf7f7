//! Sentiment analysis orchestration for sentiscope.
//!
//! Runs the external analyzer once per keyword, carves its structured payload
//! out of a noisy stdout stream, and shapes it into an [`AnalysisResult`].
//! Failures come back as an [`ErrorDescriptor`] tagged with the stage that
//! failed. [`ProgressReporter`] provides the cosmetic staged progress shown to
//! callers while a request is in flight.

pub mod error;
pub mod extract;
pub mod invoker;
pub mod progress;
pub mod service;
pub mod types;

pub use error::{ExtractError, InvokeError};
pub use extract::{extract, extract_framed};
pub use invoker::{Invoker, ProcessInvoker};
pub use progress::{Checkpoint, ProgressReporter, ProgressSchedule, ProgressState};
pub use service::AnalysisService;
pub use types::{
    AnalysisRequest, AnalysisResult, EngagementMetric, ErrorCategory, ErrorDescriptor,
    ProcessOutcome, SentimentBucket, SourceMention, TimelinePoint, WordWeight,
};
