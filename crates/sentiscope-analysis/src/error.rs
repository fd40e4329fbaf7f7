use std::time::Duration;

use thiserror::Error;

/// Failures raised while running the external analysis process.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The executable could not be launched at all (missing binary, permissions).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started but collecting its output failed.
    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived the configured timeout and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Failures locating or parsing the structured payload in analyzer output.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in analyzer output")]
    NoPayload,

    #[error("analyzer payload is not a valid JSON object: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
