use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Executable launched once per analysis request.
    pub analyzer_program: String,
    /// Arguments placed before the keyword (typically the analyzer script path).
    pub analyzer_args: Vec<String>,
    /// `0` disables the timeout.
    pub analysis_timeout_secs: u64,
    pub max_concurrent_analyses: usize,
    pub queue_wait_secs: u64,
    /// Line prefix marking the structured payload on the analyzer's stdout.
    pub result_marker: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn analysis_timeout(&self) -> Option<Duration> {
        (self.analysis_timeout_secs > 0)
            .then_some(Duration::from_secs(self.analysis_timeout_secs))
    }

    #[must_use]
    pub fn queue_wait(&self) -> Duration {
        Duration::from_secs(self.queue_wait_secs)
    }
}
