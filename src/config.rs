//! Client configuration: where the tournament API lives and how to reach it.

use std::{env, time::Duration};

use thiserror::Error;
use tracing::warn;

/// Environment variable naming the API origin, e.g. `https://tichu.example.com`.
const API_URL_ENV: &str = "TICHU_API_URL";
/// Environment variable holding a default pair code sent when a call supplies none.
const PAIR_CODE_ENV: &str = "TICHU_PAIR_CODE";
/// Environment variable overriding [`DEFAULT_TIMEOUT`], in whole seconds.
const TIMEOUT_ENV: &str = "TICHU_HTTP_TIMEOUT_SECS";
/// Request timeout applied when none is configured.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures raised while assembling a client from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable that was not set.
        var: &'static str,
    },
    /// The configured base URL could not be parsed.
    #[error("invalid API base URL `{url}`")]
    BaseUrl {
        /// The rejected URL text.
        url: String,
        #[source]
        /// Parser failure describing what was wrong.
        source: url::ParseError,
    },
    /// The configured base URL cannot carry path segments (e.g. `data:` URLs).
    #[error("API base URL `{url}` cannot be used as a base")]
    CannotBeABase {
        /// The rejected URL text.
        url: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    HttpClient {
        #[source]
        /// Underlying client builder failure.
        source: reqwest::Error,
    },
}

/// Immutable runtime configuration shared by every service of a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin (and optional path prefix) the `/api/...` routes are joined to.
    pub base_url: String,
    /// Pair code sent on pair-code-capable endpoints when a call supplies none.
    pub pair_code: Option<String>,
    /// Total per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Construct a configuration pointing at the given API origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            pair_code: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attach a default pair code used when a call does not supply its own.
    pub fn with_pair_code(mut self, pair_code: impl Into<String>) -> Self {
        self.pair_code = Some(pair_code.into());
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration by reading the expected environment variables.
    ///
    /// Only the API URL is required; a malformed timeout value is ignored with
    /// a warning rather than failing the whole client.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var(API_URL_ENV).map_err(|_| ConfigError::MissingEnvVar { var: API_URL_ENV })?;

        let mut config = Self::new(base_url);

        if let Ok(pair_code) = env::var(PAIR_CODE_ENV) {
            if !pair_code.is_empty() {
                config = config.with_pair_code(pair_code);
            }
        }

        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(secs) => config = config.with_timeout(Duration::from_secs(secs)),
                Err(err) => {
                    warn!(
                        value = %raw,
                        error = %err,
                        "ignoring unparseable {TIMEOUT_ENV}; keeping default timeout"
                    );
                }
            }
        }

        Ok(config)
    }
}
