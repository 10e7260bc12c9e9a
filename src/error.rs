//! Error taxonomy: internal API failures and the uniform rejection callers see.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

/// Convenient result alias for operations that reject with [`Rejection`].
pub type ClientResult<T> = Result<T, Rejection>;

/// Internal result alias used by the transport and parsing layers.
pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Headline used for every structurally-invalid server response.
const INVALID_RESPONSE: &str = "Invalid response from server";

/// Failures raised while talking to the tournament API.
///
/// These carry full diagnostics for logging; callers only ever see the
/// [`Rejection`] each one is normalized into.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    /// A request could not be sent or produced no HTTP response at all.
    #[error("failed to reach the server for `{path}`")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("unexpected response status {status} for `{path}`")]
    Status {
        path: String,
        status: StatusCode,
        /// Raw response body, kept for the rejection detail fallback.
        body: String,
    },
    /// A success response could not be decoded as JSON of the expected shape.
    #[error("failed to decode response from `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A decoded payload violated the documented shape.
    #[error("malformed response from `{path}`")]
    Shape {
        path: String,
        #[source]
        source: ShapeError,
    },
}

/// A payload field that failed validation after JSON decoding.
///
/// `context` names the offending field the way the payload nests it
/// (e.g. `movement round[2] hand[0]`), `problem` says what was wrong.
#[derive(Debug, Error)]
#[error("{context} {problem}")]
pub(crate) struct ShapeError {
    pub context: String,
    pub problem: String,
}

impl ShapeError {
    /// Shape violation described by a free-form problem sentence.
    pub fn new(context: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            problem: problem.into(),
        }
    }

    /// Shape violation where a field held the wrong kind of value.
    pub fn wrong_type(context: impl Into<String>, expected: &str, found: &str) -> Self {
        Self::new(context, format!("was {found}, not {expected}"))
    }
}

/// How a 403 from an endpoint should be interpreted.
///
/// Pair-code-protected endpoints surface 403 as an ordinary failure (a wrong
/// code is not a login problem); director-session endpoints bounce to login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForbiddenHandling {
    /// Treat 403 like 401 and set the redirect flag.
    Redirect,
    /// Treat 403 as a normal server error.
    Surface,
}

/// Error body shape the server uses for all failure statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Uniform failure surfaced by every service operation.
///
/// Mirrors what the scoring front ends consume: a flag telling the caller to
/// send the user through the login flow, a short headline, and a longer
/// detail sentence. Nothing else about the underlying failure leaks out; the
/// precise cause is logged when the rejection is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}: {detail}")]
pub struct Rejection {
    /// Whether the caller should re-authenticate before retrying.
    pub redirect_to_login: bool,
    /// Short headline suitable for a dialog title.
    pub error: String,
    /// Longer explanation suitable for a dialog body.
    pub detail: String,
}

impl Rejection {
    /// Rejection that does not ask for a login, with the given texts.
    pub(crate) fn plain(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            redirect_to_login: false,
            error: error.into(),
            detail: detail.into(),
        }
    }

    /// Normalize an internal failure into the uniform rejection shape,
    /// logging the full diagnostics on the way.
    ///
    /// `malformed_detail` is the per-endpoint sentence shown when the server
    /// responded successfully but the payload was not what it should be.
    pub(crate) fn from_api(
        err: ApiError,
        forbidden: ForbiddenHandling,
        malformed_detail: &str,
    ) -> Self {
        match err {
            ApiError::Status { path, status, body } => {
                error!(path = %path, status = %status, body = %body, "got error calling the tournament API");
                let redirect_to_login = status == StatusCode::UNAUTHORIZED
                    || (forbidden == ForbiddenHandling::Redirect
                        && status == StatusCode::FORBIDDEN);
                let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
                let server_texts = parsed.and_then(|b| match (b.error, b.detail) {
                    (Some(error), Some(detail)) if !error.is_empty() && !detail.is_empty() => {
                        Some((error, detail))
                    }
                    _ => None,
                });
                let (error, detail) = server_texts.unwrap_or_else(|| {
                    let reason = status.canonical_reason().unwrap_or("Unknown Error");
                    (format!("{reason} ({})", status.as_u16()), body)
                });
                Self {
                    redirect_to_login,
                    error,
                    detail,
                }
            }
            ApiError::Transport { path, source } => {
                error!(path = %path, error = %source, "could not reach the tournament API");
                Self::plain(
                    "Client Error",
                    "Something unexpectedly went wrong when talking to the server...",
                )
            }
            ApiError::Decode { path, source } => {
                error!(path = %path, error = %source, "malformed response from the tournament API");
                Self::plain(INVALID_RESPONSE, malformed_detail)
            }
            ApiError::Shape { path, source } => {
                error!(path = %path, error = %source, "malformed response from the tournament API");
                Self::plain(INVALID_RESPONSE, malformed_detail)
            }
        }
    }
}
