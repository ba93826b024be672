use http::StatusCode;
use std::error::Error;
use thiserror::Error;

/// The error type handlers return, boxed so any error can flow through the chain.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Errors raised while the application is being configured.
///
/// These always point at a programming mistake in the application, so callers are
/// expected to abort startup when they see one.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("assertion for param '{param}' is not a valid pattern: {source}")]
    InvalidAssertion {
        param: String,
        #[source]
        source: regex::Error,
    },

    #[error("route path '{path}' compiles to an invalid pattern: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },

    #[error("route path '{path}' declares {params} params but its pattern has {groups} capture groups")]
    ParamGroupMismatch { path: String, params: usize, groups: usize },

    #[error("route path '{path}' has an unclosed group starting at byte {position}")]
    UnbalancedGroup { path: String, position: usize },

    #[error("error code should be greater or equal to 400, got {0}")]
    InvalidErrorCode(u16),

    #[error("the application has already booted")]
    AlreadyBooted,
}

impl ConfigError {
    pub fn invalid_assertion<S: ToString>(param: S, source: regex::Error) -> Self {
        Self::InvalidAssertion { param: param.to_string(), source }
    }

    pub fn invalid_pattern<S: ToString>(path: S, source: regex::Error) -> Self {
        Self::InvalidPattern { path: path.to_string(), source }
    }
}

/// Errors raised while resolving handler arguments for a request.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no value of type {type_name} is registered in the request or application scope")]
    MissingDependency { type_name: &'static str },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },

    #[error("missing path param '{name}'")]
    MissingParam { name: String },
}

impl ExtractError {
    pub fn missing_dependency<T: ?Sized>() -> Self {
        Self::MissingDependency { type_name: std::any::type_name::<T>() }
    }

    pub fn invalid_query<S: ToString>(str: S) -> Self {
        Self::InvalidQuery { reason: str.to_string() }
    }

    /// The response status a failed extraction turns into.
    pub fn status(&self) -> StatusCode {
        match self {
            ExtractError::MissingDependency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ExtractError::InvalidQuery { .. } | ExtractError::MissingParam { .. } => StatusCode::BAD_REQUEST,
        }
    }
}
