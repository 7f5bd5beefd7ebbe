// Domain errors - Error types for the acquisition/transcode pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a fetcher for a single selector attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The selector cannot be satisfied by the source; the cascade may relax it
    #[error("Requested format is not available: {selector}")]
    SelectorUnavailable { selector: String },

    /// The fetch observed cancellation and stopped
    #[error("Fetch cancelled")]
    Cancelled,

    /// Any other fetch failure (network, tool crash, ...)
    #[error("{message}")]
    Failed { message: String },
}

/// Errors produced while running an acquisition operation
#[derive(Error, Debug)]
pub enum OperationError {
    /// The user cancelled the operation
    #[error("Operation cancelled by user")]
    UserCancelled,

    /// The user declined to overwrite or rename an existing output file
    #[error("Operation cancelled: existing file was kept")]
    ConflictCancelled,

    /// Every selector tier failed and the user declined the compromise
    #[error("No downloadable format matched the selection")]
    SelectorExhausted,

    /// Container/codec combination rejected before any process was spawned
    #[error("Incompatible settings: {0}")]
    Compatibility(String),

    /// The request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Fragment range resolves to an empty or negative duration
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// The external fetcher failed
    #[error("Download failed: {message}")]
    FetchFailed { message: String },

    /// The external prober failed
    #[error("Media probe failed: {message}")]
    ProbeFailed { message: String },

    /// The external transcode engine failed
    #[error("Transcode failed: {message}")]
    TranscodeFailed { message: String },

    /// A rename, backup or delete could not be performed
    #[error("Filesystem error on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker thread could not be started
    #[error("Worker thread failed: {0}")]
    Worker(String),

    /// The confirmation peer went away without answering
    #[error("Confirmation channel unavailable: {0}")]
    ConfirmationUnavailable(String),
}

impl OperationError {
    /// Wrap an I/O failure on a specific path
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OperationError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Terminal outcomes that never reach a generic error dialog
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            OperationError::UserCancelled | OperationError::ConflictCancelled
        )
    }

    /// Configuration problems caught before any work started
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OperationError::Compatibility(_)
                | OperationError::InvalidRequest(_)
                | OperationError::InvalidFragment(_)
        )
    }

    /// Best-effort user-facing category for runtime failures
    pub fn category(&self) -> ErrorCategory {
        match self {
            OperationError::FetchFailed { message }
            | OperationError::ProbeFailed { message }
            | OperationError::TranscodeFailed { message } => ErrorCategory::classify(message),
            _ => ErrorCategory::Unclassified,
        }
    }

    /// Message shown to the user: a friendly summary when the raw text is recognised,
    /// the verbatim error otherwise
    pub fn user_message(&self) -> String {
        match self.category().summary() {
            Some(summary) => format!("{} ({})", summary, self),
            None => self.to_string(),
        }
    }
}

impl From<FetchError> for OperationError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => OperationError::UserCancelled,
            other => OperationError::FetchFailed {
                message: other.to_string(),
            },
        }
    }
}

/// User-facing failure categories derived from raw tool output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NetworkTimeout,
    NetworkUnreachable,
    RateLimited,
    AuthenticationRequired,
    MissingTool,
    Unclassified,
}

const TIMEOUT_MARKERS: &[&str] = &["timed out", "timeout", "read operation timed"];
const UNREACHABLE_MARKERS: &[&str] = &[
    "unable to download webpage",
    "getaddrinfo failed",
    "name or service not known",
    "temporary failure in name resolution",
    "connection refused",
    "network is unreachable",
];
const RATE_LIMIT_MARKERS: &[&str] = &["http error 429", "too many requests", "rate limit", "rate-limit"];
const AUTH_MARKERS: &[&str] = &[
    "sign in to confirm",
    "login required",
    "http error 401",
    "http error 403",
    "members-only",
    "private video",
    "use --cookies",
];
const MISSING_TOOL_MARKERS: &[&str] = &["executable not found", "is not installed", "command not found"];

impl ErrorCategory {
    /// Match raw error text against known substrings; first match wins
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let hit = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

        if hit(MISSING_TOOL_MARKERS) {
            ErrorCategory::MissingTool
        } else if hit(RATE_LIMIT_MARKERS) {
            ErrorCategory::RateLimited
        } else if hit(AUTH_MARKERS) {
            ErrorCategory::AuthenticationRequired
        } else if hit(TIMEOUT_MARKERS) {
            ErrorCategory::NetworkTimeout
        } else if hit(UNREACHABLE_MARKERS) {
            ErrorCategory::NetworkUnreachable
        } else {
            ErrorCategory::Unclassified
        }
    }

    pub fn summary(self) -> Option<&'static str> {
        match self {
            ErrorCategory::NetworkTimeout => Some("The connection timed out. Check your network and retry"),
            ErrorCategory::NetworkUnreachable => Some("The source could not be reached"),
            ErrorCategory::RateLimited => Some("The site is rate limiting requests. Wait a while and retry"),
            ErrorCategory::AuthenticationRequired => {
                Some("This media requires signing in (cookies) to download")
            }
            ErrorCategory::MissingTool => Some("A required external tool is missing"),
            ErrorCategory::Unclassified => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_substrings() {
        assert_eq!(
            ErrorCategory::classify("ERROR: [youtube] abc: HTTP Error 429: Too Many Requests"),
            ErrorCategory::RateLimited
        );
        assert_eq!(
            ErrorCategory::classify("Sign in to confirm you're not a bot"),
            ErrorCategory::AuthenticationRequired
        );
        assert_eq!(
            ErrorCategory::classify("The read operation timed out"),
            ErrorCategory::NetworkTimeout
        );
        assert_eq!(
            ErrorCategory::classify("ffmpeg executable not found in PATH"),
            ErrorCategory::MissingTool
        );
    }

    #[test]
    fn unmatched_errors_are_shown_verbatim() {
        let err = OperationError::TranscodeFailed {
            message: "Invalid data found when processing input".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Unclassified);
        assert_eq!(
            err.user_message(),
            "Transcode failed: Invalid data found when processing input"
        );
    }

    #[test]
    fn cancellations_are_quiet() {
        assert!(OperationError::UserCancelled.is_quiet());
        assert!(OperationError::ConflictCancelled.is_quiet());
        assert!(!OperationError::SelectorExhausted.is_quiet());
        assert!(OperationError::Compatibility("x".into()).is_configuration());
    }

    #[test]
    fn fetch_cancellation_maps_to_user_cancelled() {
        let err: OperationError = FetchError::Cancelled.into();
        assert!(matches!(err, OperationError::UserCancelled));
    }
}
