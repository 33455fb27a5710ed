use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CasicsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential field: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid port value: {0:?}")]
    InvalidPort(String),

    #[error("Invalid repository id: {0}")]
    InvalidRepoId(i64),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Shell command `{program}` failed: {message}")]
    ShellCommand { program: String, message: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot find \"{account}\" in section {section}")]
    AccountNotFound { account: String, section: String },

    #[error("Failed to read \"login\" and/or \"password\" for {0}")]
    MissingLogin(String),

    #[error("Logging setup error: {0}")]
    Logging(String),

    #[error("Database connection is not open")]
    NotOpen,

    #[error("Fatal: {0}")]
    Fatal(String),
}

impl From<figment::Error> for CasicsError {
    fn from(e: figment::Error) -> Self {
        CasicsError::Config(Box::new(e))
    }
}

/// Classifies failures worth another attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CasicsError {
    fn is_retryable(&self) -> bool {
        match self {
            CasicsError::Reqwest(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            CasicsError::DatabaseError(e) => matches!(
                e,
                SqlxError::Io(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed
            ),
            CasicsError::Io(_) | CasicsError::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_io_are_retryable() {
        assert!(CasicsError::Timeout(Duration::from_secs(1)).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(CasicsError::from(io).is_retryable());
    }

    #[test]
    fn domain_errors_are_not_retryable() {
        assert!(!CasicsError::InvalidRepoId(-1).is_retryable());
        assert!(!CasicsError::MissingCredential("password").is_retryable());
        assert!(!CasicsError::DatabaseError(SqlxError::RowNotFound).is_retryable());
    }

    #[test]
    fn account_not_found_message_names_section() {
        let err = CasicsError::AccountNotFound {
            account: "casics-bot".to_string(),
            section: "github".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot find \"casics-bot\" in section github"
        );
    }
}
