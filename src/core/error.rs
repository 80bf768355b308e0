//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("store error: {0}")]
    Store(String),

    /// Bad user input: unknown format, missing source file, invalid regex.
    #[error("{0}")]
    Usage(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit code for this error. Usage errors exit with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("ELYRIA_ENTROPY_MAX must be a float".into());
        assert!(e.to_string().starts_with("config error"));
        assert!(e.to_string().contains("ELYRIA_ENTROPY_MAX"));
    }

    #[test]
    fn usage_error_is_bare_message() {
        let e = AppError::Usage("invalid regex: unclosed group".into());
        assert_eq!(e.to_string(), "invalid regex: unclosed group");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(AppError::Usage("x".into()).exit_code(), 2);
        assert_eq!(AppError::Store("x".into()).exit_code(), 1);
        assert_eq!(AppError::Logger("x".into()).exit_code(), 1);
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        // satisfies std::error::Error trait
        let _: &dyn Error = &e;
    }

    #[test]
    fn json_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let e: AppError = err.into();
        assert!(e.to_string().starts_with("json error"));
    }
}
