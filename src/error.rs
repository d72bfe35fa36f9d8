//! Application-wide error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::settings::SettingsError;
use crate::llm::ProviderError;
use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("novel file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("cannot read novel {}: {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation error: {0}")]
    Generation(#[from] ProviderError),

    #[error("input error: {0}")]
    Input(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn unknown_setting_converts() {
        let e: AppError = SettingsError::UnknownSetting("recall".into()).into();
        assert!(e.to_string().contains("settings error"));
        assert!(e.to_string().contains("recall"));
    }

    #[test]
    fn document_not_found_names_path() {
        let e = AppError::DocumentNotFound(PathBuf::from("nvQA/missing.txt"));
        assert!(e.to_string().contains("nvQA/missing.txt"));
    }

    #[test]
    fn document_read_keeps_source() {
        let e = AppError::DocumentRead {
            path: PathBuf::from("book.txt"),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8"),
        };
        assert!(e.to_string().contains("book.txt"));
        assert!(e.source().is_some());
    }

    #[test]
    fn provider_error_converts() {
        let e: AppError = ProviderError::Request("HTTP 500".into()).into();
        assert!(e.to_string().contains("generation error"));
    }

    #[test]
    fn retrieval_failure_converts() {
        let e: AppError = RetrievalError::Failed("index cache poisoned".into()).into();
        assert!(e.to_string().contains("retrieval error"));
        assert!(e.source().is_some());
    }
}
