//! Error handling for the HiCVis CLI

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid view: {message}")]
    InvalidView { message: String },

    #[error("Response rejected: {message}")]
    Response { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_view<S: Into<String>>(message: S) -> Self {
        Self::InvalidView {
            message: message.into(),
        }
    }

    pub fn response<S: Into<String>>(message: S) -> Self {
        Self::Response {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Error text plus hints for the common mistakes.
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Payloads are the raw bytes returned by the server's /voronoi endpoint",
                path.display()
            ));
        }
        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your hicvis.toml configuration file\n\
                 • Use 'hicvis config' to print a sample configuration",
            );
        }
        CliError::InvalidView { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Loci are written chr:start-end, e.g. chr2L:1,000-50,000\n\
                 • URL state looks like srcChrom=chr2L&srcStart=0&srcEnd=1000&tarChrom=chr2L&tarStart=0&tarEnd=1000",
            );
        }
        CliError::Response { .. } => {}
    }

    message
}
