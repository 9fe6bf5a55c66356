//! Error types shared across the core crate

use thiserror::Error;

use crate::payload::PayloadError;

#[derive(Error, Debug)]
pub enum HicvisError {
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Invalid locus: {0}")]
    InvalidLocus(String),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Fetch failed with status {status}: {message}")]
    Fetch { status: u16, message: String },

    #[error("Parsing error in {source_name} line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl HicvisError {
    pub fn fetch<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Fetch {
            status,
            message: message.into(),
        }
    }

    pub fn parse<S: Into<String>, M: Into<String>>(source_name: S, line: usize, message: M) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type HicvisResult<T> = Result<T, HicvisError>;
