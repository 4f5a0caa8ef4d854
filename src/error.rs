//! Error type shared by every subcommand.
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The settings document is well-formed XML but has the wrong structure.
    #[error("{0}")]
    Parse(String),

    #[error("could not parse XML in {path:?}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: xml::reader::Error,
    },

    /// A required settings field is missing or invalid.
    #[error("{0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A `%%<N>` placeholder refers to a column the batch line does not have.
    #[error("invalid parameter index %%{index} (batch line has {available} fields)")]
    Submission { index: usize, available: usize },

    #[error("{0}")]
    Quantile(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Wrap an `io::Error` with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
