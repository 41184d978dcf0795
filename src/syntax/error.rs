use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::error::ModelError;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("line {line}: {msg}\n{line:5} |{text}")]
    MalformedLine {
        line: usize,
        text: String,
        msg: String,
    },

    #[error("line {line}: {source}\n{line:5} |{text}")]
    Model {
        line: usize,
        text: String,
        #[source]
        source: ModelError,
    },

    #[error("error committing {header}: {source}\n{dump}")]
    Commit {
        header: String,
        dump: String,
        #[source]
        source: ModelError,
    },

    #[error("error reading file {path:?}: {source}")]
    IO {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ParserError {
    pub fn malformed(line: usize, text: &str, msg: &str) -> Self {
        ParserError::MalformedLine {
            line,
            text: text.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn model(line: usize, text: &str, source: ModelError) -> Self {
        ParserError::Model {
            line,
            text: text.to_string(),
            source,
        }
    }

    /// The model error behind this error, if any.
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            ParserError::Model { source, .. } | ParserError::Commit { source, .. } => Some(source),
            _ => None,
        }
    }
}
