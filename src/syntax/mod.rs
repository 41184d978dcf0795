use std::{
    io::{self, Read},
    path::Path,
};

use self::{error::ParserError, file::File, parser::Options};
use crate::model::Ledger;

pub mod error;
pub mod file;
pub mod parser;

pub use parser::{parse, parse_date};

pub fn parse_file(path: &Path, options: &Options) -> Result<Ledger, ParserError> {
    let file = File::read(path).map_err(|source| ParserError::IO {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&file, options)
}

/// Reads the whole of standard input as a journal.
pub fn parse_stdin(options: &Options) -> Result<Ledger, ParserError> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|source| ParserError::IO {
            path: "<stream>".into(),
            source,
        })?;
    parse_source(&File::mem(&text), options)
}

pub fn parse_source(file: &File, options: &Options) -> Result<Ledger, ParserError> {
    tracing::debug!("parsing {}", file.name());
    parse(file.lines(), None, options)
}
