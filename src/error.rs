use std::path::PathBuf;

use thiserror::Error;

/// Malformed S-expression structure. Indices count tokens, not bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Unexpected end of input at token {at}")]
    UnexpectedEnd { at: usize },
    #[error("List opened at token {open} is never closed")]
    UnterminatedList { open: usize },
    #[error("Unexpected ')' at token {at}")]
    UnexpectedCloseParen { at: usize },
    #[error("Lists nest deeper than {limit} levels at token {at}")]
    TooDeep { at: usize, limit: usize },
    #[error("Trailing tokens after root form at token {at} of {total}")]
    TrailingTokens { at: usize, total: usize },
}

/// Well-formed tree that does not have the expected document shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Section ({0} ...) not found")]
    MissingSection(String),
    #[error("Expected ({expected} ...) root, found {}", .found.as_deref().unwrap_or("no tag"))]
    InvalidRoot {
        expected: &'static str,
        found: Option<String>,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
