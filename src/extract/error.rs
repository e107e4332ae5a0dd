use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("not enough text to build a table: found {lines} usable line(s), need at least 2")]
    InsufficientInput { lines: usize },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("{what} index {index} is out of range (len={len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid utf-8 output: {0}")]
    Utf8(String),
}
