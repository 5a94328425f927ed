use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid zip container: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("no index_<date>_<time>.htm entry in archive")]
    IndexNotFound,
    #[error("io error while extracting {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing row {row} in {table}")]
    MissingRow { table: &'static str, row: usize },
    #[error("missing cell {cell} in {table} row {row}")]
    MissingCell {
        table: &'static str,
        row: usize,
        cell: usize,
    },
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid time {0:?}")]
    InvalidTime(String),
}

/// Failure to obtain metadata for a single document. Never fatal for a session.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("document path {0:?} leaves the session directory")]
    UnsafePath(String),
    #[error("text extractor could not be started: {0}")]
    Unavailable(#[source] std::io::Error),
    #[error("text extractor exited with {status}: {stderr}")]
    ExtractorFailed { status: String, stderr: String },
    #[error("malformed metadata json: {0}")]
    MalformedJson(String),
    #[error("malformed xml rendering: {0}")]
    MalformedXml(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("cannot access {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
