//! Session archive extraction for municipal council information systems.
//!
//! A session is published as a zip archive holding one `index_<date>_<time>.htm`
//! page plus its documents. [`archive`] opens it, [`parser`] turns the index
//! into a [`model::Session`], [`metadata`] folds PDF metadata into the
//! documents and [`pipeline`] ties the steps together per session.

pub mod archive;
pub mod calendar;
pub mod config;
pub mod download;
pub mod error;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod pipeline;

pub use error::{ArchiveError, Error, MetadataError, ParseError};
pub use model::{AgendaItem, Document, PdfMetadata, Session, VoteResult};
pub use parser::parse_session;
pub use parser::text::normalize_whitespace;
