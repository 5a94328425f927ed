pub mod tika;

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::MetadataError;
use crate::model::{Document, PdfMetadata, Session};

pub use tika::TikaApp;

/// What the text-extraction collaborator returns for one PDF.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// XML text rendering of the document.
    pub xml: String,
    /// Open-ended metadata as reported by the extractor.
    pub metadata: Map<String, Value>,
}

/// Text and metadata extraction for a single PDF. Calls block; the merge step
/// runs them on a worker pool.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf: &Path) -> Result<Extraction, MetadataError>;
}

/// Outcome of a merge run. Failed documents keep `metadata = None`.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub merged: usize,
    pub failed: Vec<(String, MetadataError)>,
    /// XML renderings written next to the PDFs.
    pub xml_files: Vec<PathBuf>,
}

/// Extractor keys tried for each kept field; legacy names first, then the
/// Dublin Core names newer extractor versions emit.
const CONTENT_TYPE: &[&str] = &["Content-Type", "content-type"];
const CREATION_DATE: &[&str] = &["Creation-Date", "dcterms:created", "meta:creation-date"];
const LAST_MODIFIED: &[&str] = &["Last-Modified", "dcterms:modified", "Last-Save-Date"];
const AUTHOR: &[&str] = &["Author", "dc:creator", "meta:author"];

/// Fold extractor metadata into the fields kept per document.
///
/// `content-length` carries the content type, matching the records the
/// scraper has always produced.
pub fn select_metadata(metadata: &Map<String, Value>) -> PdfMetadata {
    let content_type = lookup(metadata, CONTENT_TYPE);
    PdfMetadata {
        content_length: content_type.clone(),
        content_type,
        creation_date: lookup(metadata, CREATION_DATE),
        last_modified: lookup(metadata, LAST_MODIFIED),
        author: lookup(metadata, AUTHOR),
    }
}

fn lookup(metadata: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| metadata.get(*k).and_then(value_to_string))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Where the XML rendering of a PDF is written: next to it, `.xml` extension.
pub fn xml_sibling(pdf: &Path) -> PathBuf {
    pdf.with_extension("xml")
}

/// `file_name` below `session_dir`, or `None` when the name is absolute or
/// climbs out with `..`. Links come from the archive's own index page.
pub fn enclosed_path(session_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let relative = Path::new(file_name);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    (plain && !file_name.is_empty()).then(|| session_dir.join(relative))
}

/// Extract one PDF below `session_dir`, write its XML sibling and attach the
/// selected metadata to `doc`. Returns the XML path.
pub fn enrich_document(
    doc: &mut Document,
    session_dir: &Path,
    extractor: &dyn TextExtractor,
) -> Result<PathBuf, MetadataError> {
    let pdf = enclosed_path(session_dir, &doc.file_name)
        .ok_or_else(|| MetadataError::UnsafePath(doc.file_name.clone()))?;
    let extraction = extractor.extract(&pdf)?;

    // Same file may be linked twice (session and item level); write via a
    // temp file so concurrent writers never interleave.
    let xml_path = xml_sibling(&pdf);
    let dir = xml_path.parent().unwrap_or(session_dir);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(extraction.xml.as_bytes())?;
    tmp.persist(&xml_path).map_err(|e| MetadataError::Io(e.error))?;

    doc.metadata = Some(select_metadata(&extraction.metadata));
    debug!(file = %doc.file_name, xml = ?xml_path, "merged pdf metadata");
    Ok(xml_path)
}

/// Run the extractor for every PDF of the session, top-level and per agenda
/// item, on a pool of `workers` threads. A failing document is logged and
/// left without metadata; the others are unaffected.
pub fn merge_metadata(
    session: &mut Session,
    session_dir: &Path,
    extractor: &dyn TextExtractor,
    workers: usize,
) -> MergeReport {
    let pdfs: Vec<&mut Document> = session.all_documents_mut().filter(|d| d.is_pdf()).collect();
    let total = pdfs.len();

    let run = move || -> Vec<(String, Result<PathBuf, MetadataError>)> {
        pdfs.into_par_iter()
            .map(|doc| {
                let outcome = enrich_document(doc, session_dir, extractor);
                (doc.file_name.clone(), outcome)
            })
            .collect()
    };
    let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(workers.max(1)).build() {
        Ok(pool) => pool.install(run),
        Err(e) => {
            warn!(error = %e, "cannot build metadata worker pool, using global pool");
            run()
        }
    };

    let mut report = MergeReport::default();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(xml) => {
                report.merged += 1;
                report.xml_files.push(xml);
            }
            Err(e) => {
                warn!(file = %file, error = %e, "metadata extraction failed");
                report.failed.push((file, e));
            }
        }
    }

    info!(
        pdfs = total,
        merged = report.merged,
        failed = report.failed.len(),
        "metadata merge finished"
    );
    report
}

// ── Tests ──
