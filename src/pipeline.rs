use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive::{Extracted, SessionArchive};
use crate::error::{Error, Result};
use crate::metadata::{merge_metadata, MergeReport, TextExtractor};
use crate::model::Session;
use crate::parser::parse_session;

pub const SESSION_FILE: &str = "session.json";

/// A finished session and how its metadata merge went.
#[derive(Debug)]
pub struct Processed {
    pub session: Session,
    pub merge: MergeReport,
    pub output: PathBuf,
}

/// Turn one downloaded archive into `session_dir`: all archive entries,
/// XML renderings of the PDFs and `session.json`.
///
/// On error, whatever this run wrote is removed again: the whole directory
/// when this run created it, otherwise only the files it added.
pub fn process_archive(
    archive_path: &Path,
    session_dir: &Path,
    id: &str,
    extractor: &dyn TextExtractor,
    workers: usize,
) -> Result<Processed> {
    let existed = session_dir.exists();
    let mut created = Extracted::default();

    let result = build(archive_path, session_dir, id, extractor, workers, &mut created);
    if let Err(e) = &result {
        if existed {
            warn!(
                session = id,
                error = %e,
                files = created.files.len(),
                "session failed, removing its files from {:?}",
                session_dir
            );
            created.remove();
        } else {
            warn!(session = id, error = %e, "session failed, removing {:?}", session_dir);
            if let Err(rm) = fs::remove_dir_all(session_dir) {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!(session = id, error = %rm, "cannot remove session directory");
                }
            }
        }
    }
    result
}

fn build(
    archive_path: &Path,
    session_dir: &Path,
    id: &str,
    extractor: &dyn TextExtractor,
    workers: usize,
    created: &mut Extracted,
) -> Result<Processed> {
    let mut archive = SessionArchive::open(archive_path)?;
    let mut session = parse_session(&archive.read_index()?)?;
    session.id = id.to_string();

    archive.extract_into(session_dir, created)?;
    drop(archive);

    let merge = merge_metadata(&mut session, session_dir, extractor, workers);
    created.files.extend(merge.xml_files.iter().cloned());

    created.files.push(session_dir.join(SESSION_FILE));
    let output = write_session(&session, session_dir)?;

    info!(
        session = id,
        agenda_items = session.agenda_item.len(),
        documents = session.all_documents().count(),
        "session written to {:?}",
        output
    );
    Ok(Processed {
        session,
        merge,
        output,
    })
}

/// Pretty-printed JSON next to the extracted files.
pub fn write_session(session: &Session, session_dir: &Path) -> Result<PathBuf> {
    let path = session_dir.join(SESSION_FILE);
    let json = serde_json::to_string_pretty(session)?;
    fs::write(&path, json).map_err(|source| Error::File {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn read_session(path: &Path) -> Result<Session> {
    let json = fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}
