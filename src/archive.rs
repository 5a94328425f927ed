use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::ArchiveError;

// index file naming: index_20130713_0839.htm
static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^index_\d+_\d+\.htm$").unwrap());

/// An opened session archive: one index document plus its attachments.
pub struct SessionArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl SessionArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ArchiveError::Open {
            path: path.clone(),
            source,
        })?;
        let zip = ZipArchive::new(file)?;
        debug!(archive = ?path, entries = zip.len(), "opened session archive");
        Ok(SessionArchive { path, zip })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the first entry that looks like the session index.
    pub fn index_name(&self) -> Option<&str> {
        self.zip.file_names().find(|name| is_index_name(name))
    }

    /// Read the index document as text.
    pub fn read_index(&mut self) -> Result<String, ArchiveError> {
        let name = self
            .index_name()
            .ok_or(ArchiveError::IndexNotFound)?
            .to_string();
        let mut entry = self.zip.by_name(&name)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| ArchiveError::Io {
                path: PathBuf::from(&name),
                source,
            })?;
        Ok(decode_html(bytes))
    }

    /// Write every entry below `target`, keeping entry names as relative
    /// paths. Returns the files and directories created.
    pub fn extract_all(&mut self, target: &Path) -> Result<Extracted, ArchiveError> {
        let mut created = Extracted::default();
        self.extract_into(target, &mut created)?;
        Ok(created)
    }

    /// Like [`SessionArchive::extract_all`], but records into `created` as it
    /// goes, so a failed extraction can still be undone.
    pub fn extract_into(&mut self, target: &Path, created: &mut Extracted) -> Result<(), ArchiveError> {
        created.create_dir(target)?;

        for i in 0..self.zip.len() {
            let mut entry = self.zip.by_index(i)?;
            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = entry.name(), "skipping archive entry outside target directory");
                continue;
            };
            let out = target.join(relative);

            if entry.is_dir() {
                created.create_dir(&out)?;
                continue;
            }
            if let Some(parent) = out.parent() {
                created.create_dir(parent)?;
            }
            created.files.push(out.clone());
            let mut file = File::create(&out).map_err(io_err(&out))?;
            io::copy(&mut entry, &mut file).map_err(io_err(&out))?;
        }

        debug!(archive = ?self.path, files = created.files.len(), target = ?target, "extracted archive");
        Ok(())
    }
}

/// Paths an extraction created, so they can be removed again without touching
/// anything that was there before.
#[derive(Debug, Default)]
pub struct Extracted {
    pub files: Vec<PathBuf>,
    /// Directories that did not exist before, parents first.
    pub dirs: Vec<PathBuf>,
}

impl Extracted {
    fn create_dir(&mut self, dir: &Path) -> Result<(), ArchiveError> {
        let mut missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
            .map(Path::to_path_buf)
            .collect();
        fs::create_dir_all(dir).map_err(io_err(dir))?;
        missing.reverse();
        self.dirs.extend(missing);
        Ok(())
    }

    /// Remove the recorded files, then the recorded directories if empty.
    pub fn remove(&self) {
        for file in &self.files {
            if let Err(e) = fs::remove_file(file) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(file = ?file, error = %e, "cannot remove extracted file");
                }
            }
        }
        for dir in self.dirs.iter().rev() {
            // Only empty directories go.
            let _ = fs::remove_dir(dir);
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError {
    let path = path.to_path_buf();
    move |source| ArchiveError::Io { path, source }
}

pub fn is_index_name(name: &str) -> bool {
    INDEX_RE.is_match(name)
}

/// The council back-end emits either UTF-8 or ISO-8859-1 pages.
fn decode_html(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

// ── Tests ──
