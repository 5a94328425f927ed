use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Extraction, TextExtractor};
use crate::error::MetadataError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Text extraction through the Apache Tika command line app.
#[derive(Debug, Clone)]
pub struct TikaApp {
    java: PathBuf,
    jar: PathBuf,
    timeout: Duration,
}

impl TikaApp {
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        TikaApp {
            java: java.into(),
            jar: jar.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Limit for a single tika invocation; the process is killed after it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, flag: &str, pdf: &Path) -> Result<String, MetadataError> {
        debug!(pdf = ?pdf, flag, "running tika");
        let mut cmd = Command::new(&self.java);
        cmd.arg("-jar").arg(&self.jar).arg(flag).arg(pdf);
        run_with_timeout(cmd, self.timeout)
    }
}

/// Run `cmd` to completion and return its stdout. A non-zero exit, or still
/// running after `timeout`, is `ExtractorFailed`.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<String, MetadataError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(MetadataError::Unavailable)?;

    // Drain both pipes while waiting, a full pipe would stall the child.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_until(&mut child, Instant::now() + timeout)?;
    let stdout = collect(stdout);
    let stderr = collect(stderr);

    match status {
        None => {
            warn!(timeout = ?timeout, "text extractor timed out, killed");
            Err(MetadataError::ExtractorFailed {
                status: format!("timed out after {:?}", timeout),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            })
        }
        Some(status) if !status.success() => Err(MetadataError::ExtractorFailed {
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        }),
        Some(_) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
    }
}

/// Exit status, or `None` when the deadline passed and the child was killed.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, MetadataError> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl TextExtractor for TikaApp {
    fn extract(&self, pdf: &Path) -> Result<Extraction, MetadataError> {
        let xml = self.run("--xml", pdf)?;
        check_xml(&xml)?;
        let metadata = parse_metadata(&self.run("--json", pdf)?)?;
        Ok(Extraction { xml, metadata })
    }
}

/// Tika prints one metadata object, or a list of them (container first)
/// when run recursively.
pub fn parse_metadata(json: &str) -> Result<Map<String, Value>, MetadataError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| MetadataError::MalformedJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(MetadataError::MalformedJson("no metadata object in list".into())),
        },
        other => Err(MetadataError::MalformedJson(format!("unexpected json: {}", other))),
    }
}

/// The XML rendering must be a well-formed document with a root element.
pub fn check_xml(xml: &str) -> Result<(), MetadataError> {
    let mut reader = Reader::from_str(xml);
    let mut elements = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) => elements += 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(MetadataError::MalformedXml(format!(
                    "at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
        }
    }
    if elements == 0 {
        return Err(MetadataError::MalformedXml("no root element".into()));
    }
    Ok(())
}

// ── Tests ──
