use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;
use zip::write::SimpleFileOptions;

use ratsinfo::error::{ArchiveError, Error, MetadataError};
use ratsinfo::metadata::{Extraction, TextExtractor};
use ratsinfo::pipeline::{self, SESSION_FILE};

const INDEX: &str = r#"<html><body>
<table id="smctablevorgang"><tbody>
<tr><td>Sitzung:</td><td>HA/003/2013</td><td>Gremium:</td><td>Hauptausschuss</td></tr>
<tr><td>Datum:</td><td>01.01.2013</td><td>Zeit:</td><td>10:00-12:00</td></tr>
<tr><td>Raum:</td><td>Rathaus, Raum 101&nbsp;</td></tr>
<tr><td>Bezeichnung:</td><td>3. Sitzung des Hauptausschusses</td></tr>
</tbody></table>
<table id="smc_page_to0040_contenttable1"><tbody>
<tr class="smcrowh"><th>TOP</th><th>Betreff</th></tr>
<tr><td>Ö</td><td>1</td><td>Haushaltssatzung</td><td>V/2013/0001</td><td></td><td></td></tr>
<tr><td></td><td></td><td>empfohlen</td></tr>
<tr><td>Ö</td><td>2</td><td>Stellenplan</td><td></td><td></td><td></td></tr>
<tr><td></td><td></td><td>beschlossen</td></tr>
<tr><td></td><td></td><td>Ja:9, Nein:2, Enthaltungen:0</td></tr>
</tbody></table>
<table class="smcdocbox"><tbody>
<tr><td class="smcdocname">einladung.pdf</td><td><a href="einladung.pdf" title="Einladung">Einladung</a></td></tr>
</tbody></table>
</body></html>"#;

struct StubExtractor;

impl TextExtractor for StubExtractor {
    fn extract(&self, pdf: &Path) -> Result<Extraction, MetadataError> {
        if !pdf.is_file() {
            return Err(MetadataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not extracted", pdf.display()),
            )));
        }
        let metadata = json!({
            "Content-Type": "application/pdf",
            "Creation-Date": "2012-12-20T09:00:00Z",
            "Last-Modified": "2012-12-21T09:00:00Z",
            "Author": "Hauptamt"
        });
        Ok(Extraction {
            xml: "<html><body><p>Einladung</p></body></html>".into(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        })
    }
}

fn build_zip(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join("archive.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    path
}

#[test]
fn synthetic_archive_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(
        tmp.path(),
        &[
            ("index_20130101_1000.htm", INDEX.as_bytes()),
            ("einladung.pdf", b"%PDF-1.4 stub"),
        ],
    );
    let out = tmp.path().join("sessions/1000");

    let processed = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 2).unwrap();
    let session = &processed.session;

    assert_eq!(session.id, "1000");
    assert_eq!(session.locality.as_deref(), Some("Rathaus, Raum 101"));
    assert_eq!(session.name, "3. Sitzung des Hauptausschusses");
    assert_eq!(session.agenda_item.len(), 2);
    assert_eq!(session.documents.len(), 1);
    assert!(session.agenda_item[0].decision.is_some());
    assert!(session.agenda_item[0].vote_result.is_none());
    assert!(session.agenda_item[1].vote_result.is_some());
    assert_eq!(session.agenda_item[1].vote_result.unwrap().pro, 9);

    let meta = session.documents[0].metadata.as_ref().expect("pdf metadata");
    assert_eq!(meta.author.as_deref(), Some("Hauptamt"));
    assert_eq!(meta.content_length.as_deref(), Some("application/pdf"));
    assert_eq!(processed.merge.merged, 1);
    assert!(processed.merge.failed.is_empty());

    assert!(out.join("einladung.pdf").is_file());
    assert!(out.join("einladung.xml").is_file());
    assert!(out.join("index_20130101_1000.htm").is_file());
    assert_eq!(processed.output, out.join(SESSION_FILE));
}

#[test]
fn written_session_reads_back_equal() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(
        tmp.path(),
        &[
            ("index_20130101_1000.htm", INDEX.as_bytes()),
            ("einladung.pdf", b"%PDF-1.4 stub"),
        ],
    );
    let out = tmp.path().join("s");
    let processed = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap();

    let back = pipeline::read_session(&processed.output).unwrap();
    assert_eq!(back, processed.session);
}

#[test]
fn missing_pdf_only_loses_its_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    // Index links einladung.pdf, but the archive lacks it.
    let zip = build_zip(tmp.path(), &[("index_20130101_1000.htm", INDEX.as_bytes())]);
    let out = tmp.path().join("s");

    let processed = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap();
    assert_eq!(processed.merge.failed.len(), 1);
    assert!(processed.session.documents[0].metadata.is_none());
    assert!(out.join(SESSION_FILE).is_file());
}

#[test]
fn archive_without_index_fails_and_leaves_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(tmp.path(), &[("einladung.pdf", b"%PDF-1.4 stub")]);
    let out = tmp.path().join("s");

    let err = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap_err();
    assert!(matches!(err, Error::Archive(ArchiveError::IndexNotFound)));
    assert!(!out.exists());
}

#[test]
fn unparsable_index_removes_new_session_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(
        tmp.path(),
        &[("index_20130101_1000.htm", b"<html><body>Wartung</body></html>")],
    );
    let out = tmp.path().join("sessions/1000");

    let err = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(!out.exists());
}

#[test]
fn failure_keeps_content_of_existing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(
        tmp.path(),
        &[("index_20130101_1000.htm", b"<html><body>Wartung</body></html>")],
    );
    let out = tmp.path().join("s");
    fs::create_dir_all(out.join("notes")).unwrap();
    fs::write(out.join("stale.txt"), "x").unwrap();
    fs::write(out.join("notes/todo.txt"), "y").unwrap();

    let err = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(fs::read_to_string(out.join("stale.txt")).unwrap(), "x");
    assert_eq!(fs::read_to_string(out.join("notes/todo.txt")).unwrap(), "y");
}

#[test]
fn broken_zip_leaves_existing_directory_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = tmp.path().join("broken.zip");
    fs::write(&zip, b"PK\x03\x04 not really").unwrap();
    let out = tmp.path().join("s");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("keep.txt"), "keep").unwrap();

    let err = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap_err();
    assert!(matches!(err, Error::Archive(_)));
    assert_eq!(fs::read_to_string(out.join("keep.txt")).unwrap(), "keep");
}

#[test]
fn late_failure_removes_only_what_this_run_wrote() {
    let tmp = tempfile::tempdir().unwrap();
    let zip = build_zip(
        tmp.path(),
        &[
            ("index_20130101_1000.htm", INDEX.as_bytes()),
            ("einladung.pdf", b"%PDF-1.4 stub"),
            ("anlagen/plan.pdf", b"%PDF-1.4 stub"),
        ],
    );
    let out = tmp.path().join("s");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("keep.txt"), "keep").unwrap();
    // A directory where session.json goes makes the final write fail.
    fs::create_dir_all(out.join(SESSION_FILE)).unwrap();

    let err = pipeline::process_archive(&zip, &out, "1000", &StubExtractor, 1).unwrap_err();
    assert!(matches!(err, Error::File { .. }));

    assert_eq!(fs::read_to_string(out.join("keep.txt")).unwrap(), "keep");
    assert!(out.join(SESSION_FILE).is_dir());
    assert!(!out.join("index_20130101_1000.htm").exists());
    assert!(!out.join("einladung.pdf").exists());
    assert!(!out.join("einladung.xml").exists());
    assert!(!out.join("anlagen").exists());
}
