pub mod extract;
pub mod rows;
pub mod text;

use std::sync::LazyLock;

use chrono::Utc;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::ParseError;
use crate::model::Session;
use extract::{agenda_items, documents, header};
use rows::Row;

static DESCRIPTION_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#smctablevorgang tbody tr").unwrap());
/// Agenda table rows, minus the column header rows.
static CONTENT_ROWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table#smc_page_to0040_contenttable1 > tbody > tr:not(.smcrowh)").unwrap()
});

/// Build a session from the index document of a session archive.
///
/// Pure: reads only `html`. The session id is left empty for the caller to
/// assign and `downloaded_at` is stamped with the current time.
pub fn parse_session(html: &str) -> Result<Session, ParseError> {
    let doc = Html::parse_document(html);

    let description: Vec<Row> = doc.select(&DESCRIPTION_ROWS).map(text::cells).collect();
    let header = header::extract(&description)?;

    let groups = rows::group_agenda_rows(doc.select(&CONTENT_ROWS));
    let agenda_item = agenda_items(&groups)?;
    let documents = documents::session_documents(&doc);

    debug!(
        short_name = %header.short_name,
        agenda_items = agenda_item.len(),
        documents = documents.len(),
        "parsed session index"
    );

    Ok(Session {
        id: String::new(),
        name: header.place.name().to_string(),
        locality: header.place.locality().map(str::to_string),
        short_name: header.short_name,
        organization: vec![header.organization],
        start: header.start,
        end: header.end,
        agenda_item,
        documents,
        downloaded_at: Utc::now(),
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, VoteResult};

    fn parse(fixture: &str) -> Session {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.htm", fixture)).unwrap();
        parse_session(&html).unwrap()
    }

    #[test]
    fn located_session() {
        let s = parse("index_20130713_0839");
        assert_eq!(s.short_name, "RAT/042/2013");
        assert_eq!(s.name, "42. Sitzung des Stadtrates");
        assert_eq!(s.organization, vec!["Stadtrat".to_string()]);
        assert_eq!(s.locality.as_deref(), Some("Rathaus, Ratssaal"));
        assert_eq!(s.start.to_rfc3339(), "2013-07-13T17:00:00+02:00");
        assert_eq!(s.end.unwrap().to_rfc3339(), "2013-07-13T20:15:00+02:00");
        assert!(s.id.is_empty());
    }

    #[test]
    fn located_session_agenda() {
        let s = parse("index_20130713_0839");
        assert_eq!(s.agenda_item.len(), 3);

        let first = &s.agenda_item[0];
        assert_eq!(first.description, "Eröffnung und Feststellung\nder Tagesordnung");
        assert_eq!(first.template_id, None);
        assert_eq!(first.decision, None);
        assert!(first.documents.is_empty());

        let second = &s.agenda_item[1];
        assert_eq!(second.template_id.as_deref(), Some("V/2013/0123"));
        assert_eq!(
            second.documents,
            vec![
                Document::new("vorlagen/V-2013-0123.pdf", "Beschlussvorlage"),
                Document::new("vorlagen/V-2013-0123-Anlage1.pdf", "Anlage 1 Lageplan"),
            ]
        );
        assert_eq!(second.decision.as_deref(), Some("Der Stadtrat beschließt die Vorlage."));
        assert_eq!(
            second.vote_result,
            Some(VoteResult { pro: 31, contra: 4, abstention: 2, prejudiced: 1 })
        );

        let third = &s.agenda_item[2];
        assert_eq!(third.description, "Anfragen");
        assert!(third.decision.is_some());
        assert_eq!(third.vote_result, None);
    }

    #[test]
    fn located_session_documents() {
        let s = parse("index_20130713_0839");
        assert_eq!(
            s.documents,
            vec![
                Document::new("einladung.pdf", "Einladung"),
                Document::new("niederschrift.pdf", "Niederschrift öffentlich"),
            ]
        );
    }

    #[test]
    fn unlocated_session() {
        let s = parse("index_20130301_1200");
        assert_eq!(s.locality, None);
        assert_eq!(s.name, "Sitzung des Bauausschusses");
        assert_eq!(s.end, None);
        assert_eq!(s.agenda_item.len(), 1);
        assert!(s.documents.is_empty());
    }

    #[test]
    fn empty_page_is_a_parse_error() {
        assert!(matches!(
            parse_session("<html><body></body></html>"),
            Err(ParseError::MissingRow { row: 0, .. })
        ));
    }
}
