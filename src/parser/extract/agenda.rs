use scraper::ElementRef;

use super::documents::item_documents;
use super::vote::parse_vote;
use crate::error::ParseError;
use crate::model::AgendaItem;
use crate::parser::rows::Row;
use crate::parser::text::{normalize_whitespace, text_of, text_with_breaks};

const TABLE: &str = "agenda";

const DESCRIPTION: usize = 2;
const TEMPLATE_ID: usize = 3;
const DOCUMENTS: usize = 5;
/// Decision and vote rows carry their text in the same column as the description.
const VALUE: usize = 2;

/// Build one agenda item from its row group: header row, then the optional
/// decision and vote rows.
pub fn extract(group: &[Row], index: usize) -> Result<AgendaItem, ParseError> {
    let header = group.first().ok_or(ParseError::MissingRow { table: TABLE, row: index })?;

    let description = normalize_whitespace(&text_with_breaks(cell(header, index, DESCRIPTION)?));
    let template_id = Some(normalize_whitespace(&text_of(cell(header, index, TEMPLATE_ID)?)))
        .filter(|id| !id.is_empty());
    let documents = header
        .get(DOCUMENTS)
        .map(|docs| item_documents(*docs))
        .unwrap_or_default();

    let decision = group
        .get(1)
        .map(|row| cell(row, index, VALUE).map(text_of))
        .transpose()?;
    let vote_result = group
        .get(2)
        .map(|row| cell(row, index, VALUE).map(|c| parse_vote(&text_of(c))))
        .transpose()?;

    Ok(AgendaItem {
        description,
        template_id,
        documents,
        decision,
        vote_result,
    })
}

fn cell<'a>(row: &Row<'a>, index: usize, cell: usize) -> Result<ElementRef<'a>, ParseError> {
    row.get(cell).copied().ok_or(ParseError::MissingCell {
        table: TABLE,
        row: index,
        cell,
    })
}

// ── Tests ──
