pub mod agenda;
pub mod documents;
pub mod header;
pub mod vote;

use super::rows::Row;
use crate::error::ParseError;
use crate::model::AgendaItem;

/// Run the agenda-item extractor over every row group, keeping table order.
pub fn agenda_items(groups: &[Vec<Row>]) -> Result<Vec<AgendaItem>, ParseError> {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| agenda::extract(group, i))
        .collect()
}
