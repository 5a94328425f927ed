use scraper::ElementRef;

use super::text::{cells, is_number, text_of};

/// The cells of one table row.
pub type Row<'a> = Vec<ElementRef<'a>>;

/// Partition rows into groups, starting a new group at every row for which
/// `opens_group` holds. Rows before the first opening row are dropped.
pub fn group_by_boundary<T>(
    rows: impl IntoIterator<Item = T>,
    opens_group: impl Fn(&T) -> bool,
) -> Vec<Vec<T>> {
    rows.into_iter().fold(Vec::new(), |mut groups: Vec<Vec<T>>, row| {
        if opens_group(&row) {
            groups.push(vec![row]);
        } else if let Some(current) = groups.last_mut() {
            current.push(row);
        }
        groups
    })
}

/// Group agenda table rows into one group per agenda item: header row,
/// optional decision row, optional vote row. An item starts wherever the
/// second cell carries the item's sequence number.
pub fn group_agenda_rows<'a>(rows: impl IntoIterator<Item = ElementRef<'a>>) -> Vec<Vec<Row<'a>>> {
    group_by_boundary(rows.into_iter().map(cells), |row| {
        row.get(1).is_some_and(|cell| is_number(&text_of(*cell)))
    })
}

// ── Tests ──
