use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::model::Document;
use crate::parser::text::normalize_whitespace;

/// Session-level document box directly below `<body>`. The name column only
/// repeats the file name, so its anchors are skipped.
static SESSION_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body > table.smcdocbox tbody td:not(.smcdocname) a").unwrap()
});
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

const NAME_COLUMN: &str = "smcdocname";

/// Build documents from anchors, in link order.
pub fn extract<'a>(links: impl IntoIterator<Item = ElementRef<'a>>) -> Vec<Document> {
    links
        .into_iter()
        .filter_map(|a| {
            let Some(href) = a.value().attr("href") else {
                warn!(html = %a.html(), "document link without href");
                return None;
            };
            let title = a.value().attr("title").unwrap_or_default();
            Some(Document::new(href, normalize_whitespace(title)))
        })
        .collect()
}

pub fn session_documents(doc: &Html) -> Vec<Document> {
    extract(doc.select(&SESSION_LINKS))
}

/// Documents of the table nested in an agenda item's document cell.
pub fn item_documents(cell: ElementRef) -> Vec<Document> {
    extract(cell.select(&ANCHOR).filter(|a| in_link_column(*a, cell)))
}

/// True when the anchor sits in a nested table cell below `scope` that is
/// not the file name column.
fn in_link_column(anchor: ElementRef, scope: ElementRef) -> bool {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.id() != scope.id())
        .find(|el| el.value().name() == "td")
        .is_some_and(|td| !td.value().classes().any(|c| c == NAME_COLUMN))
}

// ── Tests ──
