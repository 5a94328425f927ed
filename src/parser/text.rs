use scraper::{ElementRef, Node};

/// Trim leading and trailing whitespace, including non-breaking spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}')
        .to_string()
}

/// Concatenated text of an element, as rendered without markup.
pub fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

/// Like [`text_of`], but every `<br>` becomes a literal newline.
pub fn text_with_breaks(el: ElementRef) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// The `<td>` children of a row, skipping whitespace and other nodes.
pub fn cells(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// True when the text reads as a number, as the back-end renders agenda
/// sequence numbers ("1", "12", "3.1").
pub fn is_number(text: &str) -> bool {
    let text = text.trim();
    text.bytes().any(|b| b.is_ascii_digit()) && text.parse::<f64>().is_ok()
}

// ── Tests ──
