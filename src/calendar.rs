use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::parser::text::cells;

static CALENDAR_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.smccontenttable tr").unwrap());
static DOC_BOX: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".smcdocbox").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static SESSION_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]__ksinr=([^&#]+)").unwrap());

/// Column holding the link to the session page.
const SESSION_LINK: usize = 5;

/// Fetch the session calendar and return the ids of sessions that have documents.
pub async fn fetch_session_ids(client: &reqwest::Client, url: &str) -> Result<Vec<String>> {
    info!("Fetching session calendar: {}", url);
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("Failed to fetch session calendar")?;

    let ids = session_ids(&html);
    info!("Sessions with documents: {}", ids.len());
    Ok(ids)
}

/// Session ids from a calendar page, in listing order. Rows without a
/// document box have nothing to download and are skipped.
pub fn session_ids(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&CALENDAR_ROWS).filter_map(parse_row).collect()
}

fn parse_row(row: ElementRef) -> Option<String> {
    row.select(&DOC_BOX).next()?;

    let link = cells(row)
        .get(SESSION_LINK)
        .and_then(|cell| cell.select(&ANCHOR).next());
    let Some(link) = link else {
        warn!("session link not found in calendar row with documents");
        return None;
    };

    let href = link.value().attr("href")?;
    let id = SESSION_ID_RE.captures(href)?.get(1)?.as_str().to_string();
    Some(id)
}

// ── Tests ──
