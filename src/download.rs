use std::io::Write;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode, Url};
use scraper::{Html, Selector};
use tempfile::NamedTempFile;
use tracing::{info, warn};

const BASE_BACKOFF_MS: u64 = 2000;

static DOCUMENT_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".smcdocbox td.smc_doc").unwrap());
static ZIP_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".smcdocboxzip td a").unwrap());

/// Result of asking a session page for its archive.
#[derive(Debug)]
pub enum Download {
    /// The session has no published documents.
    NoDocuments,
    /// Zip archive in a temp file, removed on drop.
    Archive(NamedTempFile),
}

/// What a session page offers for download.
#[derive(Debug, PartialEq)]
pub enum ArchiveLink {
    NoDocuments,
    Zip(Url),
}

/// Locate the zip link on a session page, resolved against `page_url`.
pub fn archive_link(html: &str, page_url: &Url) -> Result<ArchiveLink> {
    let doc = Html::parse_document(html);
    if doc.select(&DOCUMENT_CELLS).next().is_none() {
        return Ok(ArchiveLink::NoDocuments);
    }
    let href = doc
        .select(&ZIP_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| anyhow!("session page lists documents but has no zip link"))?;
    let url = page_url
        .join(href)
        .with_context(|| format!("invalid zip link {:?}", href))?;
    Ok(ArchiveLink::Zip(url))
}

/// Fetch a session page and download its document archive.
pub async fn fetch_archive(client: &Client, session_url: &str, retries: u32) -> Result<Download> {
    let page_url = Url::parse(session_url).with_context(|| format!("invalid session url {}", session_url))?;
    let page = get_with_retry(client, &page_url, retries).await?;
    let html = String::from_utf8_lossy(&page).into_owned();

    let zip_url = match archive_link(&html, &page_url)? {
        ArchiveLink::NoDocuments => return Ok(Download::NoDocuments),
        ArchiveLink::Zip(url) => url,
    };

    let bytes = get_with_retry(client, &zip_url, retries).await?;
    let mut archive = tempfile::Builder::new()
        .prefix("ratsinfo")
        .suffix(".zip")
        .tempfile()
        .context("Failed to create temp file for archive")?;
    archive.write_all(&bytes)?;
    archive.flush()?;

    info!("Downloaded {} ({} bytes)", zip_url, bytes.len());
    Ok(Download::Archive(archive))
}

async fn get_with_retry(client: &Client, url: &Url, retries: u32) -> Result<Vec<u8>> {
    let mut attempt = 0;
    loop {
        let outcome = fetch(client, url).await;
        let retry = match &outcome {
            Ok(_) => false,
            Err(FetchError::Status(status)) => is_transient(*status),
            Err(FetchError::Transport(e)) => e.is_connect() || e.is_timeout(),
        };
        if !retry || attempt >= retries {
            return outcome.map_err(|e| anyhow!("GET {} failed: {}", url, e));
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Transient failure on {} (attempt {}/{}), backing off {:.1}s",
            url,
            attempt + 1,
            retries,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("http status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

async fn fetch(client: &Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    Ok(response.bytes().await?.to_vec())
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

// ── Tests ──
