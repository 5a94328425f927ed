use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use ratsinfo::calendar;
use ratsinfo::config::Settings;
use ratsinfo::download::{self, Download};
use ratsinfo::metadata::TikaApp;
use ratsinfo::pipeline;

#[derive(Parser)]
#[command(name = "ratsinfo", about = "Council session archive scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ids of sessions with documents from the calendar page
    Sessions {
        /// Calendar page (default: settings)
        #[arg(long)]
        calendar: Option<String>,
    },
    /// Download and process every listed session
    Scrape {
        /// Calendar page (default: settings)
        #[arg(long)]
        calendar: Option<String>,
        /// Max sessions to process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Process one already downloaded session archive
    Archive {
        /// Path to the zip archive
        zip: PathBuf,
        /// Target directory (default: <output_dir>/<zip name>)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Session id to record (default: zip file name)
        #[arg(long)]
        id: Option<String>,
    },
    /// Summarize a written session.json
    Show { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    let result = match cli.command {
        Commands::Sessions { calendar } => {
            let client = http_client()?;
            let url = calendar.unwrap_or_else(|| settings.calendar_url.clone());
            for id in calendar::fetch_session_ids(&client, &url).await? {
                println!("{}", id);
            }
            Ok(())
        }
        Commands::Scrape { calendar, limit } => {
            let url = calendar.unwrap_or_else(|| settings.calendar_url.clone());
            scrape(&settings, &url, limit).await
        }
        Commands::Archive { zip, out, id } => {
            let name = zip
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "session".into());
            let out = out.unwrap_or_else(|| settings.output_dir.join(&name));
            let id = id.unwrap_or(name);
            let tika = tika_app(&settings);

            let processed = pipeline::process_archive(&zip, &out, &id, &tika, settings.workers)?;
            println!(
                "Wrote {:?}: {} agenda items, {} documents ({} pdfs merged, {} failed).",
                processed.output,
                processed.session.agenda_item.len(),
                processed.session.all_documents().count(),
                processed.merge.merged,
                processed.merge.failed.len(),
            );
            Ok(())
        }
        Commands::Show { path } => {
            let session = pipeline::read_session(&path)?;
            print_session(&session);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", elapsed_label(elapsed));
    }

    result
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("Failed to create HTTP client")
}

fn tika_app(settings: &Settings) -> TikaApp {
    TikaApp::new(&settings.java, &settings.tika_jar).with_timeout(settings.tika_timeout())
}

struct ScrapeCounts {
    ok: usize,
    no_documents: usize,
    errors: usize,
    metadata_failures: usize,
}

/// Per-session failures are logged and counted; the batch always continues.
async fn scrape(settings: &Settings, calendar_url: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let client = http_client()?;
    let mut ids = calendar::fetch_session_ids(&client, calendar_url).await?;
    if let Some(n) = limit {
        ids.truncate(n);
    }
    if ids.is_empty() {
        println!("No sessions with documents found.");
        return Ok(());
    }

    let tika = Arc::new(tika_app(&settings));
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut counts = ScrapeCounts {
        ok: 0,
        no_documents: 0,
        errors: 0,
        metadata_failures: 0,
    };

    for id in ids {
        let url = settings.session_url(&id);
        match download::fetch_archive(&client, &url, settings.download_retries).await {
            Ok(Download::NoDocuments) => {
                info!("No documents found at {}", url);
                counts.no_documents += 1;
            }
            Ok(Download::Archive(archive)) => {
                let dir = settings.output_dir.join(&id);
                let tika = Arc::clone(&tika);
                let workers = settings.workers;
                let session_id = url.clone();

                // The temp archive lives until processing is done.
                let outcome = tokio::task::spawn_blocking(move || {
                    pipeline::process_archive(archive.path(), &dir, &session_id, tika.as_ref(), workers)
                })
                .await;

                match outcome {
                    Ok(Ok(processed)) => {
                        counts.ok += 1;
                        counts.metadata_failures += processed.merge.failed.len();
                    }
                    Ok(Err(e)) => {
                        error!(session = %id, error = %e, "session failed");
                        counts.errors += 1;
                    }
                    Err(e) => {
                        error!(session = %id, error = %e, "session worker panicked");
                        counts.errors += 1;
                    }
                }
            }
            Err(e) => {
                warn!(session = %id, error = %e, "download failed");
                counts.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!(
        "Done: {} sessions written, {} without documents, {} errors, {} pdfs without metadata.",
        counts.ok, counts.no_documents, counts.errors, counts.metadata_failures
    );
    Ok(())
}

const DESCRIPTION_WIDTH: usize = 48;

fn print_session(session: &ratsinfo::Session) {
    println!("{} | {}", session.short_name, session.name);
    println!("Gremium:  {}", session.organization.join(", "));
    match session.end {
        Some(end) => println!("Zeit:     {} - {}", session.start, end.format("%H:%M")),
        None => println!("Zeit:     {}", session.start),
    }
    if let Some(locality) = &session.locality {
        println!("Ort:      {}", locality);
    }
    println!("Dokumente: {}", session.documents.len());
    println!("{}", "-".repeat(72));

    for (i, item) in session.agenda_item.iter().enumerate() {
        let first_line = item.description.lines().next().unwrap_or_default();
        let mut subject: String = first_line.chars().take(DESCRIPTION_WIDTH).collect();
        if subject.len() < first_line.len() {
            subject.push('…');
        }
        let vote = item
            .vote_result
            .map(|v| format!("{}/{}/{}/{}", v.pro, v.contra, v.abstention, v.prejudiced))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>3} | {:<w$} | {:<12} | {:>3} docs | {}",
            i + 1,
            subject,
            item.template_id.as_deref().unwrap_or("-"),
            item.documents.len(),
            vote,
            w = DESCRIPTION_WIDTH + 1
        );
    }
}

/// Wall-clock time as `mm:ss`, with hours once a run passes the hour.
fn elapsed_label(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    match h {
        0 => format!("{:02}:{:02}", m, s),
        _ => format!("{}:{:02}:{:02}", h, m, s),
    }
}
