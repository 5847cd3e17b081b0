use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use review_client::{
    config::{load_settings, load_settings_from},
    ConsoleSettings, DeleteRequest, HttpRecordsApi, LoadOutcome, ReviewSession, SaveRequest,
};
use shared::domain::{Page, Record, RecordId};

#[derive(Parser, Debug)]
#[command(name = "review_cli", about = "Headless access to the transcript review backend")]
struct Cli {
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of records.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Replace a record's text and correctness flag.
    Save {
        id: i64,
        text: String,
        /// Defaults to the record's current flag, looked up on `--page`.
        #[arg(long)]
        correct: Option<bool>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Delete {
        id: i64,
        /// Page to show after the delete.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Download every record as CSV.
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn resolve_settings(cli: &Cli) -> Result<ConsoleSettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("failed to load settings from '{}'", path.display()))?,
        None => load_settings(),
    };
    if let Some(url) = &cli.backend_url {
        settings.backend_url = url.clone();
    }
    if let Some(page_size) = cli.page_size {
        settings.page_size = page_size;
    }
    settings.validated().context("invalid settings")
}

fn format_record(record: &Record) -> String {
    format!(
        "#{:<6} [{}] {}  {}",
        record.id.0,
        if record.is_correct { "x" } else { " " },
        record.audio_ref.as_str(),
        record.text.replace('\n', " ")
    )
}

fn print_page(page: &Page) {
    println!(
        "page {}/{} ({} records total)",
        page.page_number, page.total_pages, page.total_records
    );
    if page.is_empty() {
        println!("  (no records on this page)");
    }
    for record in &page.records {
        println!("  {}", format_record(record));
    }
}

fn default_export_name(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("records-{}.csv", now.format("%Y%m%d-%H%M%S")))
}

async fn load(session: &mut ReviewSession, page: u32) -> Result<()> {
    match session.load_page(page).await {
        LoadOutcome::Applied => Ok(()),
        outcome => bail!("failed to load page {page} ({outcome:?})"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let api = Arc::new(HttpRecordsApi::from_settings(&settings));
    let mut session = ReviewSession::new(api, settings.page_size);

    match cli.command {
        Command::List { page } => {
            load(&mut session, page).await?;
            print_page(session.controller().page());
        }
        Command::Save {
            id,
            text,
            correct,
            page,
        } => {
            let id = RecordId(id);
            let is_correct = match correct {
                Some(flag) => flag,
                None => {
                    load(&mut session, page).await?;
                    match session.controller().page().record(id) {
                        Some(record) => record.is_correct,
                        None => bail!("record {id} is not on page {page}; pass --correct"),
                    }
                }
            };
            session
                .save(SaveRequest {
                    id,
                    text,
                    is_correct,
                })
                .await
                .with_context(|| format!("failed to save record {id}"))?;
            match session.controller().page().record(id) {
                Some(record) => println!("saved {}", format_record(record)),
                None => println!("saved record {id}"),
            }
        }
        Command::Delete { id, page } => {
            let id = RecordId(id);
            // The reload after the delete targets the loaded page.
            load(&mut session, page).await?;
            session
                .delete(DeleteRequest { id })
                .await
                .with_context(|| format!("failed to delete record {id}"))?;
            println!("deleted record {id}");
            print_page(session.controller().page());
        }
        Command::Export { output } => {
            let dest = output.unwrap_or_else(|| default_export_name(Local::now()));
            let bytes = session
                .export_csv(&dest)
                .await
                .with_context(|| format!("failed to export records to '{}'", dest.display()))?;
            println!("exported {bytes} bytes to {}", dest.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::domain::AudioRef;

    #[test]
    fn formats_record_on_one_line() {
        let record = Record {
            id: RecordId(12),
            text: "two\nlines".into(),
            audio_ref: AudioRef::new("audio/clip_12.wav"),
            is_correct: true,
        };
        assert_eq!(
            format_record(&record),
            "#12     [x] audio/clip_12.wav  two lines"
        );
    }

    #[test]
    fn export_name_carries_local_timestamp() {
        let now = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("unambiguous time");
        assert_eq!(
            default_export_name(now),
            PathBuf::from("records-20240309-140507.csv")
        );
    }

    #[test]
    fn save_accepts_explicit_flag() {
        let cli = Cli::parse_from(["review_cli", "save", "4", "new text", "--correct", "true"]);
        match cli.command {
            Command::Save {
                id, text, correct, ..
            } => {
                assert_eq!(id, 4);
                assert_eq!(text, "new text");
                assert_eq!(correct, Some(true));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_feed_settings() {
        let cli = Cli::parse_from([
            "review_cli",
            "--backend-url",
            "https://review.example.org/",
            "--page-size",
            "50",
            "list",
        ]);
        let settings = resolve_settings(&cli).expect("settings");
        assert_eq!(settings.backend_url, "https://review.example.org");
        assert_eq!(settings.page_size, 50);
    }
}
