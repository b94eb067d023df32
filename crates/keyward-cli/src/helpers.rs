//! Shared helpers for the `keyward` binary: tracing setup, stdin input and
//! output formatting.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use keyward_vault::CredentialRecord;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber. `RUST_LOG` overrides `default_level`.
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read one line from stdin, without the trailing newline.
pub fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        bail!("stdin closed before a value was read");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush().context("failed to flush stderr")?;
    let answer = read_stdin_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What the CLI prints for a record. The envelope is never shown.
#[derive(Serialize)]
pub struct RecordView<'a> {
    pub id: i64,
    pub title: &'a str,
    pub username: &'a str,
    pub website: &'a str,
    pub notes: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<&'a str>,
}

impl<'a> RecordView<'a> {
    pub fn new(record: &'a CredentialRecord) -> Self {
        Self {
            id: record.id.0,
            title: &record.title,
            username: &record.username,
            website: &record.website,
            notes: &record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
            secret: None,
        }
    }

    pub fn with_secret(mut self, secret: &'a str) -> Self {
        self.secret = Some(secret);
        self
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// One line per record: id, title, username, website.
pub fn print_table(records: &[CredentialRecord]) {
    if records.is_empty() {
        println!("  (no credentials)");
        return;
    }

    let title_width = column_width(records.iter().map(|r| r.title.as_str()), "TITLE");
    let user_width = column_width(records.iter().map(|r| r.username.as_str()), "USERNAME");

    println!(
        "  {:>4}  {:<title_width$}  {:<user_width$}  WEBSITE",
        "ID", "TITLE", "USERNAME"
    );
    for record in records {
        println!(
            "  {:>4}  {:<title_width$}  {:<user_width$}  {}",
            record.id.0, record.title, record.username, record.website
        );
    }
}

/// Multi-line detail view of one record.
pub fn print_detail(view: &RecordView<'_>) {
    println!("  ID:        {}", view.id);
    println!("  Title:     {}", view.title);
    println!("  Username:  {}", view.username);
    if !view.website.is_empty() {
        println!("  Website:   {}", view.website);
    }
    if !view.notes.is_empty() {
        println!("  Notes:     {}", view.notes);
    }
    println!("  Created:   {}", format_time(view.created_at));
    println!("  Updated:   {}", format_time(view.updated_at));
    match view.secret {
        Some(secret) => println!("  Secret:    {secret}"),
        None => println!("  Secret:    ******** (use --reveal)"),
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(header.len())
}
