//! CLI entry point for `mboxview`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use mboxview::error::MboxViewError;
use mboxview::filter::ConversationFilter;
use mboxview::{group_conversations, parse_emails, Conversation, EmailRecord};

#[derive(Parser)]
#[command(name = "mboxview", version, about = "Parse MBOX archives into subject-threaded conversations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List parsed emails, one per line
    List {
        path: PathBuf,
    },
    /// Show conversations grouped by subject
    Threads {
        path: PathBuf,
        /// Only conversations matching this search term
        #[arg(long)]
        query: Option<String>,
    },
    /// Show archive statistics
    Stats {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Export parsed records as JSON to stdout
    Export {
        path: PathBuf,
        /// What to export
        #[arg(short, long, value_enum, default_value = "emails")]
        what: ExportKind,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum ExportKind {
    Emails,
    Threads,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::List { path } => cmd_list(&path),
        Commands::Threads { path, query } => cmd_threads(&path, query.as_deref()),
        Commands::Stats { path, json } => cmd_stats(&path, json),
        Commands::Export { path, what } => cmd_export(&path, what),
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the archive into memory, mapping file errors to library errors.
fn load_archive(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MboxViewError::FileNotFound(path.to_path_buf())
        } else {
            MboxViewError::io(path, e)
        }
    })?;
    Ok(text)
}

fn parse_file(path: &Path) -> anyhow::Result<Vec<EmailRecord>> {
    let archive = load_archive(path)?;
    Ok(parse_emails(&archive))
}

fn cmd_list(path: &Path) -> anyhow::Result<()> {
    for email in parse_file(path)? {
        let marker = if email.has_attachments() { "@" } else { " " };
        println!("{} {} | {} | {}", marker, email.date, email.from, email.subject);
    }
    Ok(())
}

fn cmd_threads(path: &Path, query: Option<&str>) -> anyhow::Result<()> {
    let emails = parse_file(path)?;
    let mut conversations = group_conversations(&emails);
    if let Some(term) = query {
        conversations = ConversationFilter::search(term).apply(&conversations);
    }
    for c in &conversations {
        println!("{} | [{}] {} | {}", c.date, c.count, c.subject, c.participants.join(", "));
    }
    Ok(())
}

fn cmd_stats(path: &Path, json: bool) -> anyhow::Result<()> {
    let emails = parse_file(path)?;
    let conversations = group_conversations(&emails);
    let attachments: usize = emails.iter().map(|e| e.attachments.len()).sum();

    if json {
        let stats = serde_json::json!({
            "emails": emails.len(),
            "conversations": conversations.len(),
            "attachments": attachments,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Emails:        {}", emails.len());
        println!("Conversations: {}", conversations.len());
        println!("Attachments:   {attachments}");
    }
    Ok(())
}

fn cmd_export(path: &Path, what: ExportKind) -> anyhow::Result<()> {
    let emails = parse_file(path)?;
    let output = match what {
        ExportKind::Emails => serde_json::to_string_pretty(&emails),
        ExportKind::Threads => {
            let conversations: Vec<Conversation> = group_conversations(&emails);
            serde_json::to_string_pretty(&conversations)
        }
    }
    .context("serializing records to JSON")?;
    println!("{output}");
    Ok(())
}
