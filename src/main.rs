//! # Tripsafe CLI (`tripsafe`)
//!
//! ## Usage
//!
//! ```bash
//! tripsafe --config ./config/tripsafe.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tripsafe sections` | Index the knowledge file and list its sections |
//! | `tripsafe ask "<message>"` | Answer a message the way `POST /ask` does |
//! | `tripsafe serve` | Start the HTTP server |
//!
//! Logs go to stderr and are filtered by `RUST_LOG`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripsafe::assistant::{ask, AskRequest};
use tripsafe::config;
use tripsafe::knowledge::KnowledgeBase;
use tripsafe::server;

/// Travel-safety assistant backed by a sectioned PDF guide.
#[derive(Parser)]
#[command(
    name = "tripsafe",
    about = "Tripsafe: travel-safety assistant backed by a sectioned PDF guide",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tripsafe.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the knowledge file and list section keys in index order.
    Sections,

    /// Answer a message from the knowledge base.
    Ask {
        /// The user message.
        message: String,

        /// Reply language: `English`, `Hindi`, or `Japanese`.
        #[arg(long, default_value = "English")]
        language: String,

        /// Print which resolver tier produced the answer.
        #[arg(long)]
        explain: bool,

        /// Do not fall back to weak fuzzy matches.
        #[arg(long)]
        strict: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripsafe=info,tower_http=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sections => {
            let kb = KnowledgeBase::open(&cfg).await?;
            let keys = kb.section_keys();
            for key in &keys {
                println!("{}", key);
            }
            println!("{} sections indexed", keys.len());
        }
        Commands::Ask {
            message,
            language,
            explain,
            strict,
        } => {
            cfg.resolver.strict_threshold |= strict;
            let kb = KnowledgeBase::open(&cfg).await?;
            let mut req = AskRequest::new(message);
            req.language = language;
            let reply = ask(&kb, &req)?;

            println!("{}", reply.reply);
            if !reply.tips.is_empty() {
                println!();
                println!("Tips:");
                for tip in &reply.tips {
                    println!("  - {}", tip);
                }
            }
            if explain {
                if let Some(tier) = reply.tier {
                    println!();
                    println!("tier: {}", tier);
                }
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
