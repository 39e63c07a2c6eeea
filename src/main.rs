//! Intent Flow - CLI Interface
//!
//! Command-line front end for classifying messages against an intent catalog.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intent_flow::{Catalog, IntentConfig, IntentEngine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intent-flow")]
#[command(about = "Intent Flow - classify short messages into intents", long_about = None)]
struct Cli {
    /// Path to an intent catalog (JSON); the built-in order catalog is used otherwise
    #[arg(short, long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Path to a configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging of per-intent scores
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive loop
    Repl,

    /// Classify a single message
    Detect {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show the top scoring intents for a message
    Explain {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the intents in the catalog
    Intents,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match &cli.config {
        Some(path) => IntentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IntentConfig::default(),
    };

    let tokenizer = config.tokenizer.build();
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path, tokenizer)
            .with_context(|| format!("loading intent catalog {}", path.display()))?,
        None => Catalog::builtin(tokenizer).context("loading built-in intent catalog")?,
    };

    let engine = IntentEngine::new(catalog, config.scoring);

    match cli.command {
        Commands::Repl => run_repl(&engine)?,
        Commands::Detect { text } => {
            let result = engine.detect(&text.join(" "));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Explain { text } => {
            print!("{}", engine.explain(&text.join(" ")));
        }
        Commands::Intents => list_intents(&engine),
    }

    Ok(())
}

/// Read lines until "exit", "quit" or end of input
fn run_repl(engine: &IntentEngine) -> Result<()> {
    println!("=== INTENT FLOW ===");
    list_intents(engine);
    println!("\nEnter text to get intent (\"exit\" or Ctrl+C to quit)\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("reading from stdin")?;
        let message = line.trim();

        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        match message {
            "info" => {
                println!("{}\n", engine.info());
                continue;
            }
            "help" => {
                show_repl_help();
                continue;
            }
            _ => {}
        }

        let result = engine.detect(message);
        log::debug!("Classified {:?} as {}", message, result.intent_id);
        println!("{}\n", serde_json::to_string_pretty(&result)?);
    }

    println!("Goodbye!");
    Ok(())
}

fn list_intents(engine: &IntentEngine) {
    println!("Available intents:");
    for intent in engine.catalog().intents() {
        println!("  {}: {}", intent.id(), intent.label());
    }
}

/// Show REPL help
fn show_repl_help() {
    println!("REPL Commands:");
    println!("  info    - Show engine information");
    println!("  help    - Show this help");
    println!("  exit    - Exit REPL");
    println!();
}
