//! kanna - personal vocabulary notebook
//!
//! One-shot: `kanna -w hello -w world --wl 3`
//! Interactive: `kanna`, then `w <word>`, `<word>`, `wl [n]`, `q`.

use anyhow::{Context, Result};
use clap::Parser;
use kanna_common::config::{
    load_or_create_config, RootFolderInitializer, RootFolderResolver, YOUDAO_KEY_ENV,
};
use kanna_word::dispatcher::{Command, CommandDispatcher, CommandSender};
use kanna_word::AppContext;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for kanna
#[derive(Parser, Debug)]
#[command(name = "kanna")]
#[command(about = "Look up words, cache their translations and hear how they sound")]
#[command(version)]
struct Args {
    /// Root folder holding config.toml, the database and speech clips
    #[arg(short, long, env = "KANNA_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Word to look up (repeatable)
    #[arg(short = 'w', long = "word", value_name = "WORD")]
    words: Vec<String>,

    /// Show the N most frequently looked-up words
    #[arg(long = "wl", value_name = "N", num_args = 0..=1, default_missing_value = "5")]
    list: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let root = RootFolderInitializer::new(RootFolderResolver::new(args.root_folder.clone()).resolve());
    let created_dirs = root
        .ensure_directories()
        .with_context(|| format!("Failed to initialize {}", root.root_folder().display()))?;

    let loaded = load_or_create_config(&root.config_path())?;
    let config = loaded.config;
    kanna_common::logging::init_tracing(
        &config.logging,
        root.log_path(&config.logging).as_deref(),
    )?;

    for dir in &created_dirs {
        info!("Created directory: {}", dir.display());
    }
    if loaded.created {
        let notice = format!(
            "Wrote default config to {}; set [youdao] key (or {}) before looking up new words",
            root.config_path().display(),
            YOUDAO_KEY_ENV
        );
        warn!("{}", notice);
        // Logs go to a file by default
        eprintln!("{}", notice);
    }

    info!(
        "Starting kanna v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", root.root_folder().display());

    let context = AppContext::initialize(&root, &config).await?;
    match context.store.count_words().await {
        Ok(count) => info!(count, "Word cache ready"),
        Err(e) => warn!(error = %e, "Could not count cached words"),
    }

    let (commands, dispatcher) =
        CommandDispatcher::new(context.lookup_service(), context.formatter(), std::io::stdout());
    let dispatcher = tokio::spawn(dispatcher.run());

    let interrupted = if args.words.is_empty() && args.list.is_none() {
        run_interactive(commands).await?
    } else {
        submit_one_shot(&commands, &args).await?;
        drop(commands);
        false
    };

    if interrupted {
        dispatcher.abort();
        context.tasks.abort().await;
    } else {
        dispatcher.await.context("Command dispatcher panicked")?;
        context
            .tasks
            .shutdown(Duration::from_secs(config.shutdown_grace_secs))
            .await;
    }

    info!("kanna stopped");
    Ok(())
}

async fn submit_one_shot(commands: &CommandSender, args: &Args) -> Result<()> {
    for word in &args.words {
        commands.lookup(word.as_str()).await?;
    }
    if let Some(count) = &args.list {
        commands.list(count.as_str()).await?;
    }
    Ok(())
}

/// Feed stdin lines to the dispatcher until EOF, `q`, or Ctrl+C
///
/// Returns `true` when interrupted.
async fn run_interactive(commands: CommandSender) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                return Ok(true);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    return Ok(false);
                };
                if matches!(line.trim(), "q" | "quit" | "exit") {
                    return Ok(false);
                }
                if let Some(command) = Command::parse_line(&line) {
                    commands.send(command).await?;
                }
            }
        }
    }
}
