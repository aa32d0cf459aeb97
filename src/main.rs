mod activity;
mod attribution;
mod cli;
mod config;
mod content_store;
mod error;
mod gateway;
mod hooks;
mod manifest;
mod note_writer;
mod providers;
mod push_sync;
mod rewrite;
mod scrubber;
mod transcript;
mod work_period;

use clap::Parser;
use cli::Cli;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_ansi(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("prompt-story: {e}");
            process::exit(2);
        }
    };

    if let Err(err) = cli::run(cli, &cwd) {
        eprintln!("prompt-story: {err:#}");
        process::exit(1);
    }
}
