// Copyright 2026 Imgharvest Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use imgharvest::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "imgharvest",
    about = "Discover images referenced by web pages and bundle a chosen set into a zip archive",
    version,
    after_help = "Run 'imgharvest <command> --help' for details on each command."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (binds 127.0.0.1)
        #[arg(long, default_value = "8140")]
        port: u16,
        /// Emit logs as JSON
        #[arg(long)]
        log_json: bool,
    },
    /// Discover image candidates on one or more pages
    Discover {
        /// Page URLs to scan (the first 5 are used)
        #[arg(required = true)]
        urls: Vec<String>,
        /// 1-based result page
        #[arg(long, default_value = "1")]
        page: i64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch image URLs and write them into a zip archive
    Bundle {
        /// Image URLs to fetch (at most 100)
        #[arg(required = true)]
        urls: Vec<String>,
        /// Output path for the archive
        #[arg(long, default_value = "images.zip")]
        out: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port, log_json } => cli::serve_cmd::run(port, log_json).await,
        Commands::Discover { urls, page, json } => {
            cli::discover_cmd::run(&urls, page, json).await
        }
        Commands::Bundle { urls, out } => cli::bundle_cmd::run(&urls, &out).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "imgharvest", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    result
}
