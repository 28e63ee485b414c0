// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PQRS desk - case intake and follow-up against the FileMaker Data API.
//!
//! This is the operator binary. Intake runs under the configured service
//! account; every other case command signs an employee in first.

mod check;
mod desk;
mod intake;
mod prompt;
mod render;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::desk::DeskCommand;
use crate::render::Output;

/// Exit status when the backend session could not be recovered.
const EXIT_RELOGIN: i32 = 2;

/// PQRS desk - case intake and follow-up.
#[derive(Parser, Debug)]
#[command(name = "pqrs", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a new case from a JSON intake form.
    Create {
        /// Intake form as JSON.
        form: PathBuf,
        /// File to attach to the case. Repeatable.
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,
        /// Email the requester a receipt with the radicado.
        #[arg(long)]
        notify: bool,
    },
    /// Check configuration, backend sign-in, and webhook settings.
    Check,
    #[command(flatten)]
    Desk(DeskCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => pqrs_config::load_and_validate_path(path),
        None => pqrs_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pqrs_config::render_errors(&errors);
            process::exit(1);
        }
    };

    init_tracing(&config.logging.level);
    let out = Output::new(cli.json, cli.plain);

    let result = match cli.command {
        Commands::Create {
            form,
            attachments,
            notify,
        } => intake::run_create(&config, &out, &form, &attachments, notify).await,
        Commands::Check => check::run_check(&config, &out).await,
        Commands::Desk(command) => desk::run_desk(&config, &out, command).await,
    };

    if let Err(err) = result {
        if err.requires_relogin() {
            eprintln!("pqrs: {err}. The session was cleared; run the command again to sign in.");
            process::exit(EXIT_RELOGIN);
        }
        eprintln!("pqrs: {err}");
        process::exit(1);
    }
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pqrs={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
