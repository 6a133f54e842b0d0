//! Conform CLI
//!
//! Checks the interfaces and type surfaces listed in a `conform.toml`
//! manifest against each other and reports which pairs conform.

mod commands;
mod manifest;
mod output;

use clap::{Parser, Subcommand};
use commands::check::{self, CheckOptions, Format};
use commands::inspect;
use std::path::PathBuf;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conform")]
#[command(about = "Structural interface conformance checker", long_about = None)]
#[command(version)]
struct Cli {
    /// When to use colors
    #[arg(long, global = true, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every interface against every type
    Check {
        /// Manifest file
        #[arg(default_value = "conform.toml")]
        manifest: PathBuf,
        /// Only check this interface
        #[arg(long)]
        interface: Option<String>,
        /// Only check this type
        #[arg(long = "type")]
        concrete: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        format: Format,
    },

    /// Print descriptors with their overload groups and slots
    Inspect {
        /// Manifest file
        #[arg(default_value = "conform.toml")]
        manifest: PathBuf,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let color = output::resolve_color_choice(cli.color.as_deref());

    let result = match cli.command {
        Commands::Check {
            manifest,
            interface,
            concrete,
            format,
        } => check::execute(
            &manifest,
            CheckOptions {
                interface: interface.as_deref(),
                concrete: concrete.as_deref(),
                format,
                color,
            },
        ),
        Commands::Inspect { manifest } => inspect::execute(&manifest, color).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::StyledOutput::new(color).stderr_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Install a stderr subscriber when `CONFORM_LOG` is set.
///
/// `CONFORM_LOG_STYLE=full` adds timestamps and span open/close events.
fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_env("CONFORM_LOG") else {
        return;
    };
    let style = std::env::var("CONFORM_LOG_STYLE").unwrap_or_default();
    if style == "full" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .compact()
            .without_time()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    tracing::debug!("tracing initialized");
}
