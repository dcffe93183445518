//! SPA Gateway
//!
//! Build-time and boot-time companion of a single-page application.
//!
//! # Architecture Overview
//!
//! ```text
//!   build:  gateway.toml ─▶ validation ─▶ routes (check)
//!                                    └──▶ assets::plan ─▶ assets::copy ─▶ public/
//!
//!   boot:   process env ─▶ resolver ─▶ RuntimeConfig (Arc, process lifetime)
//!           gateway.toml ─▶ RouteTable ─┐
//!                                       ▼
//!     Client ─▶ request id ─▶ trace ─▶ gateway handler ─┬─▶ rewrite ─▶ upstream backend
//!                                                       ├─▶ /__runtime-config
//!                                                       └─▶ public/ (static files)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use spa_gateway::assets::{self, AssetError, BuildVariant};
use spa_gateway::config::loader::{load_or_default, ConfigError};
use spa_gateway::config::resolver::resolve_entries;
use spa_gateway::config::validation::check_backend_consistency;
use spa_gateway::config::{runtime, GatewayConfig, ObservabilityConfig, ProcessEnv};
use spa_gateway::lifecycle::{startup, StartupError};
use spa_gateway::observability::init_logging;
use spa_gateway::routing::{RouteTable, RoutingError};

#[derive(Parser)]
#[command(name = "spa-gateway", version)]
#[command(about = "Rewrite proxy, asset staging and runtime configuration for the SPA", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML). Defaults to the reference deployment.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway
    Serve,
    /// Copy third-party assets into the served-assets root
    Stage {
        /// Build variant being produced
        #[arg(long, value_enum)]
        variant: BuildVariant,

        /// Print the plan without copying
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the rewrite table
    Routes,
    /// Print the resolved runtime configuration (secrets omitted)
    Env {
        /// Show every declared key with its coercion
        #[arg(long)]
        explain: bool,
    },
    /// Validate configuration and compare rewrite upstreams with runtime URLs
    Check,
}

/// Failures of a subcommand after configuration has loaded.
#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("failed to render runtime configuration: {0}")]
    Render(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_or_default(cli.config.as_deref());
    let observability = loaded
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_else(|_| ObservabilityConfig::default());
    init_logging(&observability);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(
        config = ?cli.config,
        routes = config.routes.len(),
        copies = config.assets.copies.len(),
        "Configuration loaded"
    );

    match execute(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_command_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands, config: GatewayConfig) -> Result<(), CommandError> {
    match command {
        Commands::Serve => startup::run(config).await?,
        Commands::Stage { variant, dry_run } => stage(&config, variant, dry_run)?,
        Commands::Routes => {
            let table = RouteTable::from_declarations(&config.routes)?;
            for rule in table.rules() {
                println!("{:<24} -> {}", rule.source(), rule.destination());
            }
        }
        Commands::Env { explain } => {
            if explain {
                for (entry, value) in resolve_entries(&ProcessEnv) {
                    let shown = if entry.secret {
                        "<redacted>".to_string()
                    } else {
                        value.to_string()
                    };
                    let shown = if shown.len() > 60 {
                        format!("{}…", shown.chars().take(59).collect::<String>())
                    } else {
                        shown
                    };
                    println!("{:<30} {:<40} {}", entry.key, entry.coercion.to_string(), shown);
                }
            } else {
                let json = runtime::global().to_public_json();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Commands::Check => {
            let table = RouteTable::from_declarations(&config.routes)?;
            let warnings = check_backend_consistency(&table, &runtime::global());
            println!(
                "configuration OK: {} rewrite rules, {} asset copies",
                table.len(),
                config.assets.copies.len()
            );
            for w in &warnings {
                println!("warning: {}", w);
            }
        }
    }

    Ok(())
}

fn stage(config: &GatewayConfig, variant: BuildVariant, dry_run: bool) -> Result<(), assets::AssetError> {
    let plan = assets::plan_copies(&config.assets, variant)?;

    if dry_run {
        for task in &plan.tasks {
            println!(
                "{} -> {} ({})",
                task.source.display(),
                task.destination.display(),
                task.applies_to
            );
        }
        return Ok(());
    }

    let report = assets::execute(&plan)?;
    println!(
        "{} build: {} copied, {} unchanged",
        variant,
        report.copied.len(),
        report.unchanged.len()
    );
    Ok(())
}

fn report_config_error(error: &ConfigError) {
    match error {
        ConfigError::Validation(errors) => {
            for e in errors {
                tracing::error!(error = %e, "Invalid configuration");
            }
        }
        other => tracing::error!(error = %other, "Failed to load configuration"),
    }
}

fn report_command_error(error: &CommandError) {
    match error {
        CommandError::Routing(RoutingError::Ambiguous(ambiguities))
        | CommandError::Startup(StartupError::Routing(RoutingError::Ambiguous(ambiguities))) => {
            for a in ambiguities {
                tracing::error!(
                    first = %a.first_pattern,
                    second = %a.second_pattern,
                    "Ambiguous rewrite rules: {}",
                    a
                );
            }
        }
        other => tracing::error!(error = %other, "Command failed"),
    }
}
