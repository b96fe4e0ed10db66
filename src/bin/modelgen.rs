//! Model Generator CLI
//!
//! Generates model modules from schema definition files and checks that
//! generated files are in sync.
//!
//! Usage:
//!   modelgen generate --input schema --output schema/models
//!   modelgen check --verbose
//!   modelgen inspect books
//!   modelgen --help

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use modelgen::pipeline::{self, render_named};
use modelgen::{render_validator, ModelgenConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modelgen")]
#[command(about = "Generate document models from schema definitions")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one model module per definition file
    Generate {
        /// Directory holding definition files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory generated modules are written to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that generated modules match their definitions
    Check {
        /// Show up-to-date entities and diffs of stale ones
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the translated schema, indexes and diagnostics of an entity
    Inspect {
        entity: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the collection validator of an entity
    Validator { entity: String },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init { path: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config =
        ModelgenConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Generate { input, output } => {
            if let Some(input) = input {
                config.input.dir = input;
            }
            if let Some(output) = output {
                config.output.dir = output;
            }

            println!("🔧 Generating models from {}\n", config.input.dir.display());
            let report = pipeline::generate_files(&config)?;
            print!("{}", report.render());
            Ok(!report.has_fatal())
        }

        Commands::Check { verbose } => {
            println!("🔍 Checking generated modules in {}\n", config.output.dir.display());
            let report = pipeline::check_drift(&config)?;
            print!("{}", report.render(verbose));
            Ok(!report.has_drift() && report.load_failures.is_empty())
        }

        Commands::Inspect { entity, format } => {
            let rendered = render_named(&config, &entity)?;
            let schema = &rendered.translation.schema;

            match format.as_str() {
                "json" => {
                    let out = serde_json::json!({
                        "schema": schema,
                        "indexes": rendered.indexes,
                        "diagnostics": rendered.translation.diagnostics.all(),
                        "path": rendered.module.path,
                        "checksum": rendered.module.checksum,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                _ => {
                    println!("📋 {} ({})", rendered.module.model_name, entity);
                    println!("{}", serde_json::to_string_pretty(schema)?);
                    println!();
                    if rendered.indexes.is_empty() {
                        println!("Indexes: none");
                    } else {
                        println!("Indexes:");
                        for index in &rendered.indexes {
                            println!("  └─ {}", index);
                        }
                    }
                    for item in rendered.translation.diagnostics.all() {
                        println!("{}", item);
                    }
                    let module = &rendered.module;
                    println!("\n{} -> {}", module.checksum.short(), module.path.display());
                }
            }
            Ok(true)
        }

        Commands::Validator { entity } => {
            let rendered = render_named(&config, &entity)?;
            let validator = render_validator(&rendered.translation.schema);
            println!("{}", serde_json::to_string_pretty(&validator)?);
            Ok(true)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml()?);
                Ok(true)
            }
            ConfigAction::Init { path } => {
                if path.exists() {
                    anyhow::bail!("{} already exists", path.display());
                }
                ModelgenConfig::default()
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("✅ Configuration written to {}", path.display());
                Ok(true)
            }
        },
    }
}
