//! Reaction Roles operator CLI
//!
//! # Usage
//!
//! ```bash
//! # Render a setup and the listing it would produce, without sending anything
//! reaction_roles preview --title "Roles" --description "Pick one" \
//!     --channel 123 --option 900=VIP --option 901=🎉
//!
//! # List stored setups for channels (requires the `database` feature)
//! reaction_roles list --channel 123 --channel 456
//!
//! # Resolve a clicked control to its binding (requires the `database` feature)
//! reaction_roles resolve --channel 123 --message 789 --custom-id reaction_role_123_1
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reaction_roles::{
    DisplayUnit, InMemoryBindingStore, MessagePublisher, PublishError, PublishedMessage,
    ReactionRolesConfig, RenderedSetup, SetupCommand, SetupReader, SetupService, SetupStatus,
};

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/reaction_roles.yaml";

#[derive(Parser)]
#[command(name = "reaction_roles")]
#[command(version = "0.1.0")]
#[command(about = "Preview, list and resolve reaction role setups")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true, env = "REACTION_ROLES_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a setup against an in-memory store
    Preview {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        channel: String,

        /// `role=label` pairs, slot order; up to five
        #[arg(long = "option", value_name = "ROLE=LABEL")]
        options: Vec<String>,
    },

    /// List stored setups visible in the given channels
    #[cfg(feature = "database")]
    List {
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,
    },

    /// Look up the binding behind a clicked control
    #[cfg(feature = "database")]
    Resolve {
        #[arg(long)]
        channel: String,

        #[arg(long)]
        message: String,

        #[arg(long)]
        custom_id: String,
    },
}

/// Accepts every message without sending it
struct DryRunPublisher;

#[async_trait]
impl MessagePublisher for DryRunPublisher {
    async fn publish(
        &self,
        channel_id: &str,
        _setup: &RenderedSetup,
    ) -> Result<PublishedMessage, PublishError> {
        Ok(PublishedMessage {
            channel_id: channel_id.to_string(),
            message_id: "preview".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reaction_roles=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ReactionRolesConfig::load_or_default(&cli.config);

    let result = match cli.command {
        Commands::Preview {
            title,
            description,
            channel,
            options,
        } => cmd_preview(&config, title, description, channel, options, cli.format).await,
        #[cfg(feature = "database")]
        Commands::List { channels } => cmd_list(&config, channels, cli.format).await,
        #[cfg(feature = "database")]
        Commands::Resolve {
            channel,
            message,
            custom_id,
        } => cmd_resolve(&config, channel, message, custom_id, cli.format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn parse_option(raw: &str) -> Result<(String, String)> {
    let (role, label) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("option '{raw}' must look like ROLE=LABEL"))?;
    Ok((role.to_string(), label.to_string()))
}

async fn cmd_preview(
    config: &ReactionRolesConfig,
    title: String,
    description: String,
    channel: String,
    options: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    if options.len() > 5 {
        return Err(anyhow!("at most five options, got {}", options.len()));
    }

    let mut command = SetupCommand::new(title, description, channel.clone());
    for (i, raw) in options.iter().enumerate() {
        let (role, label) = parse_option(raw)?;
        command = command.with_slot(i + 1, role, label);
    }

    let store = Arc::new(InMemoryBindingStore::new());
    let service = SetupService::new(store.clone(), Arc::new(DryRunPublisher), &config.display);

    let prepared = service.prepare(&command.into_request())?;
    let rendered = prepared.rendered.clone();
    let published = service.publish(prepared).await?;
    let report = service.persist(published).await;
    if let SetupStatus::Partial { error, .. } = report.status {
        return Err(anyhow!(error).context("preview store rejected a binding"));
    }

    let visible: HashSet<String> = HashSet::from([channel]);
    let reader = SetupReader::new(store, &config.display);
    let listing = reader.list_for_guild(&visible).await?.into_units();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "setup": rendered,
                "bindings": report.persisted,
                "listing": listing,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("JSON serialization failed")?
            );
        }
        OutputFormat::Text => {
            print_unit(&rendered.summary);
            for control in &rendered.controls {
                println!(
                    "  [{}] label={} glyph={} style={:?}",
                    control.custom_id,
                    control.label.as_deref().unwrap_or("-"),
                    control.glyph.as_deref().unwrap_or("-"),
                    control.style
                );
            }
            println!();
            for unit in &listing {
                print_unit(unit);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "database")]
async fn cmd_list(
    config: &ReactionRolesConfig,
    channels: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let store = connect(config).await?;
    let visible: HashSet<String> = channels.into_iter().collect();
    let reader = SetupReader::new(store, &config.display);
    let outcome = reader.list_for_guild(&visible).await?;

    if outcome.is_empty() {
        println!("No reaction role setups found for this server.");
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(outcome.units()).context("JSON serialization failed")?
        ),
        OutputFormat::Text => outcome.units().iter().for_each(print_unit),
    }
    Ok(())
}

#[cfg(feature = "database")]
async fn cmd_resolve(
    config: &ReactionRolesConfig,
    channel: String,
    message: String,
    custom_id: String,
    format: OutputFormat,
) -> Result<()> {
    let store = connect(config).await?;
    let resolver = reaction_roles::ClickResolver::new(store);

    let binding = resolver
        .resolve(&channel, &message, &custom_id)
        .await?
        .ok_or_else(|| anyhow!("no binding for {custom_id} on message {message}"))?;

    let display = binding.display();
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&binding).context("JSON serialization failed")?
        ),
        OutputFormat::Text => println!(
            "{} [{}] -> role {}",
            binding.option_id,
            display
                .as_ref()
                .map_or("None", reaction_roles::DisplayToken::as_str),
            binding.grant_ref
        ),
    }
    Ok(())
}

#[cfg(feature = "database")]
async fn connect(config: &ReactionRolesConfig) -> Result<Arc<reaction_roles::PgBindingStore>> {
    let store = reaction_roles::PgBindingStore::connect(&config.database.resolve()).await?;
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}

fn print_unit(unit: &DisplayUnit) {
    if let Some(title) = &unit.title {
        println!("== {title} (#{:06X}) ==", unit.color);
    }
    println!("{}", unit.body.trim_end());
    println!();
}
