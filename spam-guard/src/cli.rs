//! Command-line front end
//!
//! ```bash
//! # Classify one message
//! spam-guard check --text "join our trading group" --channel "Book Club"
//!
//! # Moderate a JSON-lines event stream, acting as channel admin
//! spam-guard --config guard.toml watch --admin < events.jsonl
//!
//! # Show the effective configuration
//! spam-guard config
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::GuardConfig;
use crate::error::Result;
use crate::llm::Credentials;
use crate::moderation::{ChannelActions, InboundEvent, Moderator};
use crate::pipeline::SpamPipeline;
use crate::spam::Message;

#[derive(Parser, Debug)]
#[command(name = "spam-guard")]
#[command(about = "Layered spam classification for group chats", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single message and print the verdict
    Check {
        /// Message text
        #[arg(short, long)]
        text: String,
        /// Sender display name
        #[arg(short, long, default_value = "unknown")]
        sender: String,
        /// Channel name
        #[arg(long, default_value = "unknown")]
        channel: String,
    },
    /// Moderate JSON-lines events read from stdin
    Watch {
        /// Answer privilege checks as channel admin
        #[arg(long)]
        admin: bool,
    },
    /// Print the effective configuration
    Config,
}

/// Collaborator that reports actions on stdout instead of calling a transport
#[derive(Debug, Clone)]
pub struct StdoutActions {
    admin: bool,
}

impl StdoutActions {
    pub fn new(admin: bool) -> Self {
        Self { admin }
    }
}

#[async_trait::async_trait]
impl ChannelActions for StdoutActions {
    async fn is_privileged(&self, _channel_id: &str) -> Result<bool> {
        Ok(self.admin)
    }

    async fn delete_for_everyone(&self, channel_id: &str, message_id: &str) -> Result<()> {
        println!(
            "{}",
            json!({ "action": "delete", "channel_id": channel_id, "message_id": message_id })
        );
        Ok(())
    }
}

/// Entry point for the binary
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GuardConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    crate::logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Check {
            text,
            sender,
            channel,
        } => check(&config, Message::new(text, sender, channel)).await,
        Commands::Watch { admin } => watch(&config, admin).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn check(config: &GuardConfig, message: Message) -> anyhow::Result<()> {
    let pipeline = SpamPipeline::from_config(config, &Credentials::from_env())?;
    let decision = pipeline.decide(&message).await;
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

async fn watch(config: &GuardConfig, admin: bool) -> anyhow::Result<()> {
    let pipeline = SpamPipeline::from_config(config, &Credentials::from_env())?;
    let moderator = Moderator::from_config(config, pipeline, Arc::new(StdoutActions::new(admin)));

    info!(
        "Watching stdin (dry_run={}, ai={}, admin={})",
        moderator.is_dry_run(),
        moderator.pipeline().ai_enabled(),
        admin
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = Vec::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event: InboundEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring malformed event: {}", e);
                continue;
            }
        };

        let moderator = moderator.clone();
        tasks.push(tokio::spawn(async move {
            let outcome = moderator.handle(&event).await;
            println!(
                "{}",
                json!({ "message_id": event.message_id, "channel_id": event.channel_id, "result": outcome })
            );
        }));
    }

    for joined in futures::future::join_all(tasks).await {
        if let Err(e) = joined {
            warn!("Moderation task failed: {}", e);
        }
    }

    println!("{}", serde_json::to_string_pretty(&moderator.stats())?);
    Ok(())
}
