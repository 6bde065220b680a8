// Copyright (c) 2025 - Cowboy AI, Inc.
//! System Events Operator CLI
//!
//! Records, ends and inspects system events against the configured store,
//! announcing them to the subscribed channels.
//!
//! Run with: cargo run --bin sysevent -- create --category deploy ...
//!
//! Configuration comes from the environment (see `system_events::config`):
//! 1. ELASTICSEARCH_URL_CSV and ELASTICSEARCH_INDEX (or the pattern pair)
//! 2. AdvanceConfigurationPath for the category policy (optional)
//! 3. AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY to enable SNS (optional)
//!
//! `--dry-run` swaps the store for an in-memory one and sends nothing. The
//! store is discarded on exit, so only `create` and `start` are meaningful.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use system_events::{
    clock::SystemClock,
    config::{AppConfig, SLACK_SIGNING_SECRET},
    index::{IndexNameResolver, IndexSettings},
    monitoring::describe_client_metrics,
    notification::{
        slack::DEFAULT_TIMEOUT as SLACK_TIMEOUT, NotificationRouter, SlackChannel,
        SlackWebhookClient, SnsChannel, SnsClient,
    },
    slack::SlackRequestVerifier,
    store::{DocumentStoreClient, ElasticsearchBackend, InMemoryBackend, SearchBackend},
    timestamp::{TimestampFormat, TimestampProvider},
    CategoryPolicy, EventRequest, Level, SystemEventSender, SystemEventService,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DRY_RUN_INDEX: &str = "system-events-dry-run";

#[derive(Parser)]
#[command(name = "sysevent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Use an in-memory store and skip notifications.
    /// The store lives for one invocation, so `end` and `get` find nothing.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Category policy file (overrides AdvanceConfigurationPath)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Record a point-in-time event
    Create(EventArgs),
    /// Record a long-running event
    Start(EventArgs),
    /// Stamp the end time of an event
    End { id: String },
    /// Show an event
    Get { id: String },
    /// List the allowed categories
    Categories,
    /// List subscriptions with webhook URLs redacted
    Subscriptions,
    /// Verify a Slack request signature; the body is read from stdin
    VerifySignature {
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        signature: String,
        #[arg(long, env = SLACK_SIGNING_SECRET, hide_env_values = true)]
        secret: String,
    },
}

#[derive(Args)]
struct EventArgs {
    #[arg(long)]
    category: String,
    #[arg(long = "target")]
    target_key: String,
    #[arg(long, default_value = "information")]
    level: Level,
    #[arg(long)]
    message: String,
    #[arg(long)]
    sender: String,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    remote_ip: Option<String>,
}

impl EventArgs {
    fn into_request(self) -> EventRequest {
        let mut request = EventRequest::new(
            self.category,
            self.target_key,
            self.level,
            self.message,
            self.sender,
        )
        .with_tags(self.tags);
        if let Some(address) = self.remote_ip {
            request = request.with_remote_ip_address(address);
        }
        request
    }
}

fn load_policy(path: Option<PathBuf>) -> Result<CategoryPolicy> {
    let path = path.or_else(AppConfig::policy_path_from_env);
    match path {
        Some(path) => CategoryPolicy::load_from_path(&path)
            .with_context(|| format!("Failed to load category policy from {}", path.display())),
        None => {
            info!("No category policy configured, all categories allowed");
            Ok(CategoryPolicy::unrestricted())
        }
    }
}

fn dry_run_sender(policy: CategoryPolicy) -> Result<SystemEventSender> {
    let indices = IndexNameResolver::system(&IndexSettings {
        default_index: Some(DRY_RUN_INDEX.to_string()),
        ..Default::default()
    })?;
    let backend: Arc<dyn SearchBackend> = Arc::new(InMemoryBackend::new());

    Ok(SystemEventSender::new(
        DocumentStoreClient::new(backend, indices),
        TimestampProvider::system(TimestampFormat::default()),
        Arc::new(policy),
    ))
}

fn live_sender(config: AppConfig, policy: CategoryPolicy) -> Result<SystemEventSender> {
    let backend: Arc<dyn SearchBackend> = Arc::new(
        ElasticsearchBackend::new(&config.elasticsearch)
            .context("Failed to create Elasticsearch backend")?,
    );
    let indices = IndexNameResolver::new(&config.indices, Arc::new(SystemClock))
        .context("Invalid index configuration")?;

    let webhooks = SlackWebhookClient::new(SLACK_TIMEOUT)
        .context("Failed to create Slack webhook client")?;
    let mut router = NotificationRouter::new(policy.channel_map())
        .with_adapter(Arc::new(SlackChannel::new(webhooks)));

    match config.sns {
        Some(sns) => {
            let client = SnsClient::new(sns.client, sns.credentials)
                .context("Failed to create SNS client")?;
            router = router.with_adapter(Arc::new(SnsChannel::new(Arc::new(client))));
        }
        None => warn!("AWS credentials not set, SNS subscriptions will be skipped"),
    }

    Ok(SystemEventSender::new(
        DocumentStoreClient::new(backend, indices),
        TimestampProvider::system(config.timestamp_format),
        Arc::new(policy),
    )
    .with_notifier(router))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Command::VerifySignature {
        timestamp,
        signature,
        secret,
    } = &cli.command
    {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .context("Failed to read request body from stdin")?;
        SlackRequestVerifier::new(secret.as_str())
            .verify(Some(timestamp.as_str()), Some(signature.as_str()), &body)
            .context("Slack signature rejected")?;
        println!("valid");
        return Ok(());
    }

    let policy = load_policy(cli.policy.clone())?;

    match &cli.command {
        Command::Categories => return print_json(&policy.categories()),
        Command::Subscriptions => return print_json(&policy.redacted_subscriptions()),
        _ => {}
    }

    describe_client_metrics();
    let sender = if cli.dry_run {
        info!("Dry run: using in-memory store, notifications disabled");
        dry_run_sender(policy)?
    } else {
        let config = AppConfig::from_env().context("Invalid configuration")?;
        info!("Store nodes: {}", config.elasticsearch.urls.join(", "));
        live_sender(config, policy)?
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Create(args) => {
            let id = sender.create(args.into_request(), &cancel).await?;
            println!("{}", id);
        }
        Command::Start(args) => {
            let id = sender.start(args.into_request(), &cancel).await?;
            println!("{}", id);
        }
        Command::End { id } => {
            sender.end(&id, &cancel).await?;
            info!("Event {} ended", id);
        }
        Command::Get { id } => match sender.get(&id, &cancel).await? {
            Some(document) => print_json(&document)?,
            None => bail!("System event {} not found", id),
        },
        Command::Categories | Command::Subscriptions | Command::VerifySignature { .. } => {}
    }

    Ok(())
}
