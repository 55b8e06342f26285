//! rate-scout: background scraping service and dashboard-side submit tool.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hotelier_rate_scout::adapters::AdapterRegistry;
use hotelier_rate_scout::bridge::{
    BackgroundService, ContentScriptRelay, DashboardClient, HttpPageChannel, OriginPolicy, server,
};
use hotelier_rate_scout::freshness::{FreshnessFilter, JsonFreshnessStore};
use hotelier_rate_scout::jobs::{Competitor, CompetitorId, expand_competitor};
use hotelier_rate_scout::queue::{FileTokenStore, QueueManager, TracingProgress};
use hotelier_rate_scout::reporter::HttpReporter;
use hotelier_rate_scout::{ChromiumTabProvider, JobExecutor, ScoutConfig};

/// Competitor rate scraping orchestrator
#[derive(Parser)]
#[command(name = "rate-scout")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the background service and the bridge endpoint (default)
    Serve(ServeArgs),
    /// Expand a competitor into day jobs and submit them to a running bridge
    Submit(SubmitArgs),
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Address for the bridge endpoint
    #[arg(long)]
    bind: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long)]
    competitor_id: String,

    #[arg(long, default_value = "")]
    name: String,

    #[arg(long)]
    url: String,

    /// First check-in date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Days to expand into; configured default when omitted
    #[arg(long)]
    days: Option<u32>,

    /// Backend auth token forwarded with the batch
    #[arg(long, env = "RATE_SCOUT_TOKEN")]
    token: Option<String>,

    /// Bridge root URL
    #[arg(long, default_value = "http://127.0.0.1:8765")]
    bridge: String,

    /// Origin presented to the bridge
    #[arg(long, default_value = "http://localhost:5173")]
    origin: String,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hotelier_rate_scout=info,rate_scout=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = ScoutConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args).await,
        Command::Submit(args) => submit(config, args).await,
    }
}

async fn serve(config: ScoutConfig, args: ServeArgs) -> Result<()> {
    let mut builder = config.into_builder();
    if let Some(bind) = args.bind {
        builder = builder.bridge_bind(bind);
    }
    if args.headed {
        builder = builder.headless(false);
    }
    let config = builder.build()?;

    let provider = Arc::new(ChromiumTabProvider::launch(config.headless()).await?);
    let registry = Arc::new(AdapterRegistry::builtin(config.adapter())?);
    let executor = JobExecutor::new(provider.clone(), registry, config.job_timeout())
        .with_default_currency(config.default_currency());

    let freshness_store = Arc::new(
        JsonFreshnessStore::open(config.freshness_path())
            .await
            .context("Failed to open freshness index")?
            .with_retention(config.freshness_max_age()),
    );
    let reporter = HttpReporter::new(config.ingest_endpoint())?
        .envelope(config.envelope_field().into())
        .record_freshness(freshness_store.clone());

    let queue = QueueManager::builder(executor, Arc::new(reporter))
        .delay(config.delay_policy())
        .token_store(Arc::new(FileTokenStore::new(config.token_path())))
        .progress(Arc::new(TracingProgress))
        .build();
    match queue.restore_token().await {
        Ok(true) => info!("Restored auth token from {}", config.token_path().display()),
        Ok(false) => info!("No persisted auth token"),
        Err(e) => warn!("Could not restore auth token: {e}"),
    }

    let service = BackgroundService::new(queue)
        .with_freshness(FreshnessFilter::new(freshness_store, config.freshness_max_age()));
    let (background, service_task) = service.spawn(32);

    let relay = Arc::new(ContentScriptRelay::new(
        OriginPolicy::new(config.allowed_origins()),
        background,
    ));
    let listener = tokio::net::TcpListener::bind(config.bridge_bind())
        .await
        .with_context(|| format!("Failed to bind {}", config.bridge_bind()))?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
        }
        info!("Shutdown requested");
    };
    server::serve(listener, relay, shutdown).await?;

    service_task.abort();
    provider.shutdown().await?;
    Ok(())
}

async fn submit(config: ScoutConfig, args: SubmitArgs) -> Result<()> {
    let competitor = Competitor {
        id: CompetitorId::new(args.competitor_id),
        name: args.name,
        url: args.url,
    };
    let start = args.start.unwrap_or_else(|| Utc::now().date_naive());
    let days = args.days.unwrap_or(config.expansion_days());
    let jobs = expand_competitor(&competitor, start, days);

    let channel = HttpPageChannel::new(reqwest::Client::new(), &args.bridge, args.origin);
    let client = DashboardClient::new(channel, config.ping_grace());
    let queued = client.submit(jobs, args.token).await?;

    info!("Bridge queued {queued} of {days} jobs for {}", competitor.id);
    Ok(())
}
