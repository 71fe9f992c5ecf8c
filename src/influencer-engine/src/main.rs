//! Influencer Engine: influencer discovery, scoring and campaign performance.
//!
//! Wires the store, text generator and services together, then either runs
//! the background scheduler or a single command against seeded data.

mod seed;

use clap::{Parser, Subcommand};
use influencer_core::config::AppConfig;
use influencer_core::event_bus::channel_sink;
use influencer_core::store::DocumentStore;
use influencer_core::types::CampaignStatus;
use influencer_core::{ChatCompletionsGenerator, EngineError, MemoryStore, TextGenerator};
use influencer_discovery::{CandidateShortlister, EngagementAnalyzer, InfluencerMatcher};
use influencer_lifecycle::{CampaignManager, NotificationDispatcher};
use influencer_reporting::ReportGenerator;
use influencer_scheduler::{BatchRunner, JobScheduler, RefreshInfluencerMetricsJob, TrackActiveCampaignsJob};
use metrics_exporter_prometheus::PrometheusBuilder;
use seed::SeedData;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "influencer-engine")]
#[command(about = "Influencer discovery, scoring and campaign performance engine")]
#[command(version)]
struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(long, short)]
    config: Option<String>,

    /// Node identifier (overrides config)
    #[arg(long, env = "INFLUENCER_ENGINE__NODE_ID")]
    node_id: Option<String>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "INFLUENCER_ENGINE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// JSON fixture loaded into the store before running
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduled jobs until interrupted (default)
    Serve,
    /// Run one job immediately and print its summary
    RunJob { name: String },
    /// Shortlist influencers for a campaign
    Shortlist {
        campaign_id: Uuid,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Analyze an influencer's content and brand fit
    Analyze { influencer_id: Uuid },
    /// Generate a performance report for a campaign
    Report { campaign_id: Uuid },
    /// Move a campaign to a new status
    Transition {
        campaign_id: Uuid,
        #[arg(value_parser = parse_status)]
        status: CampaignStatus,
    },
}

fn parse_status(raw: &str) -> Result<CampaignStatus, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "influencer_engine=info,influencer_core=info,influencer_discovery=info,\
                     influencer_reporting=info,influencer_lifecycle=info,influencer_scheduler=info"
                        .into()
                }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Influencer Engine starting up");

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        model = %config.text_generation.model,
        scheduler_enabled = config.scheduler.enabled,
        batch_limit = config.scheduler.batch_limit,
        "Configuration loaded"
    );

    let metrics_addr: SocketAddr = format!("{}:{}", config.metrics.host, config.metrics.port).parse()?;
    if let Err(e) = PrometheusBuilder::new().with_http_listener(metrics_addr).install() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    if let Some(path) = &cli.seed {
        SeedData::read(path)?.load_into(store.as_ref()).await?;
        info!(path = %path.display(), "Seed data loaded");
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(ChatCompletionsGenerator::new(&config.text_generation)?);

    let (events, receiver) = channel_sink(config.notifications.channel_capacity);
    let dispatcher = tokio::spawn(NotificationDispatcher::new(store.clone()).run(receiver));

    let reporter = Arc::new(ReportGenerator::new(
        store.clone(),
        generator.clone(),
        events.clone(),
        &config.text_generation,
    ));

    let runner = BatchRunner::new(config.scheduler.batch_limit, config.scheduler.batch_concurrency);
    let mut scheduler = JobScheduler::new();
    scheduler.register(RefreshInfluencerMetricsJob::new(
        store.clone(),
        config.discovery.recent_sample_limit,
        runner,
        Duration::from_secs(config.scheduler.metrics_refresh_interval_secs),
    ));
    scheduler.register(TrackActiveCampaignsJob::new(
        store.clone(),
        runner,
        Duration::from_secs(config.scheduler.performance_tracking_interval_secs),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if config.scheduler.enabled {
                scheduler.start();
            } else {
                info!("Scheduler disabled by config");
            }
            info!(jobs = ?scheduler.job_names(), "Influencer Engine is running");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received");
            scheduler.shutdown();
            scheduler.wait_for_shutdown(Duration::from_secs(30)).await;
        }
        Command::RunJob { name } => {
            let summary = scheduler.run_once(&name).await?;
            print_json(&summary)?;
        }
        Command::Shortlist { campaign_id, count } => {
            let campaign = store
                .get_campaign(campaign_id)
                .await?
                .ok_or_else(|| EngineError::not_found("campaign", campaign_id))?;
            let matcher = Arc::new(InfluencerMatcher::new(store.clone(), config.discovery.max_search_results));
            let shortlister = CandidateShortlister::new(matcher, store.clone(), config.discovery.recent_sample_limit);
            let count = count.unwrap_or(config.discovery.default_recommendation_count);
            print_json(&shortlister.shortlist_influencers(&campaign, count).await?)?;
        }
        Command::Analyze { influencer_id } => {
            let analyzer = EngagementAnalyzer::new(
                store.clone(),
                generator.clone(),
                &config.text_generation,
                config.discovery.recent_sample_limit,
            );
            print_json(&analyzer.analyze_influencer(influencer_id).await?)?;
        }
        Command::Report { campaign_id } => {
            print_json(&reporter.generate_campaign_report(campaign_id).await?)?;
        }
        Command::Transition { campaign_id, status } => {
            let manager = CampaignManager::new(store.clone(), events.clone(), reporter.clone());
            print_json(&manager.transition_campaign_status(campaign_id, status).await?)?;
        }
    }

    // Dropping the last senders lets the dispatcher flush and exit.
    drop(reporter);
    drop(events);
    if let Err(e) = dispatcher.await {
        error!(error = %e, "Notification dispatcher task failed");
    }

    info!("Influencer Engine stopped");
    Ok(())
}
