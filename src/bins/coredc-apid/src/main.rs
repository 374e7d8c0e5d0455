//! Core Deployment Controller API Daemon
//!
//! Serves the `/core` HTTP surface: subscriber management over the shared
//! `subscribers` collection and read-only forwarding to the MME and SMF
//! metrics endpoints.

use anyhow::{Context, Result};
use clap::Parser;
use coredc_apid::{handle_request, CoreContext, UpstreamConfig, DEFAULT_MME_URL, DEFAULT_SMF_URL};
use coredc_dbi::{MemorySubscriberStore, MongoSubscriberStore, MongocConfig, SubscriberStore};
use coredc_sbi::{SbiRequest, SbiServer, SbiServerConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Core Deployment Controller - subscriber and core status API
#[derive(Parser, Debug)]
#[command(name = "coredc-apid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Core deployment controller API", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Disable color output
    #[arg(short = 'm', long)]
    no_color: bool,

    /// HTTP server address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0")]
    api_addr: String,

    /// HTTP server port
    #[arg(long, env = "API_PORT", default_value = "8000")]
    api_port: u16,

    /// MongoDB host
    #[arg(long, env = "MONGO_HOST", default_value = "mongo")]
    mongo_host: String,

    /// MongoDB port
    #[arg(long, env = "MONGO_PORT", default_value = "27017")]
    mongo_port: u16,

    /// MongoDB database
    #[arg(long, env = "MONGO_DB", default_value = "open5gs")]
    mongo_db: String,

    /// MongoDB user
    #[arg(long, env = "MONGO_USER")]
    mongo_user: Option<String>,

    /// MongoDB password
    #[arg(long, env = "MONGO_PASSWORD", hide_env_values = true)]
    mongo_password: Option<String>,

    /// MME metrics endpoint
    #[arg(long, env = "MME_URL", default_value = DEFAULT_MME_URL)]
    mme_url: String,

    /// SMF metrics endpoint
    #[arg(long, env = "SMF_URL", default_value = DEFAULT_SMF_URL)]
    smf_url: String,

    /// Deadline for one forwarded call, in milliseconds
    #[arg(long, default_value = "5000")]
    upstream_timeout_ms: u64,

    /// Keep subscribers in memory instead of MongoDB
    #[arg(long)]
    memory_store: bool,
}

impl Args {
    fn mongoc_config(&self) -> MongocConfig {
        let config = MongocConfig::new(&self.mongo_host, self.mongo_port, &self.mongo_db);
        match (&self.mongo_user, &self.mongo_password) {
            (Some(user), Some(password)) => config.with_credentials(user, password),
            _ => config,
        }
    }

    fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            mme_url: self.mme_url.clone(),
            smf_url: self.smf_url.clone(),
            timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    log::info!("Core Deployment Controller v{} starting...", env!("CARGO_PKG_VERSION"));

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let mongo = if args.memory_store {
        None
    } else {
        let mongo = MongoSubscriberStore::connect(&args.mongoc_config())
            .await
            .context("Invalid MongoDB configuration")?;
        match mongo.ping().await {
            Ok(()) => log::info!("MongoDB connected: {}", mongo.masked_db_uri()),
            Err(e) => log::warn!("MongoDB not reachable yet ({}): {e}", mongo.masked_db_uri()),
        }
        Some(Arc::new(mongo))
    };

    let store: Arc<dyn SubscriberStore> = match &mongo {
        Some(mongo) => mongo.clone(),
        None => {
            log::warn!("Using in-memory subscriber store, data is lost on exit");
            Arc::new(MemorySubscriberStore::new())
        }
    };

    if !store.ensure_indexes().await {
        log::warn!("Unique IMSI index not ready, will retry on first access");
    }

    let ctx = Arc::new(
        CoreContext::new(store, &args.upstream_config()).context("Invalid upstream URL")?,
    );
    log::info!(
        "Forwarding to MME {} and SMF {}",
        ctx.mme.base_uri(),
        ctx.smf.base_uri()
    );

    let server_config = SbiServerConfig::with_host_port(&args.api_addr, args.api_port)
        .context("Invalid API address")?;
    let server = SbiServer::new(server_config);

    let handler_ctx = ctx.clone();
    let addr = server
        .start(move |request: SbiRequest| {
            let ctx = handler_ctx.clone();
            async move { handle_request(&ctx, request).await }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {e}"))?;

    log::info!("Core Deployment Controller ready on http://{addr}/core");

    run_event_loop_async(shutdown).await?;

    log::info!("Shutting down...");

    server
        .stop()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to stop HTTP server: {e}"))?;
    log::info!("HTTP server stopped");

    if let Some(mongo) = mongo {
        mongo.close().await;
    }

    log::info!("Core Deployment Controller stopped");
    Ok(())
}

/// Initialize logging based on command line arguments
fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" | "warning" => log::LevelFilter::Warn,
        "error" | "critical" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    builder.filter_level(level);
    builder.format_timestamp_millis();

    if args.no_color {
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    Ok(())
}

/// Async main event loop
async fn run_event_loop_async(shutdown: Arc<AtomicBool>) -> Result<()> {
    log::debug!("Entering async main event loop");

    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    log::debug!("Exiting main event loop");
    Ok(())
}
