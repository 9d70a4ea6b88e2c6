//! DMIQ Core Service entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dmiq_core_svc::api::create_router;
use dmiq_core_svc::config::{Config, CorsPolicy};
use dmiq_core_svc::metrics;
use dmiq_core_svc::server::Server;

/// DMIQ Core Service.
#[derive(Parser, Debug)]
#[command(name = "dmiqcoresvc")]
#[command(about = "Health, status and sample data REST API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Bind host (overrides FLASK_HOST).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Bind port (overrides FLASK_PORT and PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Run in debug mode (overrides FLASK_DEBUG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Print the resolved configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration, CLI flags win over the environment
    let mut config = Config::load().context("failed to load configuration")?;
    apply_overrides(&mut config, &args);

    // Initialize logging
    init_tracing(&config, args.verbose);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => cmd_serve(config).await,
        Command::CheckConfig => {
            cmd_check_config(&config);
            Ok(())
        }
    }
}

/// Merge CLI flags into the loaded configuration.
///
/// `--port` beats both `FLASK_PORT` and `PORT`; `--debug` can only turn debug
/// mode on.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(host) = &args.host {
        config.flask_host = host.clone();
    }
    if let Some(port) = args.port {
        config.flask_port = Some(port);
    }
    config.flask_debug |= args.debug;
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose || config.flask_debug {
        EnvFilter::new("dmiq_core_svc=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Run the HTTP server until shutdown.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    let server_config = config.resolve();

    if let Some(port) = config.metrics_port {
        metrics::install_prometheus(&server_config.host, port).await?;
    }
    metrics::init_metrics();

    info!(
        "Starting DMIQ Core Service on {} (debug: {})",
        server_config.address(),
        server_config.debug
    );

    // The route table is built once and handed to the server.
    let server = Server::new(server_config, create_router());
    server.run().await.map_err(|e| {
        error!("Server error: {}", e);
        e
    })?;

    info!("Shutdown complete");
    Ok(())
}

/// Print the resolved configuration.
fn cmd_check_config(config: &Config) {
    let resolved = config.resolve();

    println!("======================================================================");
    println!("DMIQ CORE SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("Address:      {}", resolved.address());
    println!("Debug:        {}", resolved.debug);
    match &resolved.cors {
        CorsPolicy::Any => println!("CORS origins: *"),
        CorsPolicy::Origins(origins) => println!("CORS origins: {}", origins.join(", ")),
    }
    match config.metrics_port {
        Some(port) => println!("Metrics:      {}:{}", resolved.host, port),
        None => println!("Metrics:      disabled"),
    }
    println!("Log filter:   {}", config.rust_log);
    println!("Log format:   {}", if config.log_json { "json" } else { "text" });
    println!("======================================================================");
    println!("Configuration OK");
}
