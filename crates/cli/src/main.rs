use std::path::PathBuf;
use std::sync::Arc;

use bustrack_core::transit::identifiers::{BusNumber, StopIdentifier};
use bustrack_core::{Command, HttpTelemetryClient, TrackerConfig, TrackingSession};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod report;
mod surface;

use surface::LogSurfaceProvider;

#[derive(Parser, Debug)]
#[command(
    name = "bustrack",
    version,
    about = "Follow a bus route live from the terminal",
    long_about = "Polls the tracking backend for vehicle positions, arrival estimates, \
                  stops and the route shape, works out where every bus is along the route \
                  and reports it after each poll."
)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Show debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow the route until interrupted (default)
    Watch {
        /// Route to follow
        #[arg(long)]
        route: Option<String>,

        /// Stop you are waiting at
        #[arg(short, long)]
        stop: Option<String>,

        /// Seconds between polls
        #[arg(long)]
        interval: Option<u64>,

        /// Select this bus as soon as it shows up
        #[arg(short, long)]
        bus: Option<String>,

        /// Stop after this many successful polls
        #[arg(long)]
        polls: Option<u64>,
    },

    /// Find the stop nearest to a coordinate
    Nearest {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// List upcoming arrivals at a stop
    StopEta { stop_id: String },
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "bustrack=debug" } else { "bustrack=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn load_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path).wrap_err("Failed to load configuration")?,
        None => TrackerConfig::default(),
    };
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let mut config = load_config(&args)?;
    let command = args.command.unwrap_or(Commands::Watch {
        route: None,
        stop: None,
        interval: None,
        bus: None,
        polls: None,
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start runtime")?;

    match command {
        Commands::Watch {
            route,
            stop,
            interval,
            bus,
            polls,
        } => {
            if let Some(route) = route {
                config.route_id = route;
            }
            if let Some(stop) = stop {
                config.target_stop_id = Some(stop);
            }
            if let Some(secs) = interval {
                config.poll_interval_secs = secs;
            }
            config.validate()?;
            runtime.block_on(watch(config, bus.map(BusNumber::new), polls))
        }
        Commands::Nearest { lat, lon } => runtime.block_on(nearest(&config, lat, lon)),
        Commands::StopEta { stop_id } => runtime.block_on(stop_eta(&config, &stop_id)),
    }
}

async fn watch(config: TrackerConfig, follow: Option<BusNumber>, polls: Option<u64>) -> Result<()> {
    let client = HttpTelemetryClient::from_config(&config)?;
    let session = TrackingSession::new(&config, Arc::new(client));

    let cancel = session.cancel_token();
    let commands = session.commands();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            interrupt.cancel();
        }
    });

    let mut last_batch = None;
    let mut applied = 0u64;
    let mut pending = follow;
    session
        .run(&LogSurfaceProvider, |session| {
            if let Some(bus_no) = pending.take_if(|bus| session.vehicle(bus).is_some()) {
                let _ = commands.send(Command::Select(bus_no));
            }

            print!("{}", report::session(session));

            if session.last_batch() != last_batch {
                last_batch = session.last_batch();
                applied += 1;
                if polls.is_some_and(|limit| applied >= limit) {
                    cancel.cancel();
                }
            }
        })
        .await;

    Ok(())
}

async fn nearest(config: &TrackerConfig, lat: f64, lon: f64) -> Result<()> {
    let client = HttpTelemetryClient::from_config(config)?;
    match client.nearest_stop(lat, lon).await? {
        Some(stop) => print!("{}", report::nearest(&stop)),
        None => println!("No stop found near {lat:.5}, {lon:.5}"),
    }
    Ok(())
}

async fn stop_eta(config: &TrackerConfig, stop_id: &str) -> Result<()> {
    let client = HttpTelemetryClient::from_config(config)?;
    let arrivals = client.stop_eta(&StopIdentifier::new(stop_id)).await?;
    print!("{}", report::arrivals(stop_id, &arrivals));
    Ok(())
}
