//! Binary entrypoint for the meshobserver CLI.
//!
//! Commands:
//! - `serve` - run the observer: state aggregation plus HTTP control surface
//! - `bridge [--port <path>]` - run the serial bridge against a running observer
//! - `init` - create a starter `config.toml`
//! - `status` - query a running observer and print a field summary
//!
//! See the library crate docs for module-level details: `meshobserver::`.
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use meshobserver::bridge::client::ObserverClient;
use meshobserver::bridge::SerialBridge;
use meshobserver::config::Config;
use meshobserver::observer::{http, Observer};

#[derive(Parser)]
#[command(name = "meshobserver")]
#[command(about = "Telemetry bridge and observer for LoRa mesh node fields")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the observer process
    Serve {
        /// Listen address override (e.g. 0.0.0.0:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run the serial bridge process
    Bridge {
        /// Serial device override (e.g. /dev/ttyUSB0)
        #[arg(short, long)]
        port: Option<String>,
    },
    /// Initialize a new configuration file
    Init,
    /// Show a summary of a running observer
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Serve { bind } => {
            info!("starting meshobserver v{}", env!("CARGO_PKG_VERSION"));
            let observer = Observer::new(&config.mesh);
            let bind_addr = bind.unwrap_or_else(|| config.observer.bind_addr.clone());
            http::serve(observer, &bind_addr).await?;
        }
        Commands::Bridge { port } => {
            info!("starting meshobserver bridge v{}", env!("CARGO_PKG_VERSION"));
            let mut serial = config.serial.clone();
            if let Some(cli_port) = port {
                serial.port = cli_port;
            }
            let client = ObserverClient::new(
                &config.observer.base_url,
                Duration::from_secs(serial.request_timeout_secs),
            )?;
            let mut bridge = SerialBridge::new(serial, client);
            bridge.run().await?;
        }
        Commands::Status => {
            let client = ObserverClient::new(&config.observer.base_url, Duration::from_secs(5))?;
            let summary = client.summary().await.with_context(|| {
                format!("no observer reachable at {}", config.observer.base_url)
            })?;
            println!("nodes seen:    {}", summary.nodes);
            println!("messages:      {}", summary.messages);
            println!("active SOS:    {}", summary.active_sos);
        }
        Commands::Init => unreachable!("handled above"),
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();

    // CLI verbosity overrides the configured level.
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        })
        .map(std::sync::Mutex::new);

    builder.format(move |fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!("{} [{}] {}", ts, record.level(), record.args());
        if let Some(ref sink) = log_file {
            if let Ok(mut guard) = sink.lock() {
                let _ = writeln!(guard, "{}", line);
            }
        }
        writeln!(fmt, "{}", line)
    });

    let _ = builder.try_init();
}
