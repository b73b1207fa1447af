//! Binary entrypoint for the meshuplink CLI.
//!
//! Commands:
//! - `start [--nodes <n>] [--duration <s>]` - run simulated nodes on a loopback mesh
//! - `init` - write a starter `config.toml`
//! - `decode <payload>` - decode one peer message and print the result as JSON
//!
//! See the library crate docs for module-level details: `meshuplink::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use meshuplink::config::Config;
use meshuplink::meshtastic::identity::{MacAddress, MacIdentity};
use meshuplink::meshtastic::loopback::LoopbackMesh;
use meshuplink::metrics;
use meshuplink::sensor::simulated_from_config;
use meshuplink::uplink::clock::{Clock, MonotonicClock};
use meshuplink::uplink::decoder::PeerDecoder;
use meshuplink::uplink::host::run_node;
use meshuplink::uplink::scheduler::Peripherals;
use meshuplink::uplink::UplinkModule;

/// Queue depth of the loopback bus, per receiver.
const MESH_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "meshuplink")]
#[command(about = "Periodic sensor telemetry for Meshtastic mesh networks")]
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
    /// Run simulated sensor nodes on an in-process mesh
    Start {
        /// Number of nodes to simulate
        #[arg(short, long, default_value_t = 3)]
        nodes: usize,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Write a default configuration file
    Init,
    /// Decode one peer payload (`\n` escapes accepted) and print it as JSON
    Decode {
        payload: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { nodes, duration } => {
            let config = load_or_default(&cli.config).await;
            init_logging(&Some(config.clone()), cli.verbose);
            config.validate()?;
            info!("Starting meshuplink v{}", env!("CARGO_PKG_VERSION"));
            run_simulation(config, nodes.max(1), duration).await?;
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Decode { payload } => {
            init_logging(&None, cli.verbose);
            let bytes = unescape(&payload).into_bytes();
            match PeerDecoder::default().decode(&bytes) {
                Ok(reading) => println!("{}", serde_json::to_string_pretty(&reading)?),
                Err(e) => {
                    println!("rejected: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn load_or_default(path: &str) -> Config {
    match Config::load(path).await {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging is not up yet.
            eprintln!("{} (using defaults)", e);
            Config::default()
        }
    }
}

async fn run_simulation(config: Config, nodes: usize, duration: Option<u64>) -> Result<()> {
    let mesh = LoopbackMesh::new(MESH_CAPACITY, config.uplink.max_payload);
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let refresh = Duration::from_millis(config.display.refresh_ms);
    let (stop_tx, stop_rx) = watch::channel(false);
    let fixed_mac = config.device.mac_address()?;

    let mut handles = Vec::with_capacity(nodes);
    for i in 0..nodes {
        let mac = match (i, fixed_mac) {
            (0, Some(mac)) => mac,
            _ => MacAddress::random(),
        };
        let (transport, inbound) = mesh.attach(mac.node_num());
        let module = UplinkModule::new(
            &config,
            Peripherals {
                sensor: simulated_from_config(&config.sensor, u64::from(mac.node_num())),
                identity: Box::new(MacIdentity::new(mac)),
                transport: Box::new(transport),
            },
            Arc::clone(&clock),
        );
        info!("Node {} attached as {:08X} ({})", i, mac.node_num(), mac);
        handles.push(tokio::spawn(run_node(
            module,
            inbound,
            refresh,
            stop_rx.clone(),
        )));
    }

    match duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => info!("Run time elapsed"),
                _ = tokio::signal::ctrl_c() => info!("Received shutdown signal"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
        }
    }
    let _ = stop_tx.send(true);

    for handle in handles {
        match handle.await {
            Ok(exit) => info!("Node stopped: {:?}", exit),
            Err(e) => warn!("Node task failed: {}", e),
        }
    }
    let m = metrics::snapshot();
    info!(
        "cycles={} sent={} send_failed={} overflow={} encode_failed={} retries={} rx_ok={} rx_dropped={} rx_oversized={} rx_ignored={}",
        m.cycles,
        m.broadcast_sent,
        m.broadcast_failed,
        m.encode_overflow,
        m.encode_failed,
        m.sensor_retries,
        m.inbound_accepted,
        m.inbound_dropped,
        m.inbound_oversized,
        m.inbound_ignored
    );
    Ok(())
}

/// Shell-friendly escapes: `\n`, `\t` and `\\`.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
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
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
