//! dns-relay - A transparent DNS relay
//!
//! Listens for DNS queries over UDP, strips a synthetic suffix (".proxy" by
//! default) from the question name and forwards the query to an upstream
//! resolver. The upstream's answer is relayed back unchanged.

use clap::Parser;
use dns_relay::config::{load_config, LogFormat, DEFAULT_CONFIG_YAML};
use dns_relay::dns::run_relay_server;
use dns_relay::logging;
use tracing::error;

#[derive(Parser)]
#[command(name = "dns-relay")]
#[command(version)]
#[command(about = "Transparent DNS relay that strips a synthetic suffix from query names")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Address to listen on (e.g. 127.0.0.1:53 or [::1]:53)
    #[arg(short = 'l', long, value_name = "ADDR")]
    listen: Option<String>,

    /// Upstream resolver (e.g. 8.8.8.8:53)
    #[arg(short = 'u', long, value_name = "ADDR")]
    upstream: Option<String>,

    /// Suffix to strip from question names (e.g. .proxy)
    #[arg(short = 's', long)]
    suffix: Option<String>,

    /// Upstream deadline in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Maximum concurrent requests (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_in_flight: Option<usize>,

    /// Stdout log format
    #[arg(long, value_enum, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", DEFAULT_CONFIG_YAML);
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;

    // CLI arguments override config file
    if let Some(listen) = cli.listen {
        config.relay.listen = listen;
    }
    if let Some(upstream) = cli.upstream {
        config.relay.upstream = upstream;
    }
    if let Some(suffix) = cli.suffix {
        config.relay.suffix = suffix;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.relay.upstream_timeout_ms = timeout_ms;
    }
    if let Some(max_in_flight) = cli.max_in_flight {
        config.relay.max_in_flight = max_in_flight;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    let _log_guard = logging::init_logging(&config.logging);
    tracing::debug!(config = ?config, "Configuration loaded");

    let settings = config.relay.settings()?;
    println!(
        "DNS relay listening on {} (upstream {}, stripping {:?})",
        settings.listen, settings.upstream, settings.suffix
    );

    if let Err(e) = run_relay_server(settings, config.logging.clone()).await {
        error!(stage = %e.stage(), error = %e, "DNS relay stopped");
        return Err(e.into());
    }
    Ok(())
}
