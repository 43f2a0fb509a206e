use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use suzaku::cache::CacheStore;
use suzaku::config::Config;
use suzaku::proxy::CacheProxy;
use suzaku::transport::HttpTransport;

/// Suzaku - shared RFC 9111 HTTP cache in front of a single origin
#[derive(Parser, Debug)]
#[command(name = "suzaku")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the origin URL from the configuration
    #[arg(short, long)]
    origin: Option<String>,

    /// Override the listen address from the configuration, e.g. 0.0.0.0:3128
    #[arg(short, long)]
    listen: Option<std::net::SocketAddr>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration from file, applying CLI overrides
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(origin) = args.origin {
        config.origin.url = origin;
    }
    config.validate()?;

    if args.test {
        println!("configuration OK");
        return Ok(());
    }

    // Initialize logging subsystem
    suzaku::logging::init_subscriber(&config.logging)?;

    let addr = match args.listen {
        Some(addr) => addr,
        None => config.server.socket_addr()?,
    };
    let origin = config.origin_uri()?;

    tracing::info!(
        config_file = %args.config.display(),
        listen = %addr,
        origin = %origin,
        "Configuration loaded successfully"
    );

    // Wire the cache engine: one shared store behind the proxy handler
    let store = Arc::new(CacheStore::new());
    let transport = Arc::new(HttpTransport::new());
    let proxy = Arc::new(CacheProxy::new(origin, transport, store));

    suzaku::server::run(addr, proxy).await?;
    Ok(())
}
