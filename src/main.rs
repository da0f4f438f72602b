use anyhow::{Context, Result};
use clap::Parser;
use federation_probe::api;
use federation_probe::config;
use federation_probe::feed::HttpFeedPoller;
use federation_probe::matrix::{EchoResponder, MatrixSession};
use federation_probe::metrics::{MetricsConfig, MetricsExporter, MetricsStore};
use federation_probe::peer::{PeerRegistry, ProbeSession};
use federation_probe::probe::{ProbeEngine, RoundScheduler};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Federation probe exporter
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "FEDERATION_PROBE_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let listen_addr = match args.address {
        Some(addr) => addr,
        None => config.listen_addr()?,
    };

    let own = Arc::new(
        MatrixSession::connect(&config.own_homeserver)
            .await
            .with_context(|| format!("connecting to {}", config.own_homeserver.homeserver))?,
    );
    let room_id = own
        .join_room(&config.ping_room)
        .await
        .context("joining ping room")?;

    let mut sessions = vec![own.clone()];
    for remote in &config.remote_homeservers {
        let session = Arc::new(
            MatrixSession::connect(remote)
                .await
                .with_context(|| format!("connecting to {}", remote.homeserver))?,
        );
        session
            .join_room(&config.ping_room)
            .await
            .with_context(|| format!("joining ping room as {}", session.user_id()))?;
        sessions.push(session);
    }

    for session in &sessions {
        let responder = EchoResponder::new(room_id.clone(), session.user_id());
        tokio::spawn(session.clone().run_echo(responder));
    }

    let remotes = sessions[1..]
        .iter()
        .map(|s| s.clone() as Arc<dyn ProbeSession>)
        .collect();
    let registry = Arc::new(PeerRegistry::new(own, remotes));

    let store = Arc::new(MetricsStore::new());
    let poller = Arc::new(HttpFeedPoller::new(config.ping_json_url.clone())?);
    let engine = ProbeEngine::new(
        config.engine_config(room_id),
        registry.clone(),
        poller,
        store.clone(),
    )?;

    info!(
        peers = registry.peer_count(),
        rule = ?engine.config().match_rule,
        "Starting probe rounds every {}s",
        engine.config().round_interval().as_secs()
    );
    let scheduler = RoundScheduler::new(Arc::new(engine)).spawn();
    let server = api::serve(MetricsExporter::new(store), MetricsConfig::with_addr(listen_addr));

    tokio::select! {
        result = server => result?,
        stopped = scheduler => anyhow::bail!("probe scheduler stopped: {:?}", stopped),
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "federation_probe=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
