//! GeeCache Daemon - serves a cache group to clients and peers over RESP

mod client;
mod frame;
mod handler;
mod server;
mod source;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use geecache::{PeerGetter, Registry, RingPeerPicker};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::client::RespPeer;
use crate::handler::CommandHandler;
use crate::source::SeedSource;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address
    #[arg(short, long, env = "GEECACHE_BIND", default_value = "127.0.0.1:8001")]
    bind: String,

    /// This node's address as listed in --peers (defaults to --bind)
    #[arg(long, env = "GEECACHE_SELF_ADDR")]
    self_addr: Option<String>,

    /// Every node in the cluster, this one included
    #[arg(short, long, env = "GEECACHE_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Cache group served by this node
    #[arg(short, long, env = "GEECACHE_GROUP", default_value = "scores")]
    group: String,

    /// Local cache budget in bytes (keys plus values, 0 = unbounded)
    #[arg(short, long, env = "GEECACHE_CACHE_BYTES", default_value_t = 2 << 10)]
    cache_bytes: usize,

    /// Virtual nodes per peer on the hash ring
    #[arg(short, long, default_value_t = 50)]
    replicas: usize,

    /// JSON object of key/value pairs backing the group (demo table if absent)
    #[arg(short, long, env = "GEECACHE_SEED")]
    seed: Option<String>,

    /// Timeout for peer connections, reads and writes
    #[arg(long, default_value_t = 2000)]
    peer_timeout_ms: u64,

    /// Health check mode (for Docker)
    #[arg(long)]
    health: bool,
}

impl Args {
    /// Identity of this node on the hash ring
    fn self_id(&self) -> &str {
        self.self_addr.as_deref().unwrap_or(&self.bind)
    }

    /// Whether the peer list names this node
    fn peers_include_self(&self) -> bool {
        self.peers.iter().any(|peer| peer == self.self_id())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let peer_timeout = Duration::from_millis(args.peer_timeout_ms);

    if args.health {
        let peer = RespPeer::new(args.bind.clone(), peer_timeout);
        let healthy = tokio::task::spawn_blocking(move || peer.ping()).await?;
        match healthy {
            Ok(()) => {
                println!("OK");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("FAILED: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Starting GeeCache Daemon v{}", env!("CARGO_PKG_VERSION"));

    let source = match &args.seed {
        Some(path) => SeedSource::load(path)?,
        None => SeedSource::demo(),
    };
    info!("Backing source holds {} keys", source.len());

    let registry = Arc::new(Registry::new());
    let group = registry.new_group(args.group.as_str(), args.cache_bytes, source);

    if !args.peers.is_empty() {
        if !args.peers_include_self() {
            warn!(
                "Self address {} is not in --peers; keys it should own will be forwarded",
                args.self_id()
            );
        }
        let picker = RingPeerPicker::new(args.self_id(), args.replicas);
        picker.set_peers(args.peers.iter().map(|addr| {
            let peer: Arc<dyn PeerGetter> = Arc::new(RespPeer::new(addr.as_str(), peer_timeout));
            (addr.clone(), peer)
        }));
        group.register_peers(Arc::new(picker));
        info!("Peers: {}", args.peers.join(", "));
    }

    let listener = TcpListener::bind(&args.bind).await?;
    info!(
        "Serving group {} on {} (cache {} bytes, {} replicas)",
        group.name(),
        args.bind,
        args.cache_bytes,
        args.replicas
    );

    server::serve(listener, Arc::new(CommandHandler::new(registry))).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_id_defaults_to_bind() {
        let args = Args::try_parse_from([
            "geecached",
            "--bind",
            "10.0.0.1:8001",
            "--peers",
            "10.0.0.1:8001,10.0.0.2:8001",
        ])
        .unwrap();
        assert_eq!(args.self_id(), "10.0.0.1:8001");
        assert!(args.peers_include_self());
    }

    #[test]
    fn test_self_addr_overrides_wildcard_bind() {
        let args = Args::try_parse_from([
            "geecached",
            "--bind",
            "0.0.0.0:8001",
            "--self-addr",
            "10.0.0.1:8001",
            "--peers",
            "10.0.0.1:8001,10.0.0.2:8001",
        ])
        .unwrap();
        assert_eq!(args.self_id(), "10.0.0.1:8001");
        assert!(args.peers_include_self());

        let args =
            Args::try_parse_from(["geecached", "-b", "0.0.0.0:8001", "-p", "10.0.0.1:8001"])
                .unwrap();
        assert!(!args.peers_include_self());
    }
}
