//! Port handshake: fixed port, reuse probe, ephemeral fallback.

use crate::Args;
use env_config::Settings;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_millis(750);

/// Binds the listener per the startup rules. `Ok(None)` means a compatible
/// instance already owns the fixed port and its base URL was printed.
pub(crate) async fn acquire_listener(
    args: &Args,
    settings: &Settings,
) -> Result<Option<TcpListener>, Box<dyn std::error::Error + Send + Sync>> {
    if args.ephemeral {
        return Ok(Some(TcpListener::bind("127.0.0.1:0").await?));
    }

    let addr = args.addr.as_deref().unwrap_or(serve::DEFAULT_ADDR);
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(Some(listener)),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            if settings.reuse_existing_proxy && probe_health(addr).await {
                info!("reusing existing cursor-acp instance at {addr}");
                println!("http://{addr}");
                return Ok(None);
            }
            warn!("{addr} is taken by an incompatible process, binding an ephemeral port");
            Ok(Some(TcpListener::bind("127.0.0.1:0").await?))
        }
        Err(err) => Err(err.into()),
    }
}

/// True when the occupant of the fixed port answers `/health` like one of us.
async fn probe_health(addr: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(HEALTH_PROBE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    let Ok(resp) = client.get(format!("http://{addr}/health")).send().await else {
        return false;
    };
    let Ok(body) = resp.json::<serde_json::Value>().await else {
        return false;
    };
    body["ok"] == serde_json::Value::Bool(true)
}
