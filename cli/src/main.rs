//! cursor-acp daemon binary.
//!
//! Startup: load config into the environment, then the port handshake — try
//! the fixed loopback port; when it is taken, probe `/health` and reuse a
//! compatible instance (print its base URL, exit 0), otherwise bind an
//! ephemeral port. The chosen base URL goes to stdout so installers and
//! editor hosts can capture it.

mod startup;

use clap::Parser;
use env_config::Settings;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cursor-acp")]
#[command(about = "OpenAI-compatible bridge daemon for the Cursor agent CLI")]
struct Args {
    /// Listen address (default 127.0.0.1:8790)
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,

    /// Always bind an ephemeral port instead of the fixed one
    #[arg(long)]
    ephemeral: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = env_config::load_and_apply("cursor-acp", None) {
        warn!("config load: {err}");
    }
    let settings = Settings::from_env();

    let Some(listener) = startup::acquire_listener(&args, &settings).await? else {
        // A compatible instance already owns the port; its URL was printed.
        return Ok(());
    };
    let addr = listener.local_addr()?;
    println!("http://{addr}");

    serve::run_serve_on_listener(listener, settings).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
