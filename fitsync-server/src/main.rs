#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use fitsync_http::serve;

/// Local offline sync service: queues fitness-data writes and replays them
/// against the backend when connectivity returns.
#[derive(Parser)]
#[command(name = "fitsync", version)]
struct Cli {
    #[arg(long, env = "FITSYNC_DATA_DIR", default_value = "./data")]
    data_dir: String,
    #[arg(long, env = "FITSYNC_BIND_ADDR", default_value = "127.0.0.1:7800")]
    bind_addr: String,
    /// Backend base URL, used when the data dir has no remote.json
    #[arg(long, env = "FITSYNC_REMOTE_URL")]
    remote_url: Option<String>,
    /// Start in offline mode until a network event says otherwise
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    std::env::set_var("FITSYNC_DATA_DIR", &cli.data_dir);
    std::env::set_var("FITSYNC_BIND_ADDR", &cli.bind_addr);
    if let Some(url) = &cli.remote_url {
        std::env::set_var("FITSYNC_REMOTE_URL", url);
    }
    if cli.offline {
        std::env::set_var("FITSYNC_START_ONLINE", "false");
    }
    serve().await
}
