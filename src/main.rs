use std::sync::Arc;

use httpframe::config::Config;
use httpframe::server::{listener, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let app = Arc::new(App::new(&cfg)?);

    tokio::select! {
        res = listener::run(&cfg.listen_addr, app, cfg.chunk_size) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
