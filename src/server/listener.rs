use std::net::Shutdown;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::connection::{Connection, Handler};

/// Binds `listen_addr` and serves connections until an accept fails.
pub async fn run<H: Handler + 'static>(
    listen_addr: &str,
    handler: Arc<H>,
    chunk_size: usize,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    serve(listener, handler, chunk_size).await
}

/// Accepts connections from `listener`, serving each on its own blocking
/// task. Parsing and writing block that task only.
pub async fn serve<H: Handler + 'static>(
    listener: TcpListener,
    handler: Arc<H>,
    chunk_size: usize,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let stream = socket.into_std()?;
        stream.set_nonblocking(false)?;

        let handler = Arc::clone(&handler);
        tokio::task::spawn_blocking(move || {
            let result = stream.try_clone().map_err(anyhow::Error::from).and_then(|reader| {
                let mut conn = Connection::new(reader, &stream).with_chunk_size(chunk_size);
                conn.serve(handler.as_ref())?;
                Ok(())
            });
            if let Err(e) = result {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
            let _ = stream.shutdown(Shutdown::Both);
            info!("Connection to {} closed", peer);
        });
    }
}
