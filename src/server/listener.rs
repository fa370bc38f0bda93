use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::Application;
use crate::http::connection::Connection;

/// Binds `addr` and serves `app` until the task is dropped.
pub async fn run(app: Arc<Application>, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    serve(app, listener).await
}

/// Accept loop over an already bound listener.
pub async fn serve(app: Arc<Application>, listener: TcpListener) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, app);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
