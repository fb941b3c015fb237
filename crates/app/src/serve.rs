//! Static file server for the web front end's assets.

use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn router(root: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

/// Serve `root` on localhost until the process is stopped.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run(root: &Path, port: u16) -> Result<(), Box<dyn Error>> {
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "static root is not a directory");
    }
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, root = %root.display(), "serving static files");
    axum::serve(listener, router(root)).await?;
    Ok(())
}
