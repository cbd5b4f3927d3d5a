//! # Bites Gateway
//!
//! Read-only HTTP front end. Every request is translated into one store
//! query issued through a [`StoreClient`], and the store's reply status is
//! mirrored back to the HTTP caller.
//!
//! ## Routes
//!
//! | Route | Answer |
//! |-------|--------|
//! | `GET /conversation/{key}/scan?from=A&to=B` | JSON [`ScanBody`] |
//! | `GET /conversation/{key}/start/{start}` | segment payload, `audio/wav` |
//! | `GET /conversation/{key}/start/{start}/user` | annotation payload, `text/plain` |

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use bites_core::StoreClient;
use bites_core::protocol::REQUEST_TIMEOUT;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::GatewayError;
pub use routes::ScanBody;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn StoreClient>,
    /// Upper bound on a single store query, whatever the client does
    pub timeout: Duration,
}

impl AppState {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/conversation/{key}/scan", get(routes::scan))
        .route("/conversation/{key}/start/{start}", get(routes::segment))
        .route("/conversation/{key}/start/{start}/user", get(routes::annotation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway until the listener fails
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Gateway listening");
    }
    axum::serve(listener, router(state)).await
}
