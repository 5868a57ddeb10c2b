//! Read-only HTTP API over the cached dataset
//!
//! - `GET /` - the patched document without the hidden reference tables
//! - `GET /postajas` and the other section routes - one section as cached
//! - `GET /postajas/:lat/:lon/:tip/:dist` - enriched stations near a point
//! - `GET /:dataType/:id` - one record, enriched when it is a station
//!
//! Every route reads through the refresher, so a miss triggers a refresh.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{HeaderName, Method};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::signals::wait_for_shutdown_signal;
use crate::constants::{sections, server};
use crate::errors::{ConfigError, ConfigResult};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(routes::all_data))
        .route("/postajas/:id", get(routes::station_by_id))
        // Parameters in the same position must share a name; the first one is the latitude
        .route("/postajas/:id/:lon/:tip/:dist", get(routes::nearby_stations))
        .route("/:data_type/:id", get(routes::record_by_id));

    for key in sections::PARTITIONED {
        router = router.route(
            &format!("/{}", key),
            get(move |State(state): State<AppState>| routes::raw_section(state, key)),
        );
    }

    router
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin may issue GET requests with the usual headers
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(server::CORS_ALLOWED_HEADERS.map(HeaderName::from_static))
}

/// Parse the configured host and port into a bind address
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the host is not an IP address
pub fn resolve_bind_addr(host: &str, port: u16) -> ConfigResult<SocketAddr> {
    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidValue {
            field: "server.host".to_string(),
            value: host.to_string(),
            reason: e.to_string(),
        })
}

/// Serve `router` until shutdown is broadcast, then drain open connections
///
/// # Errors
///
/// Returns the I/O error that stopped the accept loop
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server is running on http://{}", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown_signal(shutdown_rx))
        .await
}
