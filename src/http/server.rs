//! JSON gateway setup.
//!
//! # Responsibilities
//! - Create the Axum Router with all REST routes
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Serve on the demultiplexer's HTTP listener with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::lifecycle::{Backend, Shutdown};
use crate::net::{HttpIncoming, MuxConnectInfo};

use super::handlers;

/// Build the gateway router with all middleware layers.
#[allow(deprecated)]
pub fn router(backend: Arc<Backend>, config: &HttpConfig) -> Router {
    Router::new()
        .route("/v1/auth/login", post(handlers::login))
        .route("/v1/auth/logout", post(handlers::logout))
        .route("/v1/users", post(handlers::create_user).get(handlers::list_users))
        .route(
            "/v1/users/{username}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/v1/movies", get(handlers::list_movies).post(handlers::create_movie))
        .route(
            "/v1/movies/{id}",
            get(handlers::get_movie)
                .put(handlers::update_movie)
                .patch(handlers::partial_update_movie)
                .delete(handlers::delete_movie),
        )
        .route("/v1/ping", post(handlers::ping))
        .with_state(backend)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
        )
}

/// Serve `router` on `incoming` until `shutdown` fires, then let open
/// requests finish.
pub async fn serve(router: Router, incoming: HttpIncoming, shutdown: Shutdown) -> Result<(), std::io::Error> {
    tracing::info!("HTTP gateway starting");

    let app = router.into_make_service_with_connect_info::<MuxConnectInfo>();
    axum::serve(incoming, app)
        .with_graceful_shutdown(shutdown.signalled())
        .await?;

    tracing::info!("HTTP gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DemuxConfig, ListenerConfig};
    use crate::http::CallMeta;
    use crate::net::{Demux, Listener};

    #[tokio::test]
    async fn serves_demuxed_connections_with_peer_info() {
        let listener = Listener::bind(&ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        let (demux, _rpc, http) = Demux::new(listener, None, &DemuxConfig::default()).unwrap();
        let addr = demux.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let peer = Router::new().route(
            "/peer",
            get(|meta: CallMeta| async move { meta.peer.map(|peer| peer.ip().to_string()).unwrap_or_default() }),
        );
        let demux_task = tokio::spawn(Arc::clone(&demux).serve(shutdown.clone()));
        let http_task = tokio::spawn(serve(peer, http, shutdown.clone()));

        let body = reqwest::get(format!("http://{addr}/peer"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "127.0.0.1");

        shutdown.trigger();
        demux_task.await.unwrap().unwrap();
        demux.shutdown();
        http_task.await.unwrap().unwrap();
    }
}
