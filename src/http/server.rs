//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the route table in an Axum service
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Record per-request metrics
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{body::Body, extract::Request as HttpRequest, response::Response};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::routing::Router;

/// HTTP server serving one route table.
pub struct HttpServer {
    app: axum::Router,
}

impl HttpServer {
    pub fn new<S>(config: AppConfig, router: Router<S>) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        Self {
            app: Self::build_router(&config, Arc::new(router)),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<S>(config: &AppConfig, router: Arc<Router<S>>) -> axum::Router
    where
        S: Clone + Send + Sync + 'static,
    {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &HttpRequest<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .map_response(|res: Response<tower_http::limit::ResponseBody<Body>>| res.map(Body::new))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size));

        axum::Router::new()
            .fallback(move |request: HttpRequest| dispatch(router.clone(), request))
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered service, for driving without a socket.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }
}

async fn dispatch<S>(router: Arc<Router<S>>, request: HttpRequest) -> Response
where
    S: Clone + Send + Sync + 'static,
{
    let start = Instant::now();
    let method = request.method().to_string();

    let response = router.execute(request).await;

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
