//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Keep routes grouped by method, in registration order
//! - Run the body-parsing step before looking at the request
//! - Dispatch to the first route whose method and template match
//! - Answer everything else with a `NOT FOUND` 404
//! - Declare every response as JSON unless a handler chose otherwise
//!
//! # Design Decisions
//! - Immutable after construction; shared behind an `Arc` by the server
//! - O(n) template scan per method (route tables are small)
//! - First match wins, no precedence between overlapping templates
//! - Handlers receive an owned clone of the router state

use std::future::Future;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

use crate::config::LimitsConfig;
use crate::error::RouteError;
use crate::http::body::read_json_body;
use crate::http::request::{QueryParams, Request};
use crate::http::response;
use crate::routing::matcher::PathMatcher;

/// A route handler.
///
/// Implemented for every `Fn(Request, S) -> impl Future<Output = impl IntoResponse>`.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, request: Request, state: S) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R, S> Handler<S> for F
where
    F: Fn(Request, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, request: Request, state: S) -> BoxFuture<'static, Response> {
        let future = (self)(request, state);
        Box::pin(async move { future.await.into_response() })
    }
}

struct Route<S> {
    matcher: PathMatcher,
    handler: Box<dyn Handler<S>>,
}

/// Method-keyed, registration-ordered route table.
pub struct Router<S> {
    routes: Vec<(Method, Vec<Route<S>>)>,
    state: S,
    body_limit: usize,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self {
            routes: Vec::new(),
            state,
            body_limit: LimitsConfig::default().max_body_size,
        }
    }

    /// Maximum number of body bytes the body step will buffer.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Register `handler` for `method` (case-insensitive) and `template`.
    pub fn route<H>(mut self, method: &str, template: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Handler<S>,
    {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RouteError::InvalidMethod(method.to_string()))?;
        let route = Route {
            matcher: PathMatcher::compile(template)?,
            handler: Box::new(handler),
        };

        tracing::debug!(method = %method, template = %template, "Route registered");

        match self.routes.iter_mut().find(|(m, _)| *m == method) {
            Some((_, routes)) => routes.push(route),
            None => self.routes.push((method, vec![route])),
        }
        Ok(self)
    }

    pub fn get<H: Handler<S>>(self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.route("GET", template, handler)
    }

    pub fn post<H: Handler<S>>(self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.route("POST", template, handler)
    }

    pub fn put<H: Handler<S>>(self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.route("PUT", template, handler)
    }

    pub fn patch<H: Handler<S>>(self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.route("PATCH", template, handler)
    }

    pub fn delete<H: Handler<S>>(self, template: &str, handler: H) -> Result<Self, RouteError> {
        self.route("DELETE", template, handler)
    }

    /// Number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.iter().map(|(_, routes)| routes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle one request end to end.
    pub async fn execute(&self, request: axum::extract::Request) -> Response {
        let (parts, body) = request.into_parts();
        tracing::info!(method = %parts.method, uri = %parts.uri, "Request");

        let body = match read_json_body(body, self.body_limit).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Request body could not be read");
                return response::error(StatusCode::BAD_REQUEST, e.to_string());
            }
        };

        let mut response = self.dispatch(Request::new(parts, body)).await;
        response::ensure_json_content_type(&mut response);
        response
    }

    async fn dispatch(&self, mut request: Request) -> Response {
        let Some(route) = self.find(request.method(), request.target()) else {
            tracing::debug!(method = %request.method(), uri = %request.uri(), "No route matched");
            return response::not_found();
        };

        let target = request.target().to_string();
        request.set_params(route.matcher.extract_params(&target));
        request.set_query(QueryParams::from_target(&target));

        route.handler.call(request, self.state.clone()).await
    }

    fn find(&self, method: &Method, target: &str) -> Option<&Route<S>> {
        self.routes
            .iter()
            .filter(|(m, _)| m == method)
            .flat_map(|(_, routes)| routes.iter())
            .find(|route| route.matcher.matches(target))
    }
}
