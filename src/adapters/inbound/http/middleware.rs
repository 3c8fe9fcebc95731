use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::services::Gateway;

/// Header naming the mode (`live` or `mock`) a response was served in
pub const GATEWAY_MODE_HEADER: HeaderName = HeaderName::from_static("x-gateway-mode");

/// The Tower layer that tags every response with the gateway mode
#[derive(Clone)]
pub struct GatewayModeLayer {
    gateway: Arc<Gateway>,
}

impl GatewayModeLayer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        GatewayModeLayer { gateway }
    }
}

impl<S> Layer<S> for GatewayModeLayer {
    type Service = GatewayModeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayModeMiddleware {
            inner,
            gateway: self.gateway.clone(),
        }
    }
}

/// Adds `x-gateway-mode` unless the handler already set it
#[derive(Clone)]
pub struct GatewayModeMiddleware<S> {
    inner: S,
    gateway: Arc<Gateway>,
}

impl<S> Service<Request<Body>> for GatewayModeMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gateway = self.gateway.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            // Read after the call: the request may have triggered a reconnect
            if !response.headers().contains_key(&GATEWAY_MODE_HEADER) {
                let mode = gateway.mode().await;
                response.headers_mut().insert(
                    GATEWAY_MODE_HEADER,
                    HeaderValue::from_static(mode.as_str()),
                );
            }

            Ok(response)
        })
    }
}
