//! Tower middleware enforcing one admission policy in front of a service.
//!
//! Health check endpoints bypass admission so load balancer probes never
//! consume caller quota.

use super::policy::AdmissionPolicy;
use super::response::apply_rate_limit_headers;
use crate::governance::Governance;
use crate::http::RequestMeta;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tower::{Layer, Service};

/// Tower layer applying `policy` through a shared [`Governance`].
#[derive(Clone)]
pub struct AdmissionLayer {
    governance: Arc<Governance>,
    policy: Arc<AdmissionPolicy>,
}

impl AdmissionLayer {
    pub fn new(governance: Arc<Governance>, policy: AdmissionPolicy) -> Self {
        Self {
            governance,
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            governance: self.governance.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Tower service produced by [`AdmissionLayer`]
#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    governance: Arc<Governance>,
    policy: Arc<AdmissionPolicy>,
}

impl<S> Service<Request> for AdmissionService<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let path = req.uri().path();
        if path == "/health" || path.starts_with("/health/") {
            let fut = self.inner.call(req);
            return Box::pin(async move { Ok(fut.await?.into_response()) });
        }

        let meta = RequestMeta::from_request(&req);
        match self.governance.admit(&meta, &self.policy) {
            Ok(decision) => {
                let fut = self.inner.call(req);
                Box::pin(async move {
                    let mut response = fut.await?.into_response();
                    apply_rate_limit_headers(&mut response, &decision);
                    Ok(response)
                })
            }
            Err(rejection) => Box::pin(async move { Ok(rejection) }),
        }
    }
}
