use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use admission_adapter::{
    admission_response::AdmissionResponse,
    admission_review::AdmissionReviewRequest,
    config::Config,
    webhook::{Verdict, Webhook, WebhookError},
    AdmissionServer,
};
use axum::{
    body::Body,
    http::{self, header, Request},
    Router,
};

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        webhook_path: "/review".to_owned(),
        max_body_size: 3 * 1024 * 1024,
        verdict: Verdict::Allow,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn app(config: Config, webhook: Arc<dyn Webhook>) -> Router {
    AdmissionServer::new(config, webhook).router()
}

type Decide = fn(&AdmissionReviewRequest) -> AdmissionResponse;

/// Webhook stub that answers through `decide` and counts its invocations.
pub(crate) struct RecordingWebhook {
    calls: AtomicUsize,
    decide: Decide,
}

impl RecordingWebhook {
    pub(crate) fn new(decide: Decide) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            decide,
        })
    }

    /// Allows everything, echoing the request uid.
    pub(crate) fn allow() -> Arc<Self> {
        Self::new(|review| AdmissionResponse::allow(review.request.uid.clone()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Webhook for RecordingWebhook {
    fn review(&self, review: &AdmissionReviewRequest) -> Result<AdmissionResponse, WebhookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.decide)(review))
    }
}

pub(crate) fn review_request(content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, content_type)
        .uri("/review")
        .body(body.into())
        .unwrap()
}
