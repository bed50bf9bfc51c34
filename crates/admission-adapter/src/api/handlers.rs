use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::task;
use tracing::{debug, error, Span};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    admission_review::{AdmissionReviewResponse, WireFormat, ADMISSION_GROUP},
    api::{
        api_error::{AdapterError, ApiError},
        state::ApiServerState,
    },
    webhook::WebhookError,
};

#[tracing::instrument(
    name = "review",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Hand an admission review over to the webhook and send its verdict back.
///
/// The status is always 200 once a verdict has been rendered, whether the
/// request was allowed or not: the decision travels inside of the payload.
pub(crate) async fn review_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let format = WireFormat::from_content_type(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );

    match review(state, format, body).await {
        Ok(payload) => Ok((
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
            payload,
        )
            .into_response()),
        Err(error) => Err(handle_adapter_error(error)),
    }
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

async fn review(
    state: Arc<ApiServerState>,
    format: WireFormat,
    body: Body,
) -> Result<Vec<u8>, AdapterError> {
    let raw = body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| AdapterError::ReadBody(e.to_string()))?;
    if raw.is_empty() {
        return Err(AdapterError::InputEmpty);
    }

    let admission_review = state
        .codec
        .decode(&raw, format)
        .map_err(AdapterError::Decode)?;
    populate_span_with_admission_request_data(&admission_review.request);

    let request_uid = admission_review.request.uid.clone();
    let api_version = admission_review
        .api_version
        .clone()
        .unwrap_or_else(|| format!("{ADMISSION_GROUP}/v1"));

    let webhook = state.webhook.clone();
    let span = Span::current();
    let response = task::spawn_blocking(move || {
        let _enter = span.enter();
        webhook.review(&admission_review)
    })
    .await
    .map_err(|e| {
        AdapterError::Webhook(WebhookError::Internal(format!("webhook task failed: {e}")))
    })?
    .map_err(AdapterError::Webhook)?
    .correlate(&request_uid);

    debug!(response =? &response, "admission review evaluated");
    populate_span_with_review_results(&response);

    state
        .codec
        .encode(&AdmissionReviewResponse::new(api_version, response))
        .map_err(AdapterError::Encode)
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
}

fn populate_span_with_review_results(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}

fn handle_adapter_error(error: AdapterError) -> ApiError {
    if error.status().is_server_error() {
        error!(error = ?error, "cannot answer admission review");
    } else {
        debug!(error = ?error, "bad admission review request");
    }

    ApiError::from(error)
}
