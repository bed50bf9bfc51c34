use std::str::FromStr;

use thiserror::Error;

use crate::admission_response::AdmissionResponse;
use crate::admission_review::AdmissionReviewRequest;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    Internal(String),
}

/// The decision maker behind the endpoint: it inspects an admission review and
/// returns the verdict for it.
///
/// Implementations must not care about HTTP, the adapter takes care of that.
/// Returning an error means no verdict could be rendered, the request is then
/// answered with an internal server error and the API server applies its own
/// failure policy.
pub trait Webhook: Send + Sync {
    fn review(&self, review: &AdmissionReviewRequest) -> Result<AdmissionResponse, WebhookError>;
}

impl<F> Webhook for F
where
    F: Fn(&AdmissionReviewRequest) -> Result<AdmissionResponse, WebhookError> + Send + Sync,
{
    fn review(&self, review: &AdmissionReviewRequest) -> Result<AdmissionResponse, WebhookError> {
        self(review)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verdict {
    #[default]
    Allow,
    Deny,
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Verdict::Allow),
            "deny" => Ok(Verdict::Deny),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// Webhook that gives the same answer to every request.
#[derive(Clone, Debug, Default)]
pub struct FixedVerdict {
    verdict: Verdict,
}

impl FixedVerdict {
    pub fn new(verdict: Verdict) -> Self {
        FixedVerdict { verdict }
    }
}

impl Webhook for FixedVerdict {
    fn review(&self, review: &AdmissionReviewRequest) -> Result<AdmissionResponse, WebhookError> {
        let uid = review.request.uid.clone();
        Ok(match self.verdict {
            Verdict::Allow => AdmissionResponse::allow(uid),
            Verdict::Deny => {
                AdmissionResponse::reject(uid, String::from("request denied by webhook"), 403)
            }
        })
    }
}
