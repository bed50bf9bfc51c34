use std::collections::BTreeSet;

use thiserror::Error;

use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;

pub const ADMISSION_GROUP: &str = "admission.k8s.io";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn new(api_version: String, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(api_version),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            response,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed admission review: {0}")]
    Malformed(String),

    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),

    #[error("unsupported api version: {0}")]
    UnsupportedVersion(String),

    #[error("cannot encode admission review: {0}")]
    Encode(String),
}

/// Serialization format of an incoming admission review.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WireFormat {
    #[default]
    Json,
    Yaml,
}

impl WireFormat {
    /// Picks the format out of a `Content-Type` header value. Anything that is
    /// not recognised as YAML is treated as JSON, which is what the API server
    /// sends.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let mime = match content_type.and_then(|ct| ct.parse::<mime::Mime>().ok()) {
            Some(mime) => mime,
            None => return WireFormat::Json,
        };

        if is_yaml(mime.subtype()) || mime.suffix().is_some_and(is_yaml) {
            WireFormat::Yaml
        } else {
            WireFormat::Json
        }
    }
}

fn is_yaml(name: mime::Name<'_>) -> bool {
    matches!(name.as_str(), "yaml" | "x-yaml")
}

/// Decodes admission reviews coming from the API server and encodes the
/// answers sent back to it.
#[cfg_attr(test, mockall::automock)]
pub trait ReviewCodec: Send + Sync {
    /// Decodes `body` into a review whose `api_version` is always set to the
    /// version the review was decoded with.
    fn decode(&self, body: &[u8], format: WireFormat)
        -> Result<AdmissionReviewRequest, CodecError>;

    fn encode(&self, review: &AdmissionReviewResponse) -> Result<Vec<u8>, CodecError>;
}

/// The registry of the `admission.k8s.io` versions this server understands.
///
/// It's built once at startup and then shared, read only, by all the request
/// handlers.
#[derive(Clone, Debug)]
pub struct AdmissionCodec {
    versions: BTreeSet<String>,
    default_version: String,
}

impl Default for AdmissionCodec {
    fn default() -> Self {
        AdmissionCodec::new("v1", ["v1", "v1beta1"])
    }
}

impl AdmissionCodec {
    /// `default_version` is used for reviews that do not declare an `apiVersion`,
    /// it's always registered.
    pub fn new<I, S>(default_version: &str, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut versions: BTreeSet<String> = versions.into_iter().map(Into::into).collect();
        versions.insert(default_version.to_owned());

        AdmissionCodec {
            versions,
            default_version: default_version.to_owned(),
        }
    }

    /// Fully qualified names of the registered versions, e.g. `admission.k8s.io/v1`
    pub fn api_versions(&self) -> impl Iterator<Item = String> + '_ {
        self.versions
            .iter()
            .map(|version| format!("{ADMISSION_GROUP}/{version}"))
    }

    fn resolve_api_version(&self, api_version: Option<&str>) -> Result<String, CodecError> {
        let api_version = match api_version {
            None => return Ok(format!("{ADMISSION_GROUP}/{}", self.default_version)),
            Some(api_version) => api_version,
        };

        match api_version.split_once('/') {
            Some((ADMISSION_GROUP, version)) if self.versions.contains(version) => {
                Ok(api_version.to_owned())
            }
            _ => Err(CodecError::UnsupportedVersion(api_version.to_owned())),
        }
    }
}

impl ReviewCodec for AdmissionCodec {
    fn decode(
        &self,
        body: &[u8],
        format: WireFormat,
    ) -> Result<AdmissionReviewRequest, CodecError> {
        let mut review: AdmissionReviewRequest = match format {
            // The content type is only a hint: YAML bodies labelled as JSON, or
            // not labelled at all, are still accepted.
            WireFormat::Json => serde_json::from_slice(body).or_else(|json_error| {
                serde_yaml::from_slice(body)
                    .map_err(|_| CodecError::Malformed(json_error.to_string()))
            })?,
            WireFormat::Yaml => {
                serde_yaml::from_slice(body).map_err(|e| CodecError::Malformed(e.to_string()))?
            }
        };

        if let Some(kind) = review.kind.as_deref() {
            if kind != ADMISSION_REVIEW_KIND {
                return Err(CodecError::UnsupportedKind(kind.to_owned()));
            }
        }
        review.api_version = Some(self.resolve_api_version(review.api_version.as_deref())?);

        Ok(review)
    }

    fn encode(&self, review: &AdmissionReviewResponse) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(review).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const REVIEW: &str = r#"
        {
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "abc123",
                "operation": "CREATE",
                "object": {"apiVersion": "v1", "kind": "Pod"}
            }
        }
    "#;

    #[rstest]
    #[case::missing(None, WireFormat::Json)]
    #[case::json(Some("application/json"), WireFormat::Json)]
    #[case::json_with_charset(Some("application/json; charset=utf-8"), WireFormat::Json)]
    #[case::yaml(Some("application/yaml"), WireFormat::Yaml)]
    #[case::x_yaml(Some("application/x-yaml"), WireFormat::Yaml)]
    #[case::yaml_suffix(Some("application/vnd.custom+yaml"), WireFormat::Yaml)]
    #[case::unknown(Some("text/plain"), WireFormat::Json)]
    #[case::garbage(Some("not a mime"), WireFormat::Json)]
    fn wire_format_from_content_type(
        #[case] content_type: Option<&str>,
        #[case] expected: WireFormat,
    ) {
        assert_eq!(
            WireFormat::from_content_type(content_type),
            expected
        );
    }

    #[test]
    fn decode_json_review() {
        let codec = AdmissionCodec::default();
        let review = codec
            .decode(REVIEW.as_bytes(), WireFormat::Json)
            .expect("decoding should work");

        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
        assert_eq!(review.request.uid, "abc123");
        assert_eq!(review.request.operation, "CREATE");
    }

    #[test]
    fn decode_yaml_review() {
        let input = r#"
apiVersion: admission.k8s.io/v1beta1
kind: AdmissionReview
request:
  uid: abc123
  operation: DELETE
  namespace: default
"#;
        let codec = AdmissionCodec::default();
        let review = codec
            .decode(input.as_bytes(), WireFormat::Yaml)
            .expect("decoding should work");

        assert_eq!(
            review.api_version.as_deref(),
            Some("admission.k8s.io/v1beta1")
        );
        assert_eq!(review.request.operation, "DELETE");
        assert_eq!(review.request.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn decode_yaml_review_without_yaml_content_type() {
        let input = "request:\n  uid: abc123\n  operation: UPDATE\n";
        let codec = AdmissionCodec::default();
        let review = codec
            .decode(input.as_bytes(), WireFormat::Json)
            .expect("decoding should work");

        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
        assert_eq!(review.request.uid, "abc123");
        assert_eq!(review.request.operation, "UPDATE");
    }

    #[test]
    fn malformed_review_reports_the_json_error() {
        let codec = AdmissionCodec::default();
        let error = codec
            .decode(br#"{"request": {"uid": "abc"#, WireFormat::Json)
            .unwrap_err();

        let expected = serde_json::from_str::<AdmissionReviewRequest>(r#"{"request": {"uid": "abc"#)
            .unwrap_err()
            .to_string();
        assert!(matches!(error, CodecError::Malformed(message) if message == expected));
    }

    #[test]
    fn decode_defaults_missing_api_version() {
        let codec = AdmissionCodec::default();
        let review = codec
            .decode(br#"{"request": {"uid": "abc123"}}"#, WireFormat::Json)
            .expect("decoding should work");

        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
        assert!(review.kind.is_none());
    }

    #[rstest]
    #[case::truncated(r#"{"request": {"uid": "abc"#)]
    #[case::no_request(r#"{"apiVersion": "admission.k8s.io/v1"}"#)]
    #[case::empty_object("{}")]
    #[case::not_an_object("[1, 2, 3]")]
    fn decode_malformed_review(#[case] input: &str) {
        let codec = AdmissionCodec::default();
        let result = codec.decode(input.as_bytes(), WireFormat::Json);

        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[rstest]
    #[case::unknown_version("admission.k8s.io/v2")]
    #[case::wrong_group("apps/v1")]
    #[case::no_group("v1")]
    fn decode_unsupported_version(#[case] api_version: &str) {
        let input = json!({
            "apiVersion": api_version,
            "kind": "AdmissionReview",
            "request": {"uid": "abc123"}
        })
        .to_string();

        let codec = AdmissionCodec::default();
        let result = codec.decode(input.as_bytes(), WireFormat::Json);

        assert!(matches!(result, Err(CodecError::UnsupportedVersion(v)) if v == api_version));
    }

    #[test]
    fn decode_unsupported_kind() {
        let input = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "Pod",
            "request": {"uid": "abc123"}
        })
        .to_string();

        let codec = AdmissionCodec::default();
        let result = codec.decode(input.as_bytes(), WireFormat::Json);

        assert!(matches!(result, Err(CodecError::UnsupportedKind(k)) if k == "Pod"));
    }

    #[test]
    fn custom_registry() {
        let codec = AdmissionCodec::new("v1", Vec::<String>::new());

        assert_eq!(
            codec.api_versions().collect::<Vec<_>>(),
            vec!["admission.k8s.io/v1".to_owned()]
        );
        assert!(codec
            .decode(
                br#"{"apiVersion": "admission.k8s.io/v1beta1", "request": {}}"#,
                WireFormat::Json
            )
            .is_err());
    }

    #[test]
    fn encode_response_envelope() {
        let codec = AdmissionCodec::default();
        let review = AdmissionReviewResponse::new(
            String::from("admission.k8s.io/v1"),
            AdmissionResponse::allow(String::from("abc123")),
        );

        let encoded = codec.encode(&review).expect("encoding should work");
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(
            value,
            json!({
                "apiVersion": "admission.k8s.io/v1",
                "kind": "AdmissionReview",
                "response": {"uid": "abc123", "allowed": true}
            })
        );
    }
}
