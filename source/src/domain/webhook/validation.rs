//! Webhook validation.
//!
//! Rejections are not errors: an event that fails validation is dropped
//! with a debug log and reported as ignored, so untrusted callers learn
//! nothing about why.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::WebhookPayload;

/// Hosts that serve repository APIs, below one repository label.
const API_DOMAINS: [&str; 3] = ["wroom.test", "wroom.io", "prismic.io"];

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The body is not a JSON object.
    NotAnObject,
    /// The shared secret does not match.
    InvalidSecret,
    /// The CMS's "test trigger" ping.
    TestTrigger,
    /// `apiUrl` does not point at a repository API.
    UnrecognisedSource,
    /// The body does not have the expected structure.
    Malformed,
}

/// Check the payload secret against the configured one.
///
/// Without a configured secret every payload passes.
pub fn validate_secret(configured: Option<&str>, body: &Value) -> bool {
    match configured {
        None => true,
        Some(expected) => body.get("secret").and_then(Value::as_str) == Some(expected),
    }
}

/// Whether `url` is a repository API endpoint: `http(s)://{repository}.`
/// followed by a known API domain, with a path under `/api`.
///
/// # Examples
/// ```
/// use prismic_source::domain::webhook::is_prismic_url;
///
/// assert!(is_prismic_url("https://blog.prismic.io/api/v2"));
/// assert!(is_prismic_url("http://blog.wroom.test/api"));
/// assert!(!is_prismic_url("https://blog.example.com/api"));
/// assert!(!is_prismic_url("https://a.b.prismic.io/api"));
/// ```
pub fn is_prismic_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") || parsed.port().is_some() {
        return false;
    }
    let Some((repository, domain)) = parsed.host_str().and_then(|host| host.split_once('.')) else {
        return false;
    };
    !repository.is_empty() && API_DOMAINS.contains(&domain) && parsed.path().starts_with("/api")
}

/// Validate a raw webhook body and decode it.
///
/// # Errors
///
/// Returns the [`IgnoreReason`] when the event must be dropped.
pub fn parse_webhook(body: &Value, secret: Option<&str>) -> Result<WebhookPayload, IgnoreReason> {
    let reason = if !body.is_object() {
        IgnoreReason::NotAnObject
    } else if !validate_secret(secret, body) {
        IgnoreReason::InvalidSecret
    } else if body.get("type").and_then(Value::as_str) == Some("test-trigger") {
        IgnoreReason::TestTrigger
    } else if !body.get("apiUrl").and_then(Value::as_str).is_some_and(is_prismic_url) {
        IgnoreReason::UnrecognisedSource
    } else {
        return WebhookPayload::deserialize(body).map_err(|error| {
            debug!(%error, "webhook body has an unexpected structure");
            IgnoreReason::Malformed
        });
    };
    debug!(?reason, "ignoring webhook");
    Err(reason)
}

#[cfg(test)]
mod tests {
    //! Validation coverage.

    use super::*;
    use crate::domain::webhook::DocumentRef;
    use rstest::rstest;
    use serde_json::json;

    const API_URL: &str = "https://repo.prismic.io/api/v2";

    #[rstest]
    #[case(None, json!({}), true)]
    #[case(Some("s3cret"), json!({ "secret": "s3cret" }), true)]
    #[case(Some("s3cret"), json!({ "secret": "wrong" }), false)]
    #[case(Some("s3cret"), json!({}), false)]
    fn secret_validation(#[case] configured: Option<&str>, #[case] body: Value, #[case] expected: bool) {
        assert_eq!(validate_secret(configured, &body), expected);
    }

    #[rstest]
    #[case("https://repo.prismic.io/api/v2", true)]
    #[case("https://repo.wroom.io/api", true)]
    #[case("http://repo.wroom.test/api/", true)]
    #[case("ftp://repo.prismic.io/api", false)]
    #[case("https://repo.prismic.io/graphql", false)]
    #[case("https://prismic.io/api", false)]
    #[case("https://repo.prismic.io:8443/api", false)]
    #[case("not a url", false)]
    fn source_url_validation(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_prismic_url(url), expected);
    }

    #[rstest]
    #[case(json!([1, 2]), None, IgnoreReason::NotAnObject)]
    #[case(json!({ "apiUrl": API_URL, "secret": "nope" }), Some("s3cret"), IgnoreReason::InvalidSecret)]
    #[case(json!({ "apiUrl": API_URL, "type": "test-trigger" }), None, IgnoreReason::TestTrigger)]
    #[case(json!({ "apiUrl": "https://evil.example/api" }), None, IgnoreReason::UnrecognisedSource)]
    #[case(json!({ "apiUrl": API_URL, "documents": { "addition": [7] } }), None, IgnoreReason::Malformed)]
    fn rejected_bodies(#[case] body: Value, #[case] secret: Option<&str>, #[case] reason: IgnoreReason) {
        assert_eq!(parse_webhook(&body, secret), Err(reason));
    }

    #[test]
    fn accepts_bare_and_object_document_references() {
        let payload = parse_webhook(
            &json!({
                "apiUrl": API_URL,
                "type": "api-update",
                "documents": { "addition": ["A", { "id": "B" }] },
                "releases": { "update": [{ "id": "R1", "documents": { "deletion": ["C"] } }] }
            }),
            None,
        )
        .expect("valid payload");

        let added: Vec<_> = payload.documents.addition.iter().map(DocumentRef::id).collect();
        assert_eq!(added, vec!["A", "B"]);
        assert_eq!(payload.releases.update[0].documents.deletion[0].id(), "C");
    }
}
