//! HTTP transport for the directory listing
//!
//! The transport only moves bytes. Deciding whether those bytes are a
//! usable directory happens in [`parse_listing`], so the classification can
//! be exercised without a server.

use super::mapping::{extract_rows, map_rows, FieldMapping};
use super::record::InstitutionRecord;
use crate::error::FetchError;
use crate::logging;
use std::time::Duration;

/// What came back from the listing endpoint, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// A 200 response with a JSON content type.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json; charset=UTF-8".to_string()),
            body: body.into(),
        }
    }
}

/// Fetches the listing endpoint once.
///
/// Implementations report only transport failures as `Err`; HTTP error
/// statuses come back as a [`RawResponse`].
pub trait DirectoryTransport: Send {
    fn get(&self) -> Result<RawResponse, FetchError>;
}

/// Blocking reqwest transport against a fixed endpoint
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fertilikey/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DirectoryTransport for HttpTransport {
    fn get(&self) -> Result<RawResponse, FetchError> {
        logging::info("HTTP", &format!("GET {}", self.endpoint));

        let resp = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Turn a raw response into records, or say why it is unusable.
pub fn parse_listing(
    resp: RawResponse,
    mapping: &FieldMapping,
) -> Result<Vec<InstitutionRecord>, FetchError> {
    if !(200..300).contains(&resp.status) {
        return Err(FetchError::HttpStatus(resp.status));
    }

    let is_json = resp
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    if !is_json {
        logging::error(
            "HTTP",
            &format!("Non-JSON response received: {}...", preview(&resp.body)),
        );
        return Err(FetchError::MalformedResponse(format!(
            "Expected JSON response but got content-type: {}",
            resp.content_type.as_deref().unwrap_or("none")
        )));
    }

    let value: serde_json::Value = serde_json::from_str(&resp.body).map_err(|e| {
        logging::error(
            "HTTP",
            &format!("Failed to parse JSON response. Raw response: {}...", preview(&resp.body)),
        );
        FetchError::MalformedResponse(e.to_string())
    })?;

    map_rows(extract_rows(value)?, mapping)
}

/// First 200 characters of a body, for the log
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, ct: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status,
            content_type: ct.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn non_success_status_is_http_error() {
        let err = parse_listing(raw(500, Some("application/json"), "{}"), &FieldMapping::default())
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(500));
    }

    #[test]
    fn html_error_page_is_malformed() {
        let err = parse_listing(
            raw(200, Some("text/html"), "<html>oops</html>"),
            &FieldMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn missing_content_type_is_malformed() {
        let err = parse_listing(raw(200, None, "[]"), &FieldMapping::default()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_listing(RawResponse::json("[{"), &FieldMapping::default()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn wrapped_listing_parses() {
        let body = r#"{"message":"ok","status":200,"data":[{"name":"Mercy General","city":"Austin"}]}"#;
        let records = parse_listing(RawResponse::json(body), &FieldMapping::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Austin");
    }

    #[test]
    fn preview_is_bounded() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).len(), 200);
    }
}
