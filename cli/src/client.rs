//! HTTP adapters: registration API client and postal PIN directory

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use udyam_forms::{
    is_valid_pin, parse_postal_reply, FormValues, LookupError, PinDirectory, PinLocation, RecordErrors,
    SchemaDocument, SubmissionSink, SubmitError, SubmitReceipt,
};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_PIN_URL: &str = "https://api.postalpincode.in";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL {0}: {1}")]
    Url(String, url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("schema unavailable: {0}")]
    Schema(String),
}

fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path).map_err(|e| ClientError::Url(path.to_string(), e))
}

#[derive(Deserialize)]
struct ErrorsBody {
    errors: RecordErrors,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Outcome of `POST /api/validate`
#[derive(Debug, PartialEq)]
pub enum PreCheck {
    Valid,
    Invalid(RecordErrors),
}

/// Registration API client
pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Url(base_url.to_string(), e))?;
        Ok(Self { base_url, client: reqwest::Client::new() })
    }

    async fn fetch_schema(&self, path: &str) -> Result<SchemaDocument, ClientError> {
        let resp = self.client.get(join(&self.base_url, path)?).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body });
        }
        SchemaDocument::from_json(&body).map_err(|e| ClientError::Schema(e.to_string()))
    }

    /// Load the Schema Document: API first, then the static copy, then a
    /// local file when one is given.
    pub async fn load_schema(&self, local: Option<&Path>) -> Result<SchemaDocument, ClientError> {
        let mut failures = Vec::new();
        for path in ["/api/schema", "/schema.json"] {
            match self.fetch_schema(path).await {
                Ok(schema) => return Ok(schema),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "schema fetch failed");
                    failures.push(format!("{path}: {e}"));
                }
            }
        }
        if let Some(file) = local {
            match SchemaDocument::load(file) {
                Ok(schema) => return Ok(schema),
                Err(e) => failures.push(format!("{}: {e}", file.display())),
            }
        }
        Err(ClientError::Schema(failures.join("; ")))
    }

    /// Pre-check a record with the server rules.
    pub async fn validate(&self, record: &Value) -> Result<PreCheck, ClientError> {
        let resp = self
            .client
            .post(join(&self.base_url, "/api/validate")?)
            .json(record)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(PreCheck::Valid),
            StatusCode::BAD_REQUEST => {
                let text = resp.text().await?;
                match serde_json::from_str::<ErrorsBody>(&text) {
                    Ok(body) => Ok(PreCheck::Invalid(body.errors)),
                    Err(_) => Err(ClientError::Status { status: StatusCode::BAD_REQUEST, body: text }),
                }
            }
            status => Err(ClientError::Status { status, body: resp.text().await? }),
        }
    }
}

#[async_trait]
impl SubmissionSink for ApiClient {
    async fn submit(&self, values: &FormValues) -> Result<SubmitReceipt, SubmitError> {
        let url = join(&self.base_url, "/api/submit").map_err(|e| SubmitError::Transport(e.to_string()))?;
        let resp = self
            .client
            .post(url)
            .json(values)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| SubmitError::Transport(e.to_string()))?;

        if status.is_success() {
            #[derive(Deserialize)]
            struct Receipt {
                id: String,
            }
            return serde_json::from_str::<Receipt>(&text)
                .map(|r| SubmitReceipt { id: r.id })
                .map_err(|e| SubmitError::Server(format!("unexpected reply: {e}")));
        }
        if status == StatusCode::BAD_REQUEST {
            if let Ok(body) = serde_json::from_str::<ErrorsBody>(&text) {
                return Err(SubmitError::Rejected(body.errors));
            }
        }
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("{status}"));
        Err(SubmitError::Server(message))
    }
}

/// India Post PIN code directory
pub struct HttpPinDirectory {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpPinDirectory {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Url(base_url.to_string(), e))?;
        Ok(Self { base_url, client: reqwest::Client::new() })
    }
}

#[async_trait]
impl PinDirectory for HttpPinDirectory {
    async fn lookup(&self, pin: &str) -> Result<PinLocation, LookupError> {
        if !is_valid_pin(pin) {
            return Err(LookupError::InvalidPin(pin.to_string()));
        }
        let url = join(&self.base_url, &format!("/pincode/{pin}"))
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LookupError::Transport(e.to_string()))?
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        parse_postal_reply(&body)
    }
}

/// Print-friendly copy of a record's errors, first message per field.
pub fn first_errors(errors: &RecordErrors) -> BTreeMap<String, String> {
    errors
        .iter()
        .filter_map(|(k, v)| v.first().map(|m| (k.clone(), m.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use udyam_forms::{FieldDescriptor, Step};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn schema_json() -> Value {
        let doc = SchemaDocument::new(vec![Step::new(
            "One",
            vec![FieldDescriptor::text("mobile", "Mobile").required()],
        )])
        .unwrap();
        serde_json::to_value(doc).unwrap()
    }

    #[tokio::test]
    async fn test_load_schema_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/schema"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let schema = client.load_schema(None).await.unwrap();
        assert!(schema.field("mobile").is_some());
    }

    #[tokio::test]
    async fn test_load_schema_falls_back_to_static() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/schema"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Schema not found" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/schema.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        assert!(client.load_schema(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_schema_all_sources_fail() {
        let server = MockServer::start().await;
        let client = ApiClient::new(&server.uri()).unwrap();
        let missing = std::env::temp_dir().join("udyam-no-such-schema.json");
        let err = client.load_schema(Some(&missing)).await.unwrap_err();
        assert!(matches!(err, ClientError::Schema(_)));
    }

    #[tokio::test]
    async fn test_submit_outcomes() {
        let server = MockServer::start().await;
        let client = ApiClient::new(&server.uri()).unwrap();
        let values = FormValues::new();

        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "id": "42" })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        assert_eq!(client.submit(&values).await.unwrap(), SubmitReceipt { id: "42".into() });

        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "errors": { "mobile": ["Mobile is required."] } })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        match client.submit(&values).await {
            Err(SubmitError::Rejected(errors)) => assert_eq!(errors["mobile"][0], "Mobile is required."),
            other => panic!("unexpected {other:?}"),
        }

        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Submit failed" })))
            .mount(&server)
            .await;
        assert_eq!(client.submit(&values).await, Err(SubmitError::Server("Submit failed".into())));
    }

    #[tokio::test]
    async fn test_submit_transport_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.submit(&FormValues::new()).await, Err(SubmitError::Transport(_))));
    }

    #[tokio::test]
    async fn test_validate_pre_check() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/validate"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "errors": { "pan": ["PAN format is invalid."] } })),
            )
            .mount(&server)
            .await;
        let client = ApiClient::new(&server.uri()).unwrap();
        match client.validate(&json!({ "pan": "x" })).await.unwrap() {
            PreCheck::Invalid(errors) => {
                assert_eq!(first_errors(&errors)["pan"], "PAN format is invalid.");
            }
            PreCheck::Valid => panic!("expected errors"),
        }
    }

    #[tokio::test]
    async fn test_pin_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pincode/560001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "Message": "Number of pincode(s) found:1",
                "Status": "Success",
                "PostOffice": [{ "Name": "Bangalore G.P.O.", "District": "Bengaluru", "State": "Karnataka" }]
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pincode/000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "Message": "No records found", "Status": "Error", "PostOffice": null
            }])))
            .mount(&server)
            .await;

        let dir = HttpPinDirectory::new(&server.uri()).unwrap();
        let loc = dir.lookup("560001").await.unwrap();
        assert_eq!(loc.district, "Bengaluru");
        assert_eq!(loc.state, "Karnataka");
        assert!(matches!(dir.lookup("000000").await, Err(LookupError::NotFound(_))));
        assert!(matches!(dir.lookup("5600").await, Err(LookupError::InvalidPin(_))));
    }
}
