//! Evidence upload client (`POST /upload`, multipart).

use reqwest::{multipart, Client, Request};
use serde::Deserialize;

use super::{ApiError, Phase};
use crate::auth::AccessToken;
use crate::config::ApiConfig;
use crate::evidence::Evidence;

#[derive(Debug, Clone)]
pub struct UploadClient {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
}

impl UploadClient {
    pub fn new(config: &ApiConfig, client: Client) -> Self {
        Self {
            endpoint: config.endpoint("/upload"),
            client,
        }
    }

    /// Uploads the evidence file and returns its reference URL.
    ///
    /// Input is assumed to have passed `validate_evidence`. Failures are
    /// returned immediately; nothing is retried here.
    pub async fn upload(&self, token: &AccessToken, evidence: &Evidence) -> Result<String, ApiError> {
        let request = self.build_upload_request(token, evidence)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| ApiError::network(Phase::Upload, &error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::network(Phase::Upload, &error))?;
        if !status.is_success() {
            return Err(ApiError::from_status(Phase::Upload, status, &body));
        }

        let url = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|payload| payload.url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Upload {
                status: status.as_u16(),
                body: "response did not include an evidence url".to_string(),
            })?;

        tracing::debug!("Evidence {} uploaded", evidence.file.file_name);
        Ok(url)
    }

    fn build_upload_request(
        &self,
        token: &AccessToken,
        evidence: &Evidence,
    ) -> Result<Request, ApiError> {
        let file_part = multipart::Part::bytes(evidence.bytes.clone())
            .file_name(evidence.file.file_name.clone())
            .mime_str(&evidence.file.mime_type)
            .map_err(|error| ApiError::Validation(format!("invalid evidence type: {error}")))?;
        let form = multipart::Form::new().part("file", file_part);

        self.client
            .post(&self.endpoint)
            .bearer_auth(token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .build()
            .map_err(|error| ApiError::network(Phase::Upload, &error))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::EvidenceFile;

    fn evidence() -> Evidence {
        Evidence {
            file: EvidenceFile {
                path: PathBuf::from("/tmp/certificate.pdf"),
                file_name: "certificate.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size_bytes: 4,
            },
            bytes: b"%PDF".to_vec(),
        }
    }

    fn client_for(base_url: &str) -> UploadClient {
        let config = ApiConfig::new(base_url).unwrap();
        UploadClient::new(&config, config.http_client().unwrap())
    }

    fn token() -> AccessToken {
        AccessToken::new("student-token").unwrap()
    }

    #[test]
    fn upload_request_shape_is_correct() {
        let client = client_for("https://points.example.edu/api");
        let request = client.build_upload_request(&token(), &evidence()).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://points.example.edu/api/upload"
        );
        let auth = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(auth, "Bearer student-token");
        let content_type = request
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn upload_returns_url_from_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("authorization", "Bearer student-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "url": "https://files.example.edu/e1.pdf" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = client_for(&server.uri())
            .upload(&token(), &evidence())
            .await
            .unwrap();
        assert_eq!(url, "https://files.example.edu/e1.pdf");
    }

    #[tokio::test]
    async fn upload_rejection_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(413).set_body_string("file too large"))
            .mount(&server)
            .await;

        let error = client_for(&server.uri())
            .upload(&token(), &evidence())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ApiError::Upload {
                status: 413,
                body: "file too large".to_string()
            }
        );
    }

    #[tokio::test]
    async fn upload_success_without_url_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let error = client_for(&server.uri())
            .upload(&token(), &evidence())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Upload { status: 200, .. }));
    }

    #[tokio::test]
    async fn upload_unauthorized_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = client_for(&server.uri())
            .upload(&token(), &evidence())
            .await
            .unwrap_err();
        assert_eq!(error, ApiError::Auth { phase: Phase::Upload });
    }

    #[tokio::test]
    async fn upload_to_unreachable_host_is_network_failure() {
        let client = client_for("http://127.0.0.1:9");
        let error = client.upload(&token(), &evidence()).await.unwrap_err();
        assert!(matches!(
            error,
            ApiError::Network {
                phase: Phase::Upload,
                ..
            }
        ));
    }
}
