//! Activity submission client (`POST /activities`).

use reqwest::Client;
use serde::Deserialize;

use super::{ApiError, Phase, RawId};
use crate::auth::AccessToken;
use crate::config::ApiConfig;
use crate::models::{ActivityId, ActivityPayload};

#[derive(Debug, Clone)]
pub struct SubmissionClient {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CreatedActivity {
    id: RawId,
}

impl SubmissionClient {
    pub fn new(config: &ApiConfig, client: Client) -> Self {
        Self {
            endpoint: config.endpoint("/activities"),
            client,
        }
    }

    /// Posts the activity and returns the server-assigned id. No retries.
    pub async fn create(
        &self,
        token: &AccessToken,
        payload: &ActivityPayload,
    ) -> Result<ActivityId, ApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|error| ApiError::network(Phase::Submission, &error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::network(Phase::Submission, &error))?;
        if !status.is_success() {
            return Err(ApiError::from_status(Phase::Submission, status, &body));
        }

        serde_json::from_str::<CreatedActivity>(&body)
            .ok()
            .and_then(|created| created.id.into_activity_id())
            .ok_or_else(|| ApiError::Submission {
                status: status.as_u16(),
                body: "response did not include the created activity id".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn payload() -> ActivityPayload {
        ActivityPayload {
            title: "Hackathon".to_string(),
            description: "Organised the campus coding night".to_string(),
            competency_id: "comp-3".to_string(),
            activity_type_id: "type-7".to_string(),
            document_url: "https://files.example.edu/e1.pdf".to_string(),
            recognized_course_id: None,
            event_id: Some("evt-2".to_string()),
        }
    }

    fn client_for(base_url: &str) -> SubmissionClient {
        let config = ApiConfig::new(base_url).unwrap();
        SubmissionClient::new(&config, config.http_client().unwrap())
    }

    fn token() -> AccessToken {
        AccessToken::new("student-token").unwrap()
    }

    #[tokio::test]
    async fn create_posts_json_body_and_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .and(header("authorization", "Bearer student-token"))
            .and(body_json(serde_json::json!({
                "title": "Hackathon",
                "description": "Organised the campus coding night",
                "competencyId": "comp-3",
                "activityTypeId": "type-7",
                "documentUrl": "https://files.example.edu/e1.pdf",
                "recognizedCourseId": null,
                "eventId": "evt-2"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "abc123" })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client_for(&server.uri())
            .create(&token(), &payload())
            .await
            .unwrap();
        assert_eq!(id, ActivityId::new("abc123"));
    }

    #[tokio::test]
    async fn create_accepts_numeric_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 77 })))
            .mount(&server)
            .await;

        let id = client_for(&server.uri())
            .create(&token(), &payload())
            .await
            .unwrap();
        assert_eq!(id.as_str(), "77");
    }

    #[tokio::test]
    async fn create_server_error_is_submission_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "database unavailable" })),
            )
            .mount(&server)
            .await;

        let error = client_for(&server.uri())
            .create(&token(), &payload())
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ApiError::Submission {
                status: 500,
                body: "database unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn create_unauthorized_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = client_for(&server.uri())
            .create(&token(), &payload())
            .await
            .unwrap_err();
        assert!(error.is_auth());
    }
}
