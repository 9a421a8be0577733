//! Activity history client (`GET /activities`).
//!
//! The server's response is normalized once, here, into [`ActivityRecord`].
//! Records that do not match the expected shape fail the request instead of
//! being guessed at.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{ApiError, Phase, RawId};
use crate::auth::AccessToken;
use crate::config::ApiConfig;
use crate::models::{ActivityRecord, ActivityStatus};

/// One history entry exactly as the server sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActivity {
    id: RawId,
    title: String,
    status: String,
    #[serde(default)]
    points: Option<i64>,
    created_at: DateTime<Utc>,
}

/// Maps a raw history entry into the strict internal type.
///
/// `points: null` means nothing has been awarded yet and becomes 0.
pub fn normalize_activity(raw: RawActivity) -> Result<ActivityRecord, String> {
    let id = raw
        .id
        .into_activity_id()
        .ok_or_else(|| "activity id must not be empty".to_string())?;
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(format!("activity {id} has an empty title"));
    }
    let points = match raw.points {
        None => 0,
        Some(points) => u32::try_from(points)
            .map_err(|_| format!("activity {id} has invalid points value {points}"))?,
    };

    Ok(ActivityRecord {
        id,
        title,
        status: ActivityStatus::parse(&raw.status),
        points,
        created_at: raw.created_at,
    })
}

#[derive(Debug, Clone)]
pub struct HistoryClient {
    endpoint: String,
    client: Client,
}

impl HistoryClient {
    pub fn new(config: &ApiConfig, client: Client) -> Self {
        Self {
            endpoint: config.endpoint("/activities"),
            client,
        }
    }

    pub async fn list(&self, token: &AccessToken) -> Result<Vec<ActivityRecord>, ApiError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| ApiError::network(Phase::History, &error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::network(Phase::History, &error))?;
        if !status.is_success() {
            return Err(ApiError::from_status(Phase::History, status, &body));
        }

        let invalid = |message: String| ApiError::History {
            status: status.as_u16(),
            body: message,
        };
        let raw = serde_json::from_str::<Vec<RawActivity>>(&body)
            .map_err(|error| invalid(format!("unexpected history shape: {error}")))?;
        raw.into_iter()
            .map(|entry| normalize_activity(entry).map_err(&invalid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::ActivityId;

    fn raw(points: Option<i64>) -> RawActivity {
        serde_json::from_value(serde_json::json!({
            "id": 12,
            "title": " Blood drive ",
            "status": "approved",
            "points": points,
            "createdAt": "2026-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn normalize_maps_fields() {
        let record = normalize_activity(raw(Some(15))).unwrap();
        assert_eq!(record.id, ActivityId::new("12"));
        assert_eq!(record.title, "Blood drive");
        assert_eq!(record.status, ActivityStatus::Approved);
        assert_eq!(record.points, 15);
    }

    #[test]
    fn normalize_treats_null_points_as_zero() {
        assert_eq!(normalize_activity(raw(None)).unwrap().points, 0);
    }

    #[test]
    fn normalize_rejects_negative_points() {
        let error = normalize_activity(raw(Some(-4))).unwrap_err();
        assert!(error.contains("-4"));
    }

    #[tokio::test]
    async fn list_normalizes_server_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/activities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "a1",
                    "title": "Debate club",
                    "status": "pending",
                    "points": null,
                    "createdAt": "2026-02-10T08:30:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let config = ApiConfig::new(server.uri()).unwrap();
        let client = HistoryClient::new(&config, config.http_client().unwrap());
        let records = client
            .list(&AccessToken::new("t").unwrap())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ActivityStatus::Pending);
        assert_eq!(records[0].points, 0);
    }

    #[tokio::test]
    async fn list_rejects_unexpected_shapes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/activities"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let config = ApiConfig::new(server.uri()).unwrap();
        let client = HistoryClient::new(&config, config.http_client().unwrap());
        let error = client
            .list(&AccessToken::new("t").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::History { status: 200, .. }));
    }
}
