//! ChatBetApiClient -- [`SportsDataClient`] over the ChatBet sports HTTP API.
//!
//! Obtains an API token lazily from `POST /auth/generate_token` and sends it
//! in the `token` header of every request. A rejected token is dropped and
//! the request retried once with a fresh one.

use std::time::Duration;

use chatbet_core::data::client::SportsDataClient;
use chatbet_types::config::DataApiConfig;
use chatbet_types::error::DataError;
use chatbet_types::sports::{DataRecords, DataRequest, ResourceKind};
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::wire::{TokenResponse, fixtures_from_value, odds_from_value, tournaments_from_value};

pub struct ChatBetApiClient {
    http: reqwest::Client,
    base_url: String,
    sport_id: u32,
    language: String,
    time_zone: String,
    token: Mutex<Option<String>>,
}

impl ChatBetApiClient {
    pub fn new(config: &DataApiConfig, timeout: Duration) -> Result<Self, DataError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sport_id: config.sport_id,
            language: config.language.clone(),
            time_zone: config.time_zone.clone(),
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query string for a resource request.
    fn query(&self, request: &DataRequest) -> Vec<(&'static str, String)> {
        let sport_id = request.filters.sport_id.unwrap_or(self.sport_id).to_string();
        match request.kind {
            ResourceKind::Tournaments => vec![("language", self.language.clone())],
            ResourceKind::Fixtures => vec![
                ("sportId", sport_id),
                ("type", "pre_match".to_string()),
                ("time_zone", self.time_zone.clone()),
                ("language", self.language.clone()),
            ],
            ResourceKind::Odds => vec![
                ("sportId", sport_id),
                (
                    "tournamentId",
                    request.filters.tournament_id.clone().unwrap_or_default(),
                ),
                (
                    "fixtureId",
                    request.filters.fixture_id.clone().unwrap_or_default(),
                ),
                ("amount", "1".to_string()),
            ],
        }
    }

    fn path(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Tournaments => "/sports/all-tournaments",
            ResourceKind::Fixtures => "/sports/sports-fixtures",
            ResourceKind::Odds => "/sports/odds",
        }
    }

    async fn token(&self) -> Result<String, DataError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .http
            .post(self.url("/auth/generate_token"))
            .send()
            .await
            .map_err(|e| DataError::Upstream(format!("token request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Upstream(format!("token request returned HTTP {status}")));
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| DataError::Upstream(format!("unexpected token response: {e}")))?;
        info!("obtained ChatBet API token");
        *slot = Some(body.token.clone());
        Ok(body.token)
    }

    async fn get_json(&self, request: &DataRequest) -> Result<Value, DataError> {
        let path = Self::path(request.kind);
        let query = self.query(request);

        for attempt in 0..2 {
            let token = self.token().await?;
            let response = self
                .http
                .get(self.url(path))
                .header("token", token)
                .query(&query)
                .send()
                .await
                .map_err(|e| DataError::Upstream(format!("GET {path} failed: {e}")))?;

            let status = response.status();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) && attempt == 0 {
                debug!(path, %status, "token rejected, requesting a new one");
                *self.token.lock().await = None;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DataError::Upstream(format!("GET {path} returned HTTP {status}: {body}")));
            }
            return response
                .json()
                .await
                .map_err(|e| DataError::Upstream(format!("GET {path} returned invalid JSON: {e}")));
        }
        Err(DataError::Upstream(format!("GET {path} rejected the API token")))
    }
}

impl SportsDataClient for ChatBetApiClient {
    fn name(&self) -> &str {
        "chatbet"
    }

    async fn fetch(&self, request: &DataRequest) -> Result<DataRecords, DataError> {
        let body = self.get_json(request).await?;
        let sport_id = request.filters.sport_id.unwrap_or(self.sport_id);
        match request.kind {
            ResourceKind::Tournaments => Ok(DataRecords::Tournaments(tournaments_from_value(body, sport_id))),
            ResourceKind::Fixtures => fixtures_from_value(body, sport_id)
                .map(DataRecords::Fixtures)
                .map_err(DataError::Upstream),
            ResourceKind::Odds => {
                let fixture_id = request.filters.fixture_id.clone().unwrap_or_default();
                odds_from_value(body, &fixture_id, Utc::now())
                    .map(DataRecords::Odds)
                    .map_err(DataError::Upstream)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use chatbet_types::sports::{Fixture, FixtureStatus};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> ChatBetApiClient {
        let config = DataApiConfig {
            base_url,
            ..Default::default()
        };
        ChatBetApiClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn odds_query_carries_fixture_filters() {
        let c = client("http://localhost".to_string());
        let fixture = Fixture {
            id: "27907678".to_string(),
            home_team: "A".to_string(),
            away_team: "B".to_string(),
            tournament_id: "566".to_string(),
            tournament_name: None,
            sport_id: 1,
            kickoff_time: Utc::now(),
            status: FixtureStatus::Scheduled,
        };
        let query = c.query(&DataRequest::odds(&fixture));
        assert!(query.contains(&("fixtureId", "27907678".to_string())));
        assert!(query.contains(&("tournamentId", "566".to_string())));
        assert!(query.contains(&("amount", "1".to_string())));
    }

    #[tokio::test]
    async fn fetches_fixtures_with_token_header() {
        let token_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&token_calls);
        let router = Router::new()
            .route(
                "/auth/generate_token",
                post(move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        axum::Json(json!({"token": "t-123"}))
                    }
                }),
            )
            .route(
                "/sports/sports-fixtures",
                get(|headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    if headers.get("token").and_then(|v| v.to_str().ok()) != Some("t-123")
                        || params.get("type").map(String::as_str) != Some("pre_match")
                    {
                        return (axum::http::StatusCode::UNAUTHORIZED, axum::Json(json!({}))).into_response();
                    }
                    axum::Json(json!([{
                        "id": 1,
                        "startTime": "2026-10-24T15:00:00Z",
                        "homeCompetitor": {"name": "Liverpool"},
                        "awayCompetitor": {"name": "Chelsea"},
                        "tournament": {"id": 566, "name": "Premier League"}
                    }]))
                    .into_response()
                }),
            );
        let c = client(serve(router).await);

        let first = c.fetch(&DataRequest::fixtures(1)).await.unwrap();
        let second = c.fetch(&DataRequest::fixtures(1)).await.unwrap();

        let DataRecords::Fixtures(fixtures) = first else {
            panic!("expected fixtures");
        };
        assert_eq!(fixtures[0].home_team, "Liverpool");
        assert_eq!(second.len(), 1);
        assert_eq!(token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_upstream_errors() {
        let router = Router::new()
            .route("/auth/generate_token", post(|| async { axum::Json(json!({"token": "t"})) }))
            .route(
                "/sports/odds",
                get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "bad gateway") }),
            );
        let c = client(serve(router).await);
        let fixture_request = DataRequest {
            kind: ResourceKind::Odds,
            filters: Default::default(),
        };
        let err = c.fetch(&fixture_request).await.unwrap_err();
        assert!(matches!(err, DataError::Upstream(ref m) if m.contains("502")));
    }
}
