use chrono::{DateTime, Utc};
use gradus::{LapRecord, SessionPlan, TrainingSession};
use serde::Deserialize;
use serde_json::{Value, json};
use ureq::Agent;

use super::{
    ApiError, AuthSession, Backend, Credentials, Registration, TokenStore, User, UserStats,
};

/// All routes live under this prefix
const API_PREFIX: &str = "/api/v1";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Gateway to the dedicated Stairwell REST server
///
/// The server speaks JSON on every route and authenticates through a
/// bearer token, which this gateway reads from (and clears in) its
/// [`TokenStore`].
pub struct RestBackend {
    agent: Agent,
    base_url: String,
    tokens: TokenStore,
}

/// One row of the server's lap statistics view
///
/// The view spells its columns with a `lap_` prefix; accept both
/// spellings so a plain lap row decodes too.
#[derive(Debug, Deserialize)]
struct LapStatRow {
    #[serde(alias = "lap_id")]
    id: String,
    session_id: String,
    lap_number: u32,
    #[serde(alias = "lap_finish_time")]
    finish_time: DateTime<Utc>,
}

impl From<LapStatRow> for LapRecord {
    fn from(row: LapStatRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            lap_number: row.lap_number,
            finish_time: row.finish_time,
        }
    }
}

impl RestBackend {
    pub fn new(base_url: &str, tokens: TokenStore) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Send one request and hand back the response body as JSON
    ///
    /// A `401` on an authenticated route means the stored token is dead;
    /// it is cleared here so the caller falls back to the login page.
    fn request(
        &self,
        method: &str,
        endpoint: &str,
        body: Option<Value>,
        auth: bool,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, endpoint);

        let mut request = self
            .agent
            .request(method, &url)
            .set("Content-Type", "application/json");

        if auth && let Some(token) = self.tokens.get() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match result {
            Ok(response) => parse_body(response),
            Err(ureq::Error::Status(status, response)) => {
                let message = extract_message(parse_body(response).ok().as_ref(), status);

                if status == 401 && auth {
                    self.tokens.clear();
                }

                Err(from_status(status, message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ApiError::Network(transport.to_string()))
            }
        }
    }

    fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request("GET", endpoint, None, true)
    }

    fn post(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.request("POST", endpoint, Some(body), true)
    }
}

impl Backend for RestBackend {
    fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let body = serde_json::to_value(credentials)
            .map_err(|error| ApiError::Decode(error.to_string()))?;
        let value = self.request("POST", "/login", Some(body), false)?;
        decode_auth(value)
    }

    fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        let body = serde_json::to_value(registration)
            .map_err(|error| ApiError::Decode(error.to_string()))?;
        let value = self.request("POST", "/register", Some(body), false)?;
        decode_auth(value)
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.get("/me").and_then(decode)
    }

    fn user_stats(&self) -> Result<UserStats, ApiError> {
        self.get("/me/stats").and_then(decode)
    }

    fn create_session(&self, plan: SessionPlan) -> Result<TrainingSession, ApiError> {
        let body =
            serde_json::to_value(plan).map_err(|error| ApiError::Decode(error.to_string()))?;
        self.post("/sessions/", body).and_then(decode)
    }

    fn active_session(&self) -> Result<Option<TrainingSession>, ApiError> {
        match self.get("/sessions/active") {
            Ok(Value::Null) => Ok(None),
            Ok(value) => decode(value).map(Some),
            // No active session is a normal answer, not a failure
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn finished_sessions(&self) -> Result<Vec<TrainingSession>, ApiError> {
        self.get("/sessions/finished").and_then(decode)
    }

    fn session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.get(&format!("/sessions/{session_id}")).and_then(decode)
    }

    fn record_lap(&self, session_id: &str) -> Result<(), ApiError> {
        self.post("/sessions/record", json!({ "session_id": session_id }))
            .map_err(conflict_to_state)
            .map(|_| ())
    }

    fn finish_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.post("/sessions/finish", json!({ "session_id": session_id }))
            .map_err(conflict_to_state)
            .and_then(decode)
    }

    fn cancel_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.post("/sessions/cancel", json!({ "session_id": session_id }))
            .map_err(conflict_to_state)
            .and_then(decode)
    }

    fn session_laps(&self, session_id: &str) -> Result<Vec<LapRecord>, ApiError> {
        let rows: Vec<LapStatRow> = self.get(&format!("/lap/stats/{session_id}")).and_then(decode)?;
        Ok(rows.into_iter().map(LapRecord::from).collect())
    }
}

fn parse_body(response: ureq::Response) -> Result<Value, ApiError> {
    let text = response
        .into_string()
        .map_err(|error| ApiError::Network(error.to_string()))?;

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|error| ApiError::Decode(error.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|error| ApiError::Decode(error.to_string()))
}

/// `/login` and `/register` answer with the token next to the user
fn decode_auth(value: Value) -> Result<AuthSession, ApiError> {
    let token = value
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Decode("response carried no token".to_string()))?
        .to_string();
    let user = decode(
        value
            .get("user")
            .cloned()
            .ok_or_else(|| ApiError::Decode("response carried no user".to_string()))?,
    )?;

    Ok(AuthSession { token, user })
}

/// Dig the human-readable message out of an error body
fn extract_message(body: Option<&Value>, status: u16) -> String {
    body.and_then(|value| {
        value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
    .unwrap_or_else(|| format!("HTTP {status}"))
}

fn from_status(status: u16, message: String) -> ApiError {
    match status {
        400 | 422 => ApiError::Validation(message),
        401 => ApiError::Auth(message),
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict,
        _ => ApiError::Server { status, message },
    }
}

/// On lap and transition routes a `409` means the session left the
/// active state, not that another one exists
fn conflict_to_state(error: ApiError) -> ApiError {
    match error {
        ApiError::Conflict => {
            ApiError::State("The session is no longer active".to_string())
        }
        other => other,
    }
}
