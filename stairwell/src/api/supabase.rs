use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use gradus::{LapRecord, SessionPlan, TrainingSession};
use serde::Deserialize;
use serde_json::{Value, json};
use ureq::Agent;

use super::{
    ApiError, AuthSession, Backend, Credentials, Registration, TokenStore, User, UserStats,
};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Gateway to a hosted Supabase project
///
/// Auth goes through GoTrue (`/auth/v1`), data through PostgREST
/// (`/rest/v1`) against the `training_sessions` and `lap_records` tables
/// plus the `lap_stats_view` view. Every request carries the project's
/// `apikey`; authenticated ones add the user's bearer token on top.
pub struct SupabaseBackend {
    agent: Agent,
    base_url: String,
    anon_key: String,
    tokens: TokenStore,
    /// Cached id of the logged-in user, for row filters
    user_id: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    user_metadata: GoTrueMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoTrueMetadata {
    username: Option<String>,
}

impl GoTrueUser {
    /// GoTrue keeps the username in free-form metadata; fall back to the
    /// mailbox name when it was never set
    fn into_user(self) -> User {
        let username = self
            .user_metadata
            .username
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or_default().to_string());

        User {
            id: self.id,
            email: self.email,
            username,
        }
    }
}

/// One row of `lap_stats_view`
#[derive(Debug, Deserialize)]
struct LapViewRow {
    lap_id: String,
    session_id: String,
    lap_number: u32,
    lap_finish_time: DateTime<Utc>,
}

impl From<LapViewRow> for LapRecord {
    fn from(row: LapViewRow) -> Self {
        Self {
            id: row.lap_id,
            session_id: row.session_id,
            lap_number: row.lap_number,
            finish_time: row.lap_finish_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionIdRow {
    session_id: String,
}

impl SupabaseBackend {
    pub fn new(base_url: &str, anon_key: &str, tokens: TokenStore) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            tokens,
            user_id: RwLock::new(None),
        }
    }

    fn remember_user(&self, user: &GoTrueUser) {
        if let Ok(mut slot) = self.user_id.write() {
            *slot = Some(user.id.clone());
        }
    }

    /// The logged-in user's id, fetching the profile once if needed
    fn require_user_id(&self) -> Result<String, ApiError> {
        if let Ok(slot) = self.user_id.read()
            && let Some(id) = slot.as_ref()
        {
            return Ok(id.clone());
        }

        Ok(self.current_user()?.id)
    }

    /// POST against GoTrue; only the `apikey` header, never the bearer
    fn auth_request(&self, path_and_query: &str, body: Value) -> Result<Value, ApiError> {
        let url = format!("{}/auth/v1{}", self.base_url, path_and_query);
        let result = self
            .agent
            .post(&url)
            .set("apikey", &self.anon_key)
            .set("Content-Type", "application/json")
            .send_json(body);

        match result {
            Ok(response) => parse_body(response),
            Err(ureq::Error::Status(status, response)) => {
                let message = gotrue_message(parse_body(response).ok().as_ref(), status);
                Err(ApiError::Auth(message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ApiError::Network(transport.to_string()))
            }
        }
    }

    /// Send one PostgREST request and hand back the body as JSON
    fn table_request(
        &self,
        method: &str,
        path_and_query: &str,
        body: Option<Value>,
        prefer: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/rest/v1{}", self.base_url, path_and_query);

        let mut request = self
            .agent
            .request(method, &url)
            .set("apikey", &self.anon_key)
            .set("Content-Type", "application/json");

        if let Some(token) = self.tokens.get() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        if let Some(prefer) = prefer {
            request = request.set("Prefer", prefer);
        }

        let result = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match result {
            Ok(response) => parse_body(response),
            Err(ureq::Error::Status(status, response)) => {
                let message = postgrest_message(parse_body(response).ok().as_ref(), status);

                if status == 401 {
                    self.tokens.clear();
                }

                Err(match status {
                    401 | 403 => ApiError::Auth(message),
                    404 => ApiError::NotFound(message),
                    // The partial unique index on active sessions answers
                    // duplicate inserts with a conflict
                    409 => ApiError::Conflict,
                    _ => ApiError::Server { status, message },
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ApiError::Network(transport.to_string()))
            }
        }
    }

    fn table_get<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, ApiError> {
        let value = self.table_request("GET", path_and_query, None, None)?;
        decode(value)
    }

    /// Flip an active session into a terminal status
    ///
    /// The update filters on `status=eq.active`, so a session that already
    /// left the active state matches nothing and comes back empty.
    fn transition(&self, session_id: &str, status: &str) -> Result<TrainingSession, ApiError> {
        let value = self.table_request(
            "PATCH",
            &format!("/training_sessions?id=eq.{session_id}&status=eq.active"),
            Some(json!({ "status": status, "end_time": Utc::now() })),
            Some("return=representation"),
        )?;

        let mut rows: Vec<TrainingSession> = decode(value)?;

        match rows.pop() {
            Some(session) => Ok(session),
            // Nothing matched: tell a missing session apart from a
            // terminal one
            None => match self.session(session_id) {
                Ok(_) => Err(ApiError::State(
                    "The session is no longer active".to_string(),
                )),
                Err(error) => Err(error),
            },
        }
    }
}

impl Backend for SupabaseBackend {
    fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let value = self.auth_request(
            "/token?grant_type=password",
            json!({ "email": credentials.email, "password": credentials.password }),
        )?;
        let session: GoTrueSession = decode(value)?;

        self.remember_user(&session.user);

        Ok(AuthSession {
            token: session.access_token,
            user: session.user.into_user(),
        })
    }

    fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        let value = self.auth_request(
            "/signup",
            json!({
                "email": registration.email,
                "password": registration.password,
                "data": { "username": registration.username },
            }),
        )?;
        let session: GoTrueSession = decode(value)?;

        self.remember_user(&session.user);

        Ok(AuthSession {
            token: session.access_token,
            user: session.user.into_user(),
        })
    }

    fn current_user(&self) -> Result<User, ApiError> {
        let token = self
            .tokens
            .get()
            .ok_or_else(|| ApiError::Auth("Not logged in".to_string()))?;

        let url = format!("{}/auth/v1/user", self.base_url);
        let result = self
            .agent
            .get(&url)
            .set("apikey", &self.anon_key)
            .set("Authorization", &format!("Bearer {token}"))
            .call();

        match result {
            Ok(response) => {
                let user: GoTrueUser = decode(parse_body(response)?)?;
                self.remember_user(&user);
                Ok(user.into_user())
            }
            Err(ureq::Error::Status(status, response)) => {
                let message = gotrue_message(parse_body(response).ok().as_ref(), status);

                if status == 401 {
                    self.tokens.clear();
                }

                Err(ApiError::Auth(message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ApiError::Network(transport.to_string()))
            }
        }
    }

    fn user_stats(&self) -> Result<UserStats, ApiError> {
        // No stats endpoint on the hosted side; derive from the rows
        let sessions = self.finished_sessions()?;

        let lap_counts = if sessions.is_empty() {
            HashMap::new()
        } else {
            let ids = sessions
                .iter()
                .map(|session| session.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let rows: Vec<SessionIdRow> = self.table_get(&format!(
                "/lap_stats_view?select=session_id&session_id=in.({ids})"
            ))?;
            count_laps(rows)
        };

        Ok(stats_from_sessions(&sessions, &lap_counts, Utc::now()))
    }

    fn create_session(&self, plan: SessionPlan) -> Result<TrainingSession, ApiError> {
        let user_id = self.require_user_id()?;
        let value = self.table_request(
            "POST",
            "/training_sessions",
            Some(json!({
                "user_id": user_id,
                "floors_per_lap": plan.floors_per_lap(),
                "target_floors": plan.target_floors(),
            })),
            Some("return=representation"),
        )?;

        let mut rows: Vec<TrainingSession> = decode(value)?;
        rows.pop()
            .ok_or_else(|| ApiError::Decode("insert returned no row".to_string()))
    }

    fn active_session(&self) -> Result<Option<TrainingSession>, ApiError> {
        let user_id = self.require_user_id()?;
        let mut rows: Vec<TrainingSession> = self.table_get(&format!(
            "/training_sessions?user_id=eq.{user_id}&status=eq.active&limit=1"
        ))?;
        Ok(rows.pop())
    }

    fn finished_sessions(&self) -> Result<Vec<TrainingSession>, ApiError> {
        let user_id = self.require_user_id()?;
        self.table_get(&format!(
            "/training_sessions?user_id=eq.{user_id}&status=eq.finished&order=created_at.desc"
        ))
    }

    fn session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        let mut rows: Vec<TrainingSession> =
            self.table_get(&format!("/training_sessions?id=eq.{session_id}&limit=1"))?;
        rows.pop()
            .ok_or_else(|| ApiError::NotFound(format!("session {session_id}")))
    }

    fn record_lap(&self, session_id: &str) -> Result<(), ApiError> {
        // PostgREST has no transition guard on the event table; check the
        // session state first
        let session = self.session(session_id)?;
        if !session.is_active() {
            return Err(ApiError::State(
                "The session is no longer active".to_string(),
            ));
        }

        self.table_request(
            "POST",
            "/lap_records",
            Some(json!({ "session_id": session_id })),
            None,
        )?;

        Ok(())
    }

    fn finish_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.transition(session_id, "finished")
    }

    fn cancel_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.transition(session_id, "abandoned")
    }

    fn session_laps(&self, session_id: &str) -> Result<Vec<LapRecord>, ApiError> {
        let rows: Vec<LapViewRow> = self.table_get(&format!(
            "/lap_stats_view?session_id=eq.{session_id}&order=lap_number.asc"
        ))?;
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

/// GoTrue spells its error message differently per endpoint
fn gotrue_message(body: Option<&Value>, status: u16) -> String {
    body.and_then(|value| {
        value
            .get("error_description")
            .or_else(|| value.get("msg"))
            .or_else(|| value.get("message"))
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
    .unwrap_or_else(|| format!("HTTP {status}"))
}

fn postgrest_message(body: Option<&Value>, status: u16) -> String {
    body.and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("details"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
    .unwrap_or_else(|| format!("HTTP {status}"))
}

fn count_laps(rows: Vec<SessionIdRow>) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.session_id).or_insert(0) += 1;
    }
    counts
}

/// Fold finished sessions and their lap counts into profile totals
fn stats_from_sessions(
    sessions: &[TrainingSession],
    lap_counts: &HashMap<String, u64>,
    now: DateTime<Utc>,
) -> UserStats {
    let week_ago = now - Duration::days(7);

    let mut stats = UserStats {
        total_sessions: sessions.len() as u64,
        ..UserStats::default()
    };

    for session in sessions {
        let laps = lap_counts.get(&session.id).copied().unwrap_or(0);
        stats.total_laps += laps;
        stats.total_floors += laps * u64::from(session.floors_per_lap);
        stats.total_time_seconds += session.elapsed_seconds(now);

        if session.created_at >= week_ago {
            stats.sessions_this_week += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradus::SessionStatus;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn finished_session(id: &str, start: i64, end: i64, floors_per_lap: u32) -> TrainingSession {
        TrainingSession {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            start_time: at(start),
            end_time: Some(at(end)),
            floors_per_lap,
            target_floors: 100,
            status: SessionStatus::Finished,
            created_at: at(start),
        }
    }

    #[test]
    fn test_gotrue_message_precedence() {
        let body = json!({ "error_description": "Invalid login credentials", "msg": "x" });
        assert_eq!(
            gotrue_message(Some(&body), 400),
            "Invalid login credentials"
        );

        let body = json!({ "msg": "Password should be at least 6 characters" });
        assert_eq!(
            gotrue_message(Some(&body), 422),
            "Password should be at least 6 characters"
        );

        assert_eq!(gotrue_message(None, 500), "HTTP 500");
    }

    #[test]
    fn test_username_falls_back_to_mailbox_name() {
        let user = GoTrueUser {
            id: "u-1".to_string(),
            email: "climber@example.com".to_string(),
            user_metadata: GoTrueMetadata { username: None },
        };
        assert_eq!(user.into_user().username, "climber");

        let user = GoTrueUser {
            id: "u-1".to_string(),
            email: "climber@example.com".to_string(),
            user_metadata: GoTrueMetadata {
                username: Some("stairmaster".to_string()),
            },
        };
        assert_eq!(user.into_user().username, "stairmaster");
    }

    #[test]
    fn test_stats_derivation() {
        // Two finished sessions: 600s with 3 laps of 10 floors,
        // 300s with 2 laps of 5 floors
        let sessions = vec![
            finished_session("s-1", 0, 600, 10),
            finished_session("s-2", 1_000, 1_300, 5),
        ];
        let lap_counts = HashMap::from([("s-1".to_string(), 3), ("s-2".to_string(), 2)]);

        let now = at(2_000);
        let stats = stats_from_sessions(&sessions, &lap_counts, now);

        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_laps, 5);
        assert_eq!(stats.total_floors, 40); // 3*10 + 2*5
        assert_eq!(stats.total_time_seconds, 900); // 600 + 300
        assert_eq!(stats.sessions_this_week, 2);
    }

    #[test]
    fn test_stats_week_window() {
        let now = at(10_000_000);
        let recent_start = 10_000_000 - 86_400; // one day ago
        let old_start = 10_000_000 - 8 * 86_400; // eight days ago

        let sessions = vec![
            finished_session("new", recent_start, recent_start + 60, 10),
            finished_session("old", old_start, old_start + 60, 10),
        ];

        let stats = stats_from_sessions(&sessions, &HashMap::new(), now);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.sessions_this_week, 1);
        // Without lap rows the floor totals stay zero
        assert_eq!(stats.total_floors, 0);
    }

    #[test]
    fn test_lap_view_row_mapping() {
        let value = json!({
            "lap_id": "l-1",
            "session_id": "s-1",
            "lap_number": 2,
            "lap_finish_time": "2026-08-20T10:15:30Z",
            "lap_time_seconds": 41
        });
        let row: LapViewRow = serde_json::from_value(value).unwrap();
        let record = LapRecord::from(row);
        assert_eq!(record.id, "l-1");
        assert_eq!(record.session_id, "s-1");
        assert_eq!(record.lap_number, 2);
    }
}
