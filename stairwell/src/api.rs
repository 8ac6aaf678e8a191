use gradus::{LapRecord, PlanError, SessionPlan, TrainingSession};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use rest::RestBackend;
pub use supabase::SupabaseBackend;
pub use token::TokenStore;

pub mod rest;
pub mod supabase;
pub mod token;

/// Login form body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form body
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
}

/// A logged-in user together with their bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Lifetime totals over a user's finished sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_sessions: u64,
    pub total_laps: u64,
    pub total_floors: u64,
    pub total_time_seconds: u64,
    pub sessions_this_week: u64,
}

/// Anything that can go wrong talking to a backend
///
/// Both backends translate their wire-level failures into these variants,
/// so everything above the gateway can react to the kind of failure
/// without knowing which backend produced it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was rejected before or by the server as invalid input
    #[error("{0}")]
    Validation(String),

    /// An active session already exists for this user
    #[error("An active training session already exists")]
    Conflict,

    /// The session is no longer in a state that allows the operation
    #[error("{0}")]
    State(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored token is missing, expired or rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server could not be reached at all
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an unexpected failure status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server answered, but not with the shape we expected
    #[error("Malformed server response: {0}")]
    Decode(String),
}

impl From<PlanError> for ApiError {
    fn from(value: PlanError) -> Self {
        Self::Validation(value.to_string())
    }
}

/// The operations a remote backend has to offer
///
/// Implementations are expected to be cheap to share; every call blocks
/// until the server answers, so they run on worker threads.
pub trait Backend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError>;

    fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError>;

    fn current_user(&self) -> Result<User, ApiError>;

    fn user_stats(&self) -> Result<UserStats, ApiError>;

    /// Create a new active session from a validated plan
    ///
    /// Fails with [`ApiError::Conflict`] if the user already has one.
    fn create_session(&self, plan: SessionPlan) -> Result<TrainingSession, ApiError>;

    /// The user's active session, if any
    fn active_session(&self) -> Result<Option<TrainingSession>, ApiError>;

    /// All finished sessions, newest first
    fn finished_sessions(&self) -> Result<Vec<TrainingSession>, ApiError>;

    fn session(&self, session_id: &str) -> Result<TrainingSession, ApiError>;

    /// Append the next lap to an active session
    fn record_lap(&self, session_id: &str) -> Result<(), ApiError>;

    /// Transition an active session to finished, stamping its end time
    fn finish_session(&self, session_id: &str) -> Result<TrainingSession, ApiError>;

    /// Transition an active session to abandoned, stamping its end time
    fn cancel_session(&self, session_id: &str) -> Result<TrainingSession, ApiError>;

    /// The laps recorded for a session
    fn session_laps(&self, session_id: &str) -> Result<Vec<LapRecord>, ApiError>;
}
