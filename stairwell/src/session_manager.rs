use std::sync::Arc;

use gradus::{LapLedger, SessionPlan, TrainingSession};

use crate::api::{
    ApiError, Backend, Credentials, Registration, TokenStore, User, UserStats,
};

/// The one layer pages talk to
///
/// Wraps the configured backend and the token store. Clones share both,
/// so a clone can be moved onto a worker thread.
#[derive(Clone)]
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    tokens: TokenStore,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, tokens: TokenStore) -> Self {
        Self { backend, tokens }
    }

    /// Authenticate and keep the returned token
    pub fn login(&self, email: String, password: String) -> Result<User, ApiError> {
        let auth = self.backend.login(&Credentials { email, password })?;
        self.tokens.set(auth.token);
        Ok(auth.user)
    }

    /// Create an account and keep the returned token
    pub fn register(
        &self,
        email: String,
        password: String,
        username: String,
    ) -> Result<User, ApiError> {
        let auth = self.backend.register(&Registration {
            email,
            password,
            username,
        })?;
        self.tokens.set(auth.token);
        Ok(auth.user)
    }

    /// Forget the token; the server is not involved
    pub fn logout(&self) {
        self.tokens.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    pub fn current_user(&self) -> Result<User, ApiError> {
        self.backend.current_user()
    }

    pub fn user_stats(&self) -> Result<UserStats, ApiError> {
        self.backend.user_stats()
    }

    /// Create a session, or adopt the one that already exists
    ///
    /// A conflict means another launch (or a lost response) already
    /// created an active session; fetching and returning it turns the
    /// retry into a no-op.
    pub fn create_session(&self, plan: SessionPlan) -> Result<TrainingSession, ApiError> {
        match self.backend.create_session(plan) {
            Err(ApiError::Conflict) => match self.backend.active_session()? {
                Some(existing) => Ok(existing),
                None => Err(ApiError::Conflict),
            },
            other => other,
        }
    }

    pub fn active_session(&self) -> Result<Option<TrainingSession>, ApiError> {
        match self.backend.active_session() {
            // A binding may answer "no active session" as a miss
            Err(ApiError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    pub fn finished_sessions(&self) -> Result<Vec<TrainingSession>, ApiError> {
        self.backend.finished_sessions()
    }

    pub fn session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.backend.session(session_id)
    }

    pub fn record_lap(&self, session_id: &str) -> Result<(), ApiError> {
        self.backend.record_lap(session_id)
    }

    pub fn finish_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.backend.finish_session(session_id)
    }

    pub fn cancel_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
        self.backend.cancel_session(session_id)
    }

    /// The laps of a session as a ledger, ready for statistics
    pub fn laps(&self, session_id: &str) -> Result<LapLedger, ApiError> {
        Ok(LapLedger::new(self.backend.session_laps(session_id)?))
    }
}

/// Floors-per-lap values worth offering on the setup form
///
/// Looks at the 50 most recent sessions and keeps the distinct positive
/// values, smallest first, at most five of them.
pub fn plan_suggestions(sessions: &[TrainingSession]) -> Vec<u32> {
    let mut values: Vec<u32> = sessions
        .iter()
        .take(50)
        .map(|session| session.floors_per_lap)
        .filter(|&floors| floors > 0)
        .collect();

    values.sort_unstable();
    values.dedup();
    values.truncate(5);
    values
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{DateTime, Utc};
    use gradus::{LapRecord, SessionStatus};

    use super::*;
    use crate::api::AuthSession;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn session(id: &str, floors_per_lap: u32) -> TrainingSession {
        TrainingSession {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            start_time: at(0),
            end_time: None,
            floors_per_lap,
            target_floors: 100,
            status: SessionStatus::Active,
            created_at: at(0),
        }
    }

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: "climber@example.com".to_string(),
            username: "climber".to_string(),
        }
    }

    #[derive(Default)]
    struct MockBackend {
        create_conflicts: AtomicBool,
        active: Mutex<Option<TrainingSession>>,
        laps: Mutex<Vec<LapRecord>>,
    }

    impl Backend for MockBackend {
        fn login(&self, _credentials: &Credentials) -> Result<AuthSession, ApiError> {
            Ok(AuthSession {
                token: "mock-token".to_string(),
                user: user(),
            })
        }

        fn register(&self, _registration: &Registration) -> Result<AuthSession, ApiError> {
            Ok(AuthSession {
                token: "mock-token".to_string(),
                user: user(),
            })
        }

        fn current_user(&self) -> Result<User, ApiError> {
            Ok(user())
        }

        fn user_stats(&self) -> Result<UserStats, ApiError> {
            Ok(UserStats::default())
        }

        fn create_session(&self, plan: SessionPlan) -> Result<TrainingSession, ApiError> {
            if self.create_conflicts.load(Ordering::SeqCst) {
                return Err(ApiError::Conflict);
            }
            Ok(session("fresh", plan.floors_per_lap()))
        }

        fn active_session(&self) -> Result<Option<TrainingSession>, ApiError> {
            Ok(self.active.lock().unwrap().clone())
        }

        fn finished_sessions(&self) -> Result<Vec<TrainingSession>, ApiError> {
            Ok(vec![])
        }

        fn session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
            Ok(session(session_id, 10))
        }

        fn record_lap(&self, _session_id: &str) -> Result<(), ApiError> {
            Ok(())
        }

        fn finish_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
            Ok(session(session_id, 10))
        }

        fn cancel_session(&self, session_id: &str) -> Result<TrainingSession, ApiError> {
            Ok(session(session_id, 10))
        }

        fn session_laps(&self, _session_id: &str) -> Result<Vec<LapRecord>, ApiError> {
            Ok(self.laps.lock().unwrap().clone())
        }
    }

    fn manager(backend: MockBackend) -> (SessionManager, TokenStore) {
        let tokens = TokenStore::new();
        (
            SessionManager::new(Arc::new(backend), tokens.clone()),
            tokens,
        )
    }

    #[test]
    fn test_login_stores_the_token() {
        let (manager, tokens) = manager(MockBackend::default());

        assert!(!manager.is_authenticated());
        manager.login("climber@example.com".to_string(), "hunter2".to_string())
            .unwrap();
        assert!(manager.is_authenticated());
        assert_eq!(tokens.get(), Some("mock-token".to_string()));

        manager.logout();
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_create_adopts_the_existing_session_on_conflict() {
        let backend = MockBackend::default();
        backend.create_conflicts.store(true, Ordering::SeqCst);
        *backend.active.lock().unwrap() = Some(session("existing", 8));

        let (manager, _) = manager(backend);
        let plan = SessionPlan::new(10, 100).unwrap();

        let adopted = manager.create_session(plan).unwrap();
        assert_eq!(adopted.id, "existing");
        assert_eq!(adopted.floors_per_lap, 8);
    }

    #[test]
    fn test_create_conflict_without_active_session_propagates() {
        let backend = MockBackend::default();
        backend.create_conflicts.store(true, Ordering::SeqCst);

        let (manager, _) = manager(backend);
        let plan = SessionPlan::new(10, 100).unwrap();

        assert!(matches!(
            manager.create_session(plan),
            Err(ApiError::Conflict)
        ));
    }

    #[test]
    fn test_create_without_conflict_returns_the_new_session() {
        let (manager, _) = manager(MockBackend::default());
        let plan = SessionPlan::new(12, 120).unwrap();

        let created = manager.create_session(plan).unwrap();
        assert_eq!(created.id, "fresh");
        assert_eq!(created.floors_per_lap, 12);
    }

    #[test]
    fn test_laps_come_back_as_a_sorted_ledger() {
        let backend = MockBackend::default();
        *backend.laps.lock().unwrap() = vec![
            LapRecord {
                id: "l-2".to_string(),
                session_id: "s-1".to_string(),
                lap_number: 2,
                finish_time: at(70),
            },
            LapRecord {
                id: "l-1".to_string(),
                session_id: "s-1".to_string(),
                lap_number: 1,
                finish_time: at(30),
            },
        ];

        let (manager, _) = manager(backend);
        let ledger = manager.laps("s-1").unwrap();

        let numbers: Vec<u32> = ledger.iter().map(|lap| lap.lap_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_plan_suggestions_are_unique_sorted_and_capped() {
        let sessions: Vec<TrainingSession> = [10, 5, 10, 0, 7, 5, 12, 3, 9, 11]
            .iter()
            .map(|&floors| session("s", floors))
            .collect();

        // Distinct positive values, ascending, first five
        assert_eq!(plan_suggestions(&sessions), vec![3, 5, 7, 9, 10]);
        assert!(plan_suggestions(&[]).is_empty());
    }
}
