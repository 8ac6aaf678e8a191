//! # Gradus
//!
//! A library for tracking stair-climbing training sessions.
//!
//! The crate models a single training activity: a [`TrainingSession`] with a
//! floor goal, a [`LapLedger`] of recorded laps, and the
//! [`SessionStatistics`] derived from the two. It performs no I/O of its own;
//! session and lap rows come from whatever backend the application talks to.
//!
//! ```rust
//! use gradus::SessionPlan;
//!
//! let plan = SessionPlan::new(10, 100).unwrap();
//! assert_eq!(plan.floors_per_lap(), 10);
//! ```

pub mod duration;
pub mod lap;
pub mod session;
pub mod statistics;

pub use duration::{format_duration, seconds_between};
pub use lap::{LapLedger, LapRecord, LapSplit};
pub use session::{PlanError, SessionPlan, SessionStatus, TrainingSession};
pub use statistics::SessionStatistics;

/// Whole seconds, for durations derived from wall-clock timestamps
pub type Seconds = u64;
