//! # Lap Module - Lap Ledger and Derived Splits
//!
//! This module stores the laps recorded during a session and derives per-lap
//! timing from them. A lap is stored as a bare event (which lap, finished
//! when); how long the lap took is never stored, it is computed from the
//! difference between consecutive finish times.
//!
//! ## Key Features
//!
//! - **Ordered Ledger**: [`LapLedger`] sorts its records by lap number on
//!   construction, so backends may return rows in any order
//! - **Derived Timing**: [`LapLedger::splits`] computes each lap's duration
//!   from the previous finish time (or the session start for lap one)
//! - **Clamped Deltas**: A finish time earlier than its predecessor yields a
//!   zero-second split rather than a negative one
//!
//! ## Derived Splits
//!
#![doc = simple_mermaid::mermaid!("../diagrams/lap_splits.mmd")]
//!
//! Timing example for a session started at `T`:
//! ```text
//! Finishes: [T+30][T+70][T+130]
//! Splits:   [ 30 ][ 40 ][  60 ]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Seconds, duration::seconds_between};

/// One recorded lap, as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub id: String,
    pub session_id: String,
    /// 1-based position within the session
    pub lap_number: u32,
    pub finish_time: DateTime<Utc>,
}

/// A lap's position and derived duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapSplit {
    pub lap_number: u32,
    pub finish_time: DateTime<Utc>,
    /// Seconds since the previous finish time, or since the session start
    /// for the first lap
    pub seconds: Seconds,
}

/// The laps of one session, ordered by lap number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapLedger {
    laps: Vec<LapRecord>,
}

impl LapLedger {
    /// Create a ledger from backend rows, sorting them by lap number
    pub fn new(mut laps: Vec<LapRecord>) -> Self {
        laps.sort_by_key(|lap| lap.lap_number);
        Self { laps }
    }

    /// Get the number of recorded laps
    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    /// Get the ordered records
    pub fn records(&self) -> &[LapRecord] {
        &self.laps
    }

    /// Get the most recent lap
    pub fn last(&self) -> Option<&LapRecord> {
        self.laps.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LapRecord> {
        self.laps.iter()
    }

    /// Derive per-lap durations from consecutive finish times
    ///
    /// The first lap is measured from `start_time`; every later lap from the
    /// finish time before it. Deltas clamp at zero.
    ///
    /// * `start_time` - When the session began
    ///
    pub fn splits(&self, start_time: DateTime<Utc>) -> Vec<LapSplit> {
        let mut previous = start_time;

        self.laps
            .iter()
            .map(|lap| {
                let seconds = seconds_between(previous, lap.finish_time);
                previous = lap.finish_time;

                LapSplit {
                    lap_number: lap.lap_number,
                    finish_time: lap.finish_time,
                    seconds,
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a LapLedger {
    type Item = &'a LapRecord;
    type IntoIter = std::slice::Iter<'a, LapRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn lap(number: u32, finish: i64) -> LapRecord {
        LapRecord {
            id: format!("lap-{number}"),
            session_id: "s-1".to_string(),
            lap_number: number,
            finish_time: at(finish),
        }
    }

    #[test]
    fn test_ledger_sorts_rows_on_construction() {
        let ledger = LapLedger::new(vec![lap(3, 130), lap(1, 30), lap(2, 70)]);

        let numbers: Vec<u32> = ledger.iter().map(|lap| lap.lap_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(ledger.last().map(|lap| lap.lap_number), Some(3));
    }

    #[test]
    fn test_splits_measure_consecutive_deltas() {
        // Session starts at T=0, laps finish at T+30, T+70 and T+130
        let ledger = LapLedger::new(vec![lap(1, 30), lap(2, 70), lap(3, 130)]);

        let splits = ledger.splits(at(0));
        let seconds: Vec<Seconds> = splits.iter().map(|split| split.seconds).collect();
        assert_eq!(seconds, vec![30, 40, 60]); // 30-0, 70-30, 130-70
    }

    #[test]
    fn test_first_split_measures_from_session_start() {
        let ledger = LapLedger::new(vec![lap(1, 145)]);

        let splits = ledger.splits(at(100));
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].seconds, 45);
        assert_eq!(splits[0].lap_number, 1);
    }

    #[test]
    fn test_splits_clamp_backwards_clocks_to_zero() {
        // Second finish time precedes the first
        let ledger = LapLedger::new(vec![lap(1, 100), lap(2, 90)]);

        let splits = ledger.splits(at(0));
        assert_eq!(splits[0].seconds, 100);
        assert_eq!(splits[1].seconds, 0);
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = LapLedger::new(vec![]);

        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
        assert!(ledger.last().is_none());
        assert!(ledger.splits(at(0)).is_empty());
    }
}
