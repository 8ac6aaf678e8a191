use std::hint::black_box;

use chrono::{DateTime, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gradus::statistics::SessionStatistics;
use gradus::{LapLedger, LapRecord, SessionStatus, TrainingSession};

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

fn session_with(target_floors: u32) -> TrainingSession {
    TrainingSession {
        id: "bench-session".to_string(),
        user_id: "bench-user".to_string(),
        start_time: at(0),
        end_time: None,
        floors_per_lap: 10,
        target_floors,
        status: SessionStatus::Active,
        created_at: at(0),
    }
}

fn records(lap_count: usize) -> Vec<LapRecord> {
    (0..lap_count)
        .map(|i| LapRecord {
            id: format!("lap-{i}"),
            session_id: "bench-session".to_string(),
            lap_number: i as u32 + 1,
            // Uneven lap times between 30 and 60 seconds
            finish_time: at((i as i64 + 1) * 30 + (i as i64 % 4) * 10),
        })
        .collect()
}

fn benchmark_statistics_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics_calculation");

    let lap_counts = vec![10, 100, 1000, 10000];

    for lap_count in lap_counts {
        let session = session_with(lap_count as u32 * 10);
        let ledger = LapLedger::new(records(lap_count));

        group.bench_with_input(
            BenchmarkId::new("calculate", lap_count),
            &(session, ledger),
            |b, (session, ledger)| {
                b.iter(|| SessionStatistics::calculate(black_box(session), black_box(ledger)))
            },
        );
    }

    group.finish();
}

fn benchmark_ledger_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_construction");

    let lap_counts = vec![10, 100, 1000, 10000];

    for lap_count in lap_counts {
        // Reverse the rows so sorting actually has work to do
        let mut rows = records(lap_count);
        rows.reverse();

        group.bench_with_input(BenchmarkId::new("new", lap_count), &rows, |b, rows| {
            b.iter(|| LapLedger::new(black_box(rows.clone())))
        });
    }

    group.finish();
}

fn benchmark_split_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_derivation");

    let lap_counts = vec![10, 100, 1000, 10000];

    for lap_count in lap_counts {
        let ledger = LapLedger::new(records(lap_count));

        group.bench_with_input(
            BenchmarkId::new("splits", lap_count),
            &ledger,
            |b, ledger| b.iter(|| ledger.splits(black_box(at(0)))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_statistics_calculation,
    benchmark_ledger_construction,
    benchmark_split_derivation
);
criterion_main!(benches);
