use criterion::{black_box, criterion_group, criterion_main, Criterion};
use runtime::{metrics::TickLatencyMetrics, Session, SessionConfig};
use std::time::Instant;
use wagers::Direction;

const LATENCY_SAMPLES: usize = 5_000;
const START_MS: i64 = 1_735_689_600_000;

fn bench_advance_latency(c: &mut Criterion) {
    let (mut session, _) = Session::start(SessionConfig::default(), "BTC", START_MS, 11)
        .expect("session should start");

    let mut metrics = TickLatencyMetrics::with_capacity(LATENCY_SAMPLES);
    let mut now = START_MS;
    for sample in 0..LATENCY_SAMPLES {
        now += 1_000;
        if sample % 10 == 0 {
            let _ = session.submit_wager(Direction::Up, 1.0, now);
        }
        let started = Instant::now();
        let events = session.advance(now);
        let elapsed_micros = started.elapsed().as_micros() as u64;
        metrics.record_latency_micros(elapsed_micros);
        black_box(events);
    }

    if let Some(report) = metrics.percentiles() {
        println!(
            "p50_micros={} p95_micros={} p99_micros={} max_micros={} samples={}",
            report.p50_micros, report.p95_micros, report.p99_micros, report.max_micros, report.count
        );
    }

    c.bench_function("session_advance", |b| {
        b.iter(|| {
            now += 1_000;
            black_box(session.advance(now));
        });
    });
}

criterion_group!(benches, bench_advance_latency);
criterion_main!(benches);
