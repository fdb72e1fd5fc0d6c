use std::time::{Duration, Instant};

use ulid::Ulid;

use incumbent::{detect, validate_at, Precision, ScopeConfig, SiblingRow, Tenure, Us, Window};

const HOUR: Us = 3_600_000_000; // 1 hour in µs
const ITERATIONS: usize = 200;

/// Per-call timings for one scenario, reported in microseconds.
struct Timings {
    scenario: String,
    samples: Vec<Duration>,
}

impl Timings {
    fn new(scenario: String) -> Self {
        Self { scenario, samples: Vec::with_capacity(ITERATIONS) }
    }

    fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.samples.push(start.elapsed());
        out
    }

    /// Nearest-rank quantile over the sorted samples.
    fn quantile_us(sorted: &[Duration], q: f64) -> f64 {
        let rank = ((sorted.len() as f64) * q).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1].as_secs_f64() * 1e6
    }

    fn report(mut self) {
        if self.samples.is_empty() {
            return;
        }
        self.samples.sort_unstable();
        let s = &self.samples;
        println!(
            "  {:<28} median {:>9.1}us  p90 {:>9.1}us  p99 {:>9.1}us  worst {:>9.1}us",
            self.scenario,
            Self::quantile_us(s, 0.5),
            Self::quantile_us(s, 0.9),
            Self::quantile_us(s, 0.99),
            Self::quantile_us(s, 1.0),
        );
    }
}

/// Back-to-back one-hour terms: a scope with no collisions at all.
fn siblings(n: usize) -> Vec<SiblingRow<Ulid>> {
    (0..n as Us)
        .map(|i| SiblingRow::new(Ulid::new(), Some(i * HOUR), Some((i + 1) * HOUR)))
        .collect()
}

fn bench_detect(n: usize) {
    let rows = siblings(n);
    let windows: Vec<(Ulid, Window)> = rows
        .iter()
        .map(|r| (r.id, r.window(Precision::Native, 0)))
        .collect();
    // straddles the middle two terms
    let mid = (n / 2) as Us;
    let candidate = Window::new(Some(mid * HOUR - HOUR / 2), Some(mid * HOUR + HOUR / 2), Precision::Native, 0);

    let mut timings = Timings::new(format!("detect, {n} siblings"));
    for _ in 0..ITERATIONS {
        let hits = timings.time(|| detect(&candidate, windows.iter().copied(), None, false));
        assert_eq!(hits.len(), 2);
    }
    timings.report();
}

fn bench_validate(n: usize) {
    let config = ScopeConfig::new("scope")
        .active_from("starts_at")
        .until("ends_at")
        .uniquely_active()
        .with_precision(Precision::Second);
    let rows = siblings(n);
    let scope = Ulid::new();
    let record = Tenure::new(Ulid::new())
        .set("starts_at", n as Us * HOUR)
        .belonging_to("scope", scope);

    let mut timings = Timings::new(format!("validate, {n} siblings"));
    for _ in 0..ITERATIONS {
        let result = timings.time(|| validate_at(&record, &config, rows.as_slice(), 0));
        assert!(result.is_ok());
    }
    timings.report();
}

fn main() {
    println!("collision detection");
    for n in [10, 1_000, 100_000] {
        bench_detect(n);
        bench_validate(n);
    }
}
