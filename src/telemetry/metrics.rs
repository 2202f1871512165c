//! Tick timing
//!
//! `TickProfiler` keeps rolling windows for the interval between ticks and
//! for the two halves of a tick: the scene/camera update and the pass chain
//! render. A summary is logged at debug level every few hundred ticks.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept per window, about five seconds at 60 Hz
const WINDOW: usize = 300;

/// Ticks between debug reports
const REPORT_EVERY: u64 = 300;

/// Part of a tick that is timed separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Spin the globe and stars, then step the camera
    Update,
    /// Encode the pass chain and present
    Render,
}

/// Summary of one timing window, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub mean_ms: f64,
    pub p95_ms: f64,
    pub worst_ms: f64,
}

/// Snapshot of every window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub samples: usize,
    pub interval: Summary,
    pub update: Summary,
    pub render: Summary,
}

#[derive(Debug)]
struct Window {
    samples_ms: VecDeque<f64>,
}

impl Window {
    fn new() -> Self {
        Self {
            samples_ms: VecDeque::with_capacity(WINDOW),
        }
    }

    fn push(&mut self, duration: Duration) {
        if self.samples_ms.len() == WINDOW {
            self.samples_ms.pop_front();
        }
        self.samples_ms.push_back(duration.as_secs_f64() * 1000.0);
    }

    fn len(&self) -> usize {
        self.samples_ms.len()
    }

    fn summary(&self) -> Summary {
        if self.samples_ms.is_empty() {
            return Summary::default();
        }
        let mut sorted: Vec<f64> = self.samples_ms.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        Summary {
            mean_ms: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p95_ms: nearest_rank(&sorted, 0.95),
            worst_ms: sorted[sorted.len() - 1],
        }
    }
}

/// Nearest-rank value at fraction `q` of an ascending slice
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n => sorted[((n - 1) as f64 * q.clamp(0.0, 1.0)).round() as usize],
    }
}

/// Rolling timing of the render loop
#[derive(Debug)]
pub struct TickProfiler {
    interval: Window,
    update: Window,
    render: Window,
    last_tick: Option<Instant>,
    ticks: u64,
}

impl Default for TickProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickProfiler {
    pub fn new() -> Self {
        Self {
            interval: Window::new(),
            update: Window::new(),
            render: Window::new(),
            last_tick: None,
            ticks: 0,
        }
    }

    /// Start a tick; the time since the previous start is recorded as the interval
    pub fn begin_tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.interval.push(now.duration_since(last));
        }
    }

    /// Run `f` and record how long it took under `phase`
    pub fn measure<T>(&mut self, phase: TickPhase, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let value = f();
        self.record(phase, started.elapsed());
        value
    }

    pub fn record(&mut self, phase: TickPhase, duration: Duration) {
        match phase {
            TickPhase::Update => self.update.push(duration),
            TickPhase::Render => self.render.push(duration),
        }
    }

    /// Finish a tick, logging a summary every `REPORT_EVERY` ticks
    pub fn end_tick(&mut self) {
        self.ticks += 1;
        if self.ticks % REPORT_EVERY == 0 {
            let stats = self.stats();
            tracing::debug!(
                ticks = self.ticks,
                rate_hz = format!("{:.1}", self.rate_hz()),
                update_ms = format!("{:.2}", stats.update.mean_ms),
                render_ms = format!("{:.2}", stats.render.mean_ms),
                render_p95_ms = format!("{:.2}", stats.render.p95_ms),
                "Tick timing"
            );
        }
    }

    pub fn stats(&self) -> TickStats {
        TickStats {
            samples: self.interval.len(),
            interval: self.interval.summary(),
            update: self.update.summary(),
            render: self.render.summary(),
        }
    }

    /// Ticks per second derived from the mean interval
    pub fn rate_hz(&self) -> f64 {
        let mean = self.interval.summary().mean_ms;
        if mean > 0.0 {
            1000.0 / mean
        } else {
            0.0
        }
    }

    /// Ticks finished since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(ms: &[u64]) -> Window {
        let mut window = Window::new();
        for &m in ms {
            window.push(Duration::from_millis(m));
        }
        window
    }

    #[test]
    fn test_summary() {
        let summary = window_of(&[16, 17, 15, 40]).summary();
        assert!((summary.mean_ms - 22.0).abs() < 1e-9);
        assert!((summary.worst_ms - 40.0).abs() < 1e-9);
        assert!((summary.p95_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_rank() {
        let sorted: Vec<f64> = (1..=11).map(f64::from).collect();
        assert_eq!(nearest_rank(&sorted, 0.0), 1.0);
        assert_eq!(nearest_rank(&sorted, 0.5), 6.0);
        assert_eq!(nearest_rank(&sorted, 1.0), 11.0);
        assert_eq!(nearest_rank(&[], 0.5), 0.0);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut window = window_of(&[100]);
        for _ in 0..WINDOW {
            window.push(Duration::from_millis(10));
        }
        assert_eq!(window.len(), WINDOW);
        assert!((window.summary().worst_ms - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_phases_are_kept_apart() {
        let mut profiler = TickProfiler::new();
        profiler.record(TickPhase::Update, Duration::from_millis(1));
        profiler.record(TickPhase::Render, Duration::from_millis(9));
        let stats = profiler.stats();
        assert!((stats.update.mean_ms - 1.0).abs() < 1e-9);
        assert!((stats.render.mean_ms - 9.0).abs() < 1e-9);
        // No interval until a second tick starts
        assert_eq!(stats.samples, 0);
        assert_eq!(profiler.rate_hz(), 0.0);
    }

    #[test]
    fn test_measure_returns_value() {
        let mut profiler = TickProfiler::new();
        let value = profiler.measure(TickPhase::Update, || 7);
        assert_eq!(value, 7);
        assert_eq!(profiler.update.len(), 1);
    }

    #[test]
    fn test_interval_needs_two_ticks() {
        let mut profiler = TickProfiler::new();
        profiler.begin_tick();
        profiler.end_tick();
        profiler.begin_tick();
        profiler.end_tick();
        assert_eq!(profiler.stats().samples, 1);
        assert_eq!(profiler.ticks(), 2);
    }
}
