use std::collections::BTreeMap;
use std::time::Instant;

/// Sink for use-case progress, stage timings and per-item metrics.
pub trait PipelineLogger: Send {
    /// `total` is 0 for open-ended streams.
    fn progress(&mut self, current: usize, total: usize);

    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Per-item value such as blur passes or plates found.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and range of one recorded series.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tally {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Tally {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

fn record(series: &mut BTreeMap<String, Tally>, name: &str, value: f64) {
    match series.get_mut(name) {
        Some(tally) => tally.add(value),
        None => {
            series.insert(name.to_string(), Tally::new(value));
        }
    }
}

/// Logs progress through the `log` crate and keeps per-stage timing and
/// metric tallies for an end-of-run summary.
///
/// Progress lines are emitted every `throttle` items; `unit` names the
/// items ("files", "frames").
pub struct StdoutPipelineLogger {
    throttle: usize,
    unit: &'static str,
    stages: BTreeMap<String, Tally>,
    metrics: BTreeMap<String, Tally>,
    started: Instant,
    processed: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize, unit: &'static str) -> Self {
        Self {
            throttle: throttle.max(1),
            unit,
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            processed: 0,
        }
    }

    pub fn for_files() -> Self {
        Self::new(1, "files")
    }

    pub fn for_frames() -> Self {
        Self::new(30, "frames")
    }

    /// Summary text, or `None` while nothing has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let unit = self.unit;
        let mut out = format!(
            "Run summary: {} {unit} in {elapsed_s:.1}s",
            self.processed
        );
        if self.processed > 0 && elapsed_s > 0.0 {
            out.push_str(&format!(" ({:.1} {unit}/s)", self.processed as f64 / elapsed_s));
        }

        for (stage, t) in &self.stages {
            let share = if elapsed_s > 0.0 {
                t.sum / (elapsed_s * 10.0)
            } else {
                0.0
            };
            out.push_str(&format!(
                "\n  {stage:<8} {:>8.1}ms mean  {:>8.1}ms max  {share:5.1}% of wall time",
                t.mean(),
                t.max
            ));
        }
        for (name, t) in &self.metrics {
            out.push_str(&format!(
                "\n  {name:<8} mean {:.2}, range {}..{}",
                t.mean(),
                t.min,
                t.max
            ));
        }
        Some(out)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.processed = current;
        let unit = self.unit;
        let due = current % self.throttle == 0;
        if total == 0 {
            if due {
                log::info!("{current} {unit} done");
            }
        } else if due || current == total {
            log::info!("{current}/{total} {unit} done");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.stages, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
