use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for use-case progress, stage timings, and per-frame counts.
///
/// Use cases report through this trait so the CLI, tests, and embedding
/// callers can each decide what to do with the events.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// Duration of one named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame sample such as the number of visible persons.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Series {
    count: usize,
    total: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Forwards events to the `log` facade for terminal use.
///
/// Progress lines are emitted every `every_frames` frames and on the last
/// frame. Timings and metrics are folded into running totals and printed
/// once by [`summary`](PipelineLogger::summary).
pub struct StdoutPipelineLogger {
    every_frames: usize,
    frames_seen: usize,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    started: Instant,
}

impl StdoutPipelineLogger {
    pub fn new(every_frames: usize) -> Self {
        Self {
            every_frames: every_frames.max(1),
            frames_seen: 0,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    /// Whether `current` should produce a progress line.
    fn should_report(&self, current: usize, total: usize) -> bool {
        current % self.every_frames == 0 || (total > 0 && current == total)
    }

    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Series::mean)
    }

    pub fn mean_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Series::mean)
    }

    /// Multi-line run report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_seen == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} frames, {elapsed:.1}s):",
            self.frames_seen
        )];
        for (stage, series) in &self.timings {
            lines.push(format!(
                "  {stage:10} avg {:6.1}ms  total {:7.0}ms",
                series.mean(),
                series.total
            ));
        }
        for (name, series) in &self.metrics {
            lines.push(format!("  {name:10} avg {:.1}", series.mean()));
        }
        if self.frames_seen > 0 && elapsed > 0.0 {
            lines.push(format!(
                "  throughput {:.1} fps",
                self.frames_seen as f64 / elapsed
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = self.frames_seen.max(current);
        if !self.should_report(current, total) {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Evaluated {current}/{total} frames ({pct:.0}%)");
        } else {
            log::info!("Evaluated {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("persons", 2.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_average_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 40.0);
        logger.timing("classify", 1.0);

        assert_relative_eq!(logger.mean_timing("detect").unwrap(), 30.0);
        assert_relative_eq!(logger.mean_timing("classify").unwrap(), 1.0);
        assert!(logger.mean_timing("decode").is_none());
    }

    #[test]
    fn test_metrics_average() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("persons", 3.0);
        logger.metric("persons", 4.0);
        assert_relative_eq!(logger.mean_metric("persons").unwrap(), 3.5);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(4, 4);
        logger.timing("detect", 12.0);
        logger.metric("contacts", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (4 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("contacts"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[rstest]
    #[case::on_interval(20, 100, true)]
    #[case::between(7, 100, false)]
    #[case::last_frame(93, 93, true)]
    #[case::unknown_total(7, 0, false)]
    fn test_should_report(#[case] current: usize, #[case] total: usize, #[case] expected: bool) {
        let logger = StdoutPipelineLogger::new(10);
        assert_eq!(logger.should_report(current, total), expected);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.every_frames, 1);
    }
}
