use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Named step durations of one pipeline run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    totals: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.totals.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    /// Runs `step` and records how long it took under `name`.
    pub fn time<T>(&mut self, name: &str, step: impl FnOnce() -> T) -> T {
        let timer = Timer::start(name);
        let value = step();
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
        value
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Combined duration of every step recorded under `name`.
    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.totals.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                step.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            info!(
                step = %step.name,
                ms = format!("{:.3}", step.duration.as_secs_f64() * 1000.0),
                share = format!("{percentage:.1}%"),
                "Step timing"
            );
        }
        info!(
            ms = format!("{:.3}", total.as_secs_f64() * 1000.0),
            "Total pipeline time"
        );
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_keep_order_and_sum_by_name() {
        let mut timings = PipelineTimings::new();
        timings.add_step("decode", Duration::from_millis(5));
        timings.add_step("build", Duration::from_millis(20));
        timings.add_step("decode", Duration::from_millis(3));

        let names: Vec<_> = timings.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["decode", "build", "decode"]);
        assert_eq!(timings.get_step("decode"), Some(Duration::from_millis(8)));
        assert_eq!(timings.get_step("missing"), None);
        assert_eq!(timings.total_duration(), Duration::from_millis(28));
    }

    #[test]
    fn time_records_the_step_and_returns_its_value() {
        let mut timings = PipelineTimings::new();
        let value = timings.time("answer", || 42);
        assert_eq!(value, 42);
        assert_eq!(timings.steps().len(), 1);
        assert!(timings.get_step("answer").is_some());
    }
}
