use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

/// Wall-clock time spent in one named pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: &'static str,
    pub duration: Duration,
    pub succeeded: bool,
}

/// One row of the `stage_millis` table in the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMillis {
    pub stage: &'static str,
    pub millis: f64,
    pub ok: bool,
}

/// Stage durations of a single scan, in execution order.
#[derive(Debug, Default, Clone)]
pub struct PipelineTimings {
    stages: Vec<StageTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, duration: Duration, succeeded: bool) {
        self.stages.push(StageTiming {
            name,
            duration,
            succeeded,
        });
    }

    /// Runs one stage and records its duration and outcome, failures included.
    pub fn measure<T, E>(
        &mut self,
        name: &'static str,
        stage: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let start = Instant::now();
        let out = stage();
        self.record(name, start.elapsed(), out.is_ok());
        out
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Summed duration of every run of `name`.
    pub fn get_step(&self, name: &str) -> Option<Duration> {
        let mut runs = self.stages.iter().filter(|s| s.name == name).peekable();
        runs.peek()?;
        Some(runs.map(|s| s.duration).sum())
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn failed_stage(&self) -> Option<&'static str> {
        self.stages.iter().find(|s| !s.succeeded).map(|s| s.name)
    }

    pub fn to_millis(&self) -> Vec<StageMillis> {
        self.stages
            .iter()
            .map(|s| StageMillis {
                stage: s.name,
                millis: s.duration.as_secs_f64() * 1000.0,
                ok: s.succeeded,
            })
            .collect()
    }

    pub fn log_summary(&self) {
        let total = self.total_duration().as_secs_f64();
        for stage in &self.stages {
            let secs = stage.duration.as_secs_f64();
            let share = if total > 0.0 { secs / total * 100.0 } else { 0.0 };
            info!(
                stage = stage.name,
                millis = format_args!("{:.3}", secs * 1000.0),
                share = format_args!("{share:.1}%"),
                ok = stage.succeeded,
                "Stage timing"
            );
        }
        info!(millis = format_args!("{:.3}", total * 1000.0), "Scan total");
    }
}
