//! Scoped duration profiler.
//!
//! A [`Profiler`] lives for one run. [`Profiler::scope`] hands out a guard
//! that records its elapsed time under a label when dropped; statistics are
//! aggregated per label and reported once at the end of the run.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy)]
struct Stats {
    count: u64,
    total: Duration,
    min: Duration,
    max: Duration,
}

impl Stats {
    fn first(elapsed: Duration) -> Self {
        Self {
            count: 1,
            total: elapsed,
            min: elapsed,
            max: elapsed,
        }
    }

    fn add(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
    }
}

/// Aggregated timings for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeReport {
    /// Scope label.
    pub label: String,
    /// Times the scope was entered.
    pub count: u64,
    /// Sum of all durations, in milliseconds.
    pub total_ms: f64,
    /// Mean duration, in milliseconds.
    pub mean_ms: f64,
    /// Shortest duration, in milliseconds.
    pub min_ms: f64,
    /// Longest duration, in milliseconds.
    pub max_ms: f64,
}

/// Per-run scope timer registry.
#[derive(Debug, Default)]
pub struct Profiler {
    enabled: bool,
    scopes: RefCell<BTreeMap<&'static str, Stats>>,
}

impl Profiler {
    /// A profiler that records every scope.
    pub fn new() -> Self {
        Self {
            enabled: true,
            scopes: RefCell::default(),
        }
    }

    /// A profiler whose scopes are no-ops.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns true if scopes are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts timing `label` until the returned guard is dropped.
    pub fn scope(&self, label: &'static str) -> ScopeTimer<'_> {
        ScopeTimer {
            profiler: self,
            label,
            start: self.enabled.then(Instant::now),
        }
    }

    fn record(&self, label: &'static str, elapsed: Duration) {
        self.scopes
            .borrow_mut()
            .entry(label)
            .and_modify(|stats| stats.add(elapsed))
            .or_insert_with(|| Stats::first(elapsed));
    }

    /// Aggregated timings, longest total first.
    pub fn report(&self) -> Vec<ScopeReport> {
        let mut report: Vec<ScopeReport> = self
            .scopes
            .borrow()
            .iter()
            .map(|(label, stats)| ScopeReport {
                label: label.to_string(),
                count: stats.count,
                total_ms: millis(stats.total),
                mean_ms: millis(stats.total) / stats.count as f64,
                min_ms: millis(stats.min),
                max_ms: millis(stats.max),
            })
            .collect();
        report.sort_by(|a, b| b.total_ms.total_cmp(&a.total_ms));
        report
    }

    /// Appends one datalog row per label to a CSV file.
    ///
    /// Columns: `timestamp,label,count,total_s,mean_s`. A header row is
    /// written when the file is new or empty.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "timestamp,label,count,total_s,mean_s")?;
        }
        let timestamp = chrono::Local::now().format("%d-%m-%Y %H:%M:%S");
        for entry in self.report() {
            writeln!(
                file,
                "{},{},{},{:.6},{:.6}",
                timestamp,
                entry.label,
                entry.count,
                entry.total_ms / 1000.0,
                entry.mean_ms / 1000.0
            )?;
        }
        Ok(())
    }
}

/// Guard returned by [`Profiler::scope`].
#[must_use = "the scope is timed until this guard is dropped"]
pub struct ScopeTimer<'a> {
    profiler: &'a Profiler,
    label: &'static str,
    start: Option<Instant>,
}

impl Drop for ScopeTimer<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.profiler.record(self.label, start.elapsed());
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_aggregate_by_label() {
        let profiler = Profiler::new();
        for _ in 0..3 {
            let _outer = profiler.scope("block");
            let _inner = profiler.scope("mix");
        }
        {
            let _once = profiler.scope("run");
        }

        let report = profiler.report();
        assert_eq!(report.len(), 3);
        let block = report.iter().find(|r| r.label == "block").unwrap();
        assert_eq!(block.count, 3);
        assert!(block.min_ms <= block.mean_ms && block.mean_ms <= block.max_ms);
        assert_eq!(report.iter().find(|r| r.label == "run").unwrap().count, 1);
    }

    #[test]
    fn test_disabled_profiler_records_nothing() {
        let profiler = Profiler::disabled();
        assert!(!profiler.is_enabled());
        {
            let _scope = profiler.scope("mix");
        }
        assert!(profiler.report().is_empty());
    }

    #[test]
    fn test_csv_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalog.csv");
        let profiler = Profiler::new();
        {
            let _scope = profiler.scope("write");
        }
        profiler.write_csv(&path).unwrap();
        profiler.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,label,count,total_s,mean_s");
        assert!(lines[1].contains(",write,1,"));
        assert!(lines[2].contains(",write,1,"));
    }
}
