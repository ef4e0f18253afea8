//! Append-only statistics sink for sort runs.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::file::PoolStats;
use crate::sort::SortStrategy;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One labelled line per counter
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Counters and timing of one sort run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub file_name: String,
    pub strategy: SortStrategy,
    pub cache_hits: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn new(
        file_name: impl Into<String>,
        strategy: SortStrategy,
        stats: PoolStats,
        elapsed: Duration,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            strategy,
            cache_hits: stats.cache_hits,
            disk_reads: stats.disk_reads,
            disk_writes: stats.disk_writes,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn render(&self, format: ReportFormat) -> ReportResult<String> {
        match format {
            ReportFormat::Text => Ok(format!(
                "Sort on {} ({})\nCache Hits: {}\nDisk Reads: {}\nDisk Writes: {}\nSort Time: {}ms\n",
                self.file_name,
                self.strategy,
                self.cache_hits,
                self.disk_reads,
                self.disk_writes,
                self.elapsed_ms
            )),
            ReportFormat::Json => {
                let mut line = serde_json::to_string(self)?;
                line.push('\n');
                Ok(line)
            }
        }
    }

    /// Append the report to `path`, creating the file if needed
    pub fn append_to<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> ReportResult<()> {
        let rendered = self.render(format)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(rendered.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport::new(
            "data.bin",
            SortStrategy::MedianOfThreeThreeWay,
            PoolStats {
                cache_hits: 10,
                disk_reads: 3,
                disk_writes: 2,
            },
            Duration::from_millis(42),
        )
    }

    #[test]
    fn test_text_format() {
        let text = sample().render(ReportFormat::Text).unwrap();
        assert_eq!(
            text,
            "Sort on data.bin (median-of-three three-way)\nCache Hits: 10\nDisk Reads: 3\nDisk Writes: 2\nSort Time: 42ms\n"
        );
    }

    #[test]
    fn test_json_format() {
        let line = sample().render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["file_name"], "data.bin");
        assert_eq!(value["strategy"], "MedianOfThreeThreeWay");
        assert_eq!(value["cache_hits"], 10);
        assert_eq!(value["disk_reads"], 3);
        assert_eq!(value["disk_writes"], 2);
        assert_eq!(value["elapsed_ms"], 42);
    }

    #[test]
    fn test_append_keeps_previous_runs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stats.txt");

        sample().append_to(&path, ReportFormat::Text).unwrap();
        sample().append_to(&path, ReportFormat::Text).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("Cache Hits: 10").count(), 2);
    }
}
