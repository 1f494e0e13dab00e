//! Dataset file output and run summary

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use super::errors::PipelineError;
use crate::verification::DatasetRecord;

/// Write `records` as a pretty-printed JSON array, creating parent directories.
pub fn write_dataset(path: &Path, records: &[DatasetRecord]) -> Result<(), PipelineError> {
    let output_error = |source| PipelineError::Output {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_error)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(output_error)?;

    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Counts for one slice of the dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub validated: usize,
    pub answered: usize,
}

impl Tally {
    fn add(&mut self, record: &DatasetRecord) {
        self.total += 1;
        if record.validated {
            self.validated += 1;
        }
        if record.answer.is_some() {
            self.answered += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = if self.total == 0 {
            0.0
        } else {
            100.0 * self.validated as f64 / self.total as f64
        };
        write!(
            f,
            "{} total, {} validated ({:.1}%), {} answered",
            self.total, self.validated, rate, self.answered
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub overall: Tally,
    pub by_database: BTreeMap<String, Tally>,
    pub by_complexity: BTreeMap<String, Tally>,
    pub by_query_type: BTreeMap<String, Tally>,
    pub by_failure: BTreeMap<String, usize>,
}

impl DatasetSummary {
    pub fn from_records(records: &[DatasetRecord]) -> Self {
        let mut summary = DatasetSummary::default();
        for record in records {
            summary.overall.add(record);
            summary
                .by_database
                .entry(record.database.clone())
                .or_default()
                .add(record);
            summary
                .by_complexity
                .entry(record.candidate.complexity.to_string())
                .or_default()
                .add(record);
            summary
                .by_query_type
                .entry(record.candidate.query_type.to_string())
                .or_default()
                .add(record);
            if let Some(failure) = record.failure {
                *summary.by_failure.entry(failure.to_string()).or_default() += 1;
            }
        }
        summary
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {}", self.overall)?;
        let sections = [
            ("By database", &self.by_database),
            ("By complexity", &self.by_complexity),
            ("By query type", &self.by_query_type),
        ];
        for (title, tallies) in sections {
            writeln!(f, "{}:", title)?;
            for (key, tally) in tallies {
                writeln!(f, "  {}: {}", key, tally)?;
            }
        }
        if !self.by_failure.is_empty() {
            writeln!(f, "Failures:")?;
            for (kind, count) in &self.by_failure {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }
        Ok(())
    }
}
