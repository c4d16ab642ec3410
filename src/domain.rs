//! Core data types shared by readers, merge and persistence.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which of the three inputs a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Partial,
    Full,
    Forecast,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Partial => "partial report",
            SourceKind::Full => "full report",
            SourceKind::Forecast => "forecast",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One merged output row.
///
/// A value is `None` exactly when the Cella was absent from that source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellaRecord {
    pub cella: String,
    pub partial_count: Option<i64>,
    pub full_count: Option<i64>,
    pub forecast_expected: Option<f64>,
}

/// Result of the merge step for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedBatch {
    pub stats_date: NaiveDate,
    /// Sorted ascending by `cella`.
    pub records: Vec<CellaRecord>,
    /// Filter identifiers that no source contained.
    pub unmatched_filter: Vec<String>,
}

/// Why a data row did not contribute a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyCella,
    InvalidDate,
    OtherDate,
    InvalidValue,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::EmptyCella => "empty cella",
            SkipReason::InvalidDate => "invalid date",
            SkipReason::OtherDate => "other date",
            SkipReason::InvalidValue => "invalid value",
        }
    }
}

/// Extraction statistics for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractStats {
    pub rows_read: usize,
    pub rows_used: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ExtractStats {
    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn rows_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Aggregated per-Cella values from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceValues<T> {
    pub kind: SourceKind,
    pub values: BTreeMap<String, T>,
    pub stats: ExtractStats,
}

impl<T> SourceValues<T> {
    pub fn new(kind: SourceKind) -> Self {
        Self { kind, values: BTreeMap::new(), stats: ExtractStats::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_counters_accumulate_per_reason() {
        let mut stats = ExtractStats::default();
        stats.skip(SkipReason::EmptyCella);
        stats.skip(SkipReason::OtherDate);
        stats.skip(SkipReason::OtherDate);
        assert_eq!(stats.rows_skipped(), 3);
        assert_eq!(stats.skipped[&SkipReason::OtherDate], 2);
    }

    #[test]
    fn source_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SourceKind::Forecast).expect("serialize");
        assert_eq!(json, "\"forecast\"");
    }
}
