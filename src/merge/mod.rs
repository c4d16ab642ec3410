//! Merge per-source values into one record per Cella.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::{CellaRecord, MergedBatch, SourceValues};

/// Build the batch for `stats_date`.
///
/// The key set is the union of the three sources' Cellas, intersected with
/// `filter` when one is given. Filter entries found in no source produce no
/// record and are returned in [`MergedBatch::unmatched_filter`].
pub fn merge_sources(
    stats_date: NaiveDate,
    partial: &SourceValues<i64>,
    full: &SourceValues<i64>,
    forecast: &SourceValues<f64>,
    filter: Option<&BTreeSet<String>>,
) -> MergedBatch {
    let union: BTreeSet<&String> =
        partial.values.keys().chain(full.values.keys()).chain(forecast.values.keys()).collect();

    let (keys, unmatched_filter): (Vec<&String>, Vec<String>) = match filter {
        Some(wanted) => (
            union.iter().copied().filter(|k| wanted.contains(*k)).collect(),
            wanted.iter().filter(|w| !union.contains(w)).cloned().collect(),
        ),
        None => (union.into_iter().collect(), Vec::new()),
    };

    for cella in &unmatched_filter {
        tracing::warn!("Cella {} is not present in any source; no row written", cella);
    }

    let records = keys
        .into_iter()
        .map(|cella| CellaRecord {
            cella: cella.clone(),
            partial_count: partial.values.get(cella).copied(),
            full_count: full.values.get(cella).copied(),
            forecast_expected: forecast.values.get(cella).copied(),
        })
        .collect();

    MergedBatch { stats_date, records, unmatched_filter }
}
