use std::collections::HashMap;

use crate::types::HistoryRecord;

/// Append-only record list with per-address and per-ticker indices.
///
/// Indices are only ever updated by `append`, so they cannot drift from the
/// records they point into.
#[derive(Debug, Default)]
pub struct HistoryLog {
    enabled: bool,
    records: Vec<HistoryRecord>,
    by_address: HashMap<String, Vec<usize>>,
    by_ticker: HashMap<String, Vec<usize>>,
}

impl HistoryLog {
    pub fn new(enabled: bool) -> Self {
        HistoryLog {
            enabled,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the record's position, or `None` when history is disabled.
    pub fn append(&mut self, record: HistoryRecord) -> Option<usize> {
        if !self.enabled {
            return None;
        }

        let index = self.records.len();
        self.by_address
            .entry(record.pk_script.clone())
            .or_default()
            .push(index);
        if !record.ticker.is_empty() {
            self.by_ticker
                .entry(record.ticker.clone())
                .or_default()
                .push(index);
        }
        self.records.push(record);

        Some(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn for_address<'a>(&'a self, pk_script: &str) -> impl Iterator<Item = &'a HistoryRecord> {
        self.by_address
            .get(pk_script)
            .into_iter()
            .flatten()
            .map(|index| &self.records[*index])
    }

    pub fn for_ticker<'a>(&'a self, ticker: &str) -> impl Iterator<Item = &'a HistoryRecord> {
        self.by_ticker
            .get(ticker)
            .into_iter()
            .flatten()
            .map(|index| &self.records[*index])
    }

    pub fn count_for_ticker(&self, ticker: &str) -> usize {
        self.by_ticker.get(ticker).map_or(0, |indices| indices.len())
    }

    pub fn count_for_address_ticker(&self, pk_script: &str, ticker: &str) -> usize {
        self.for_address(pk_script)
            .filter(|record| record.ticker == ticker)
            .count()
    }
}
