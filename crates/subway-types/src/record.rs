//! Raw rows and the merged dataset.
//!
//! Rows are kept exactly as the source returned them. The field order of a
//! [`Record`] is the source's natural column order, which becomes the
//! column order of the written table.

use crate::DayKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw row: field name to string/number, in source order.
pub type Record = serde_json::Map<String, Value>;

/// Ordered collection of records from one ingestion run.
///
/// Order is day ascending, then page order, then in-page order. Build it
/// with [`Dataset::merge_days`] so the order never depends on which day
/// happened to finish first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Wrap records that are already in final order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Merge per-day record batches into one dataset ordered by day.
    ///
    /// Batches may arrive in any order. Within a day the batch order is kept
    /// (the sort is stable), so a day split into several batches stays in
    /// arrival order.
    pub fn merge_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = (DayKey, Vec<Record>)>,
    {
        let mut days: Vec<(DayKey, Vec<Record>)> = days.into_iter().collect();
        days.sort_by_key(|(day, _)| *day);

        let total = days.iter().map(|(_, records)| records.len()).sum();
        let mut records = Vec::with_capacity(total);
        for (_, batch) in days {
            records.extend(batch);
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Column names in first-seen order across all records.
    ///
    /// For a well-formed source every row carries the same fields, so this
    /// is simply the first row's field order. Fields that only appear in
    /// later rows are appended at the end.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in &self.records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(day: &str, station: &str) -> Record {
        match json!({
            "USE_YMD": day,
            "SBWY_STNS_NM": station,
            "GTON_TNOPE": 10,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn key(d: u32) -> DayKey {
        DayKey::from_ymd(2024, 1, d).unwrap()
    }

    #[test]
    fn test_merge_orders_by_day() {
        let dataset = Dataset::merge_days(vec![
            (key(3), vec![row("20240103", "C")]),
            (key(1), vec![row("20240101", "A1"), row("20240101", "A2")]),
            (key(2), vec![row("20240102", "B")]),
        ]);

        let stations: Vec<&str> = dataset
            .iter()
            .map(|r| r["SBWY_STNS_NM"].as_str().unwrap())
            .collect();
        assert_eq!(stations, ["A1", "A2", "B", "C"]);
    }

    #[test]
    fn test_merge_ignores_input_permutation() {
        let batches = vec![
            (key(1), vec![row("20240101", "A")]),
            (key(2), vec![row("20240102", "B")]),
            (key(3), vec![row("20240103", "C")]),
        ];
        let forward = Dataset::merge_days(batches.clone());
        let mut reversed_batches = batches;
        reversed_batches.reverse();
        let reversed = Dataset::merge_days(reversed_batches);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_merge_skips_empty_days() {
        let dataset = Dataset::merge_days(vec![
            (key(1), vec![]),
            (key(2), vec![row("20240102", "B")]),
        ]);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_columns_keep_source_order() {
        let dataset = Dataset::new(vec![row("20240101", "A")]);
        assert_eq!(
            dataset.columns(),
            ["USE_YMD", "SBWY_STNS_NM", "GTON_TNOPE"]
        );
    }

    #[test]
    fn test_columns_append_late_fields() {
        let mut second = row("20240101", "B");
        second.insert("EXTRA".to_string(), json!("x"));
        let dataset = Dataset::new(vec![row("20240101", "A"), second]);
        assert_eq!(dataset.columns().last().unwrap(), "EXTRA");
        assert_eq!(dataset.columns().len(), 4);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert!(dataset.is_empty());
        assert!(dataset.columns().is_empty());
    }
}
