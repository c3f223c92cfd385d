use serde::{Deserialize, Serialize};

/// One ledger record: a year, a set of tags, and structured payload data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub year: u32,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// The yearly-snapshot tag. Entries carrying only this tag are bookkeeping,
/// not happenings, and do not count against a "quiet year".
pub const YEAR_TAG: &str = "year";

/// Append-only, queryable event ledger. Communities keep one entry per
/// simulated year plus incident records; polycules keep incident records
/// only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Record>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, year: u32, tags: Vec<String>, payload: serde_json::Value) {
        self.entries.push(Record {
            year,
            tags,
            payload,
        });
    }

    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn in_year(&self, year: u32) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter(move |r| r.year == year)
    }

    pub fn in_range(&self, from: u32, to: u32) -> impl Iterator<Item = &Record> {
        self.entries
            .iter()
            .filter(move |r| r.year >= from && r.year <= to)
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Record> {
        self.entries
            .iter()
            .filter(move |r| r.tags.iter().any(|t| t == tag))
    }

    /// A year is quiet when nothing beyond the yearly snapshot was recorded.
    pub fn was_quiet(&self, year: u32) -> bool {
        !self
            .in_year(year)
            .any(|r| r.tags.iter().any(|t| t != YEAR_TAG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> History {
        let mut h = History::new();
        h.add(10, vec![YEAR_TAG.into()], json!({"population": 24}));
        h.add(11, vec![YEAR_TAG.into()], json!({"population": 25}));
        h.add(11, vec!["formed".into()], json!({"members": [3, 9]}));
        h.add(14, vec!["dissolved".into()], json!({"responsible": 3}));
        h
    }

    #[test]
    fn queries_by_year_tag_and_range() {
        let h = sample();
        assert_eq!(h.in_year(11).count(), 2);
        assert_eq!(h.with_tag("formed").count(), 1);
        assert_eq!(h.in_range(10, 11).count(), 3);
        assert_eq!(h.in_range(12, 13).count(), 0);
    }

    #[test]
    fn quiet_years_ignore_yearly_snapshots() {
        let h = sample();
        assert!(h.was_quiet(10));
        assert!(!h.was_quiet(11));
        assert!(!h.was_quiet(14));
        // No record at all is also quiet.
        assert!(h.was_quiet(12));
    }
}
