use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::record::Record;

/// Merges records by `id`, keeping first-seen order and unioning tags of repeats.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    positions: HashMap<u64, usize>,
    records: Vec<Record>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id wasn't seen before.
    pub fn insert(&mut self, record: Record) -> bool {
        match self.positions.get(&record.id) {
            Some(&pos) => {
                self.records[pos].tags.union(&record.tags);
                false
            }
            None => {
                self.positions.insert(record.id, self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    /// Returns how many of the records were new.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        records.into_iter().map(|r| self.insert(r) as usize).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

pub fn dedup(records: impl IntoIterator<Item = Record>) -> Vec<Record> {
    let mut merged = Deduplicator::new();
    merged.extend(records);
    merged.into_records()
}

/// Whether records turned up under more than one language.
/// Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageOverlap {
    /// Unique ids that carry at least one language tag.
    pub unique: usize,
    /// Sum of unique ids per language.
    pub per_language_sum: usize,
    pub per_language: BTreeMap<String, usize>,
}

impl LanguageOverlap {
    pub fn from_records(records: &[Record]) -> Self {
        let mut overlap = Self::default();
        for record in records.iter().filter(|r| !r.tags.languages.is_empty()) {
            overlap.unique += 1;
            for lang in &record.tags.languages {
                *overlap.per_language.entry(lang.clone()).or_default() += 1;
                overlap.per_language_sum += 1;
            }
        }
        overlap
    }

    pub fn has_multi_language(&self) -> bool {
        self.per_language_sum > self.unique
    }
}
