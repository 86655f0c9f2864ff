#![allow(dead_code)]
//! Synthetic search backends for the integration tests.
//!
//! Both executors record every filter they were asked for, so tests can assert
//! exactly which terms were scanned. Fixtures use a short alphabet and a tiny
//! cap to keep the term space small.

use std::sync::Mutex;

use capsweep::{
    config::{Category, Config, Language, PartialPolicy, Special},
    filter::QueryFilter,
    record::Record,
    request::SearchExecutor,
    Error, Result,
};
use serde_json::json;

pub fn record(id: u64) -> Record {
    Record::from_value(json!({ "id": id }), "id").unwrap()
}

pub fn ids(records: &[Record]) -> Vec<u64> {
    records.iter().map(|r| r.id).collect()
}

pub fn alphabet() -> Vec<char> {
    vec!['a', 'b', 'c', 'd']
}

/// Two languages, two categories, two specials, cap 5, letters `a..=f`.
pub fn small_config() -> Config {
    Config {
        cap: 5,
        alphabet: ('a'..='f').collect(),
        min_width: 1,
        max_width: 2,
        allow_partial: PartialPolicy::None,
        workers: 1,
        id_field: "id".into(),
        languages: vec![
            Language { code: "DE".into(), id: 1 },
            Language { code: "FR".into(), id: 2 },
        ],
        categories: vec![
            Category { name: "health".into(), id: 10 },
            Category { name: "farming".into(), id: 20 },
        ],
        specials: vec![
            Special { name: "abroad".into(), code: "S_ABROAD".into() },
            Special { name: "camp".into(), code: "S_CAMP".into() },
        ],
        ..Config::default()
    }
}

/// Answers each filter with the ids returned by a closure.
pub struct Scripted<F> {
    script: F,
    pub calls: Mutex<Vec<QueryFilter>>,
}

impl<F> Scripted<F>
where
    F: Fn(&QueryFilter) -> Vec<u64> + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Free-text terms in the order they were searched, root queries as `""`.
    pub fn terms(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.text.clone().unwrap_or_default())
            .collect()
    }
}

impl<F> SearchExecutor for Scripted<F>
where
    F: Fn(&QueryFilter) -> Vec<u64> + Send + Sync,
{
    async fn search(&self, filter: &QueryFilter) -> Result<Vec<Record>> {
        self.calls.lock().unwrap().push(filter.clone());
        if filter.text.as_deref() == Some("fail") {
            return Err(Error::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                url: "scripted".into(),
            });
        }
        Ok((self.script)(filter).into_iter().map(record).collect())
    }
}

/// A stored document of the fake dataset.
#[derive(Debug, Clone)]
pub struct Doc {
    pub id: u64,
    pub text: String,
    pub category: Option<u32>,
    pub languages: Vec<u32>,
    pub special: Option<String>,
}

impl Doc {
    pub fn category(id: u64, text: &str, category: u32, languages: &[u32]) -> Self {
        Self {
            id,
            text: text.into(),
            category: Some(category),
            languages: languages.to_vec(),
            special: None,
        }
    }

    pub fn special(id: u64, text: &str, code: &str) -> Self {
        Self {
            id,
            text: text.into(),
            category: None,
            languages: Vec::new(),
            special: Some(code.into()),
        }
    }

    fn matches(&self, filter: &QueryFilter) -> bool {
        let category = filter.category_id.map_or(true, |c| self.category == Some(c));
        let language = filter
            .language_id
            .map_or(true, |l| self.languages.contains(&l));
        let special = filter
            .special_code
            .as_ref()
            .map_or(true, |s| self.special.as_ref() == Some(s));
        // A term matches when all of its letters occur in the text.
        let text = filter
            .text
            .as_ref()
            .map_or(true, |t| t.chars().all(|c| self.text.contains(c)));
        category && language && special && text
    }
}

/// In-memory search that truncates every answer at `cap`.
pub struct FakeSearch {
    pub cap: usize,
    pub docs: Vec<Doc>,
    /// Searches in this category fail with a bad status.
    pub failing_category: Option<u32>,
    pub calls: Mutex<Vec<QueryFilter>>,
}

impl FakeSearch {
    pub fn new(cap: usize, docs: Vec<Doc>) -> Self {
        Self {
            cap,
            docs,
            failing_category: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<QueryFilter> {
        self.calls.lock().unwrap().clone()
    }

    pub fn true_ids(&self, filter: &QueryFilter) -> Vec<u64> {
        self.docs
            .iter()
            .filter(|d| d.matches(filter))
            .map(|d| d.id)
            .collect()
    }
}

impl SearchExecutor for FakeSearch {
    async fn search(&self, filter: &QueryFilter) -> Result<Vec<Record>> {
        self.calls.lock().unwrap().push(filter.clone());
        if self.failing_category.is_some() && filter.category_id == self.failing_category {
            return Err(Error::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                url: "fake".into(),
            });
        }
        Ok(self
            .docs
            .iter()
            .filter(|d| d.matches(filter))
            .take(self.cap)
            .map(|d| {
                Record::from_value(json!({ "id": d.id, "text": d.text }), "id").unwrap()
            })
            .collect())
    }
}

/// Every two-letter combination of `a..=f`, `per_pair` docs each, in `category`.
pub fn dense_docs(first_id: u64, per_pair: u64, category: u32, languages: &[u32]) -> Vec<Doc> {
    let letters: Vec<char> = ('a'..='f').collect();
    let mut docs = Vec::new();
    let mut id = first_id;
    for (i, x) in letters.iter().enumerate() {
        for y in &letters[i + 1..] {
            for _ in 0..per_pair {
                docs.push(Doc::category(id, &format!("{x}{y}"), category, languages));
                id += 1;
            }
        }
    }
    docs
}
