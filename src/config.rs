//! Run configuration.
//!
//! Everything the orchestrator needs to know about the remote dataset lives in
//! [`Config`]: the cap, the term alphabet, the width range and the id tables of
//! the query dimensions. [`Config::default`] carries the values of the live
//! service; tests build small synthetic configs instead.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{coverage::Plan, Error, Result, DEFAULT_CAP};

/// A named id in one of the dimension tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    /// Short code attached to records as a tag, e.g. `DE`.
    pub code: String,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Special {
    /// Flag name attached to records as a tag, e.g. `ausland`.
    pub name: String,
    /// Code sent in the special-code filter list.
    pub code: String,
}

/// Which categories may end in a best-effort result on their last width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
    #[default]
    None,
    All,
    Categories(BTreeSet<u32>),
}

impl PartialPolicy {
    pub fn allows(&self, category_id: u32) -> bool {
        match self {
            PartialPolicy::None => false,
            PartialPolicy::All => true,
            PartialPolicy::Categories(ids) => ids.contains(&category_id),
        }
    }

    /// Parses the CLI form: `all`, `none` or a comma separated list of category ids.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "all" => Ok(PartialPolicy::All),
            "none" | "" => Ok(PartialPolicy::None),
            list => list
                .split(',')
                .map(|id| {
                    id.trim()
                        .parse::<u32>()
                        .map_err(|_| Error::Config(format!("`{id}` is not a category id")))
                })
                .collect::<Result<BTreeSet<_>>>()
                .map(PartialPolicy::Categories),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of records a single search returns.
    pub cap: usize,
    /// Letters combined into free-text partition terms.
    pub alphabet: Vec<char>,
    pub min_width: usize,
    /// 0 disables brute force for category cells.
    pub max_width: usize,
    pub allow_partial: PartialPolicy,
    /// Number of cells processed at once. 1 runs strictly sequentially.
    pub workers: usize,
    pub timeout_secs: u64,
    /// Name of the integer identity field in wire records.
    pub id_field: String,
    pub endpoint: String,
    pub locale: String,
    pub languages: Vec<Language>,
    pub categories: Vec<Category>,
    pub specials: Vec<Special>,
}

impl Default for Config {
    fn default() -> Self {
        let languages = [("DE", 1857), ("FR", 1859), ("IT", 1860)]
            .into_iter()
            .map(|(code, id)| Language { code: code.into(), id })
            .collect();
        let categories = [
            ("gesundheit", 3000),
            ("sozialwesen", 3009),
            ("kulturguetererhaltung", 3036),
            ("umwelt", 3045),
            ("landwirtschaft", 3053),
            ("entwicklungshilfe", 3060),
            ("katastrophen", 3064),
            ("schulwesen", 3068),
        ]
        .into_iter()
        .map(|(name, id)| Category { name: name.into(), id })
        .collect();
        let specials = [
            ("ausland", "PH_AUSLAND"),
            ("lager", "PH_LAGER"),
            ("schwerpunkt", "PH_SCHWERPUNKT_PROGRAMM"),
        ]
        .into_iter()
        .map(|(name, code)| Special { name: name.into(), code: code.into() })
        .collect();

        Self {
            cap: DEFAULT_CAP,
            alphabet: ('a'..='z').collect(),
            min_width: 1,
            max_width: 3,
            allow_partial: PartialPolicy::None,
            workers: 1,
            timeout_secs: 30,
            id_field: "pflichtenheftId".into(),
            endpoint: "https://ziviconnect.admin.ch/web-zdp/api".into(),
            locale: "de-CH".into(),
            languages,
            categories,
            specials,
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing keys keep their default values.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        self.plan(false).validate()?;
        let unique: BTreeSet<&char> = self.alphabet.iter().collect();
        if unique.len() != self.alphabet.len() {
            return Err(Error::Config("alphabet contains repeated letters".into()));
        }
        let codes: BTreeSet<&str> = self.specials.iter().map(|s| s.code.as_str()).collect();
        if codes.len() != self.specials.len() {
            return Err(Error::Config(
                "two special flags share the same code".into(),
            ));
        }
        Ok(())
    }

    /// Expansion plan for a category cell.
    pub fn plan(&self, allow_partial: bool) -> Plan {
        Plan {
            cap: self.cap,
            alphabet: self.alphabet.clone(),
            min_width: self.min_width,
            max_width: self.max_width,
            allow_partial,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
