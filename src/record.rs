use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Dimension values under which a record was discovered.
/// The API doesn't echo them back, so they are attached on our side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags {
    pub languages: BTreeSet<String>,
    pub specials: BTreeSet<String>,
}

impl Tags {
    pub fn language(code: &str) -> Self {
        Self {
            languages: BTreeSet::from([code.to_string()]),
            ..Self::default()
        }
    }

    pub fn special(name: &str) -> Self {
        Self {
            specials: BTreeSet::from([name.to_string()]),
            ..Self::default()
        }
    }

    pub fn union(&mut self, other: &Tags) {
        self.languages.extend(other.languages.iter().cloned());
        self.specials.extend(other.specials.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.specials.is_empty()
    }
}

/// One search hit. Only `id` is interpreted; every wire field is kept as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip)]
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "discovery", skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Record {
    /// Builds a record from a wire object, reading its identity from `id_field`.
    pub fn from_value(value: Value, id_field: &str) -> Result<Self> {
        let missing = || Error::MissingId {
            field: id_field.to_string(),
        };
        let Value::Object(fields) = value else {
            return Err(missing());
        };
        let id = fields
            .get(id_field)
            .and_then(Value::as_u64)
            .ok_or_else(missing)?;
        Ok(Self {
            id,
            fields,
            tags: Tags::default(),
        })
    }

    pub fn tagged(mut self, tags: &Tags) -> Self {
        self.tags.union(tags);
        self
    }
}
