use std::fmt;

use serde_json::{json, Value};

/// One search request. A filter without `text` is the root of its cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryFilter {
    pub text: Option<String>,
    pub category_id: Option<u32>,
    pub language_id: Option<u32>,
    pub special_code: Option<String>,
}

impl QueryFilter {
    pub fn category(category_id: u32, language_id: u32) -> Self {
        Self {
            category_id: Some(category_id),
            language_id: Some(language_id),
            ..Self::default()
        }
    }

    pub fn special(code: &str) -> Self {
        Self {
            special_code: Some(code.to_string()),
            ..Self::default()
        }
    }

    /// Sibling of `self` in query space, narrowed by a free-text term.
    pub fn with_text(&self, term: impl Into<String>) -> Self {
        Self {
            text: Some(term.into()),
            ..self.clone()
        }
    }

    pub fn is_root(&self) -> bool {
        self.text.is_none()
    }

    /// JSON body of the search endpoint. Unset values go out as `null` or `[]`.
    pub fn to_body(&self) -> Value {
        json!({
            "searchText": self.text,
            "einsatzortId": null,
            "einsatzdauer": null,
            "taetigkeitsbereichId": self.category_id.into_iter().collect::<Vec<_>>(),
            "spracheId": self.language_id.into_iter().collect::<Vec<_>>(),
            "pflichtenheftKennzeichnungSpeziellCodeList":
                self.special_code.iter().collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(code) = &self.special_code {
            parts.push(format!("special={code}"));
        }
        if let Some(id) = self.category_id {
            parts.push(format!("category={id}"));
        }
        if let Some(id) = self.language_id {
            parts.push(format!("language={id}"));
        }
        if let Some(text) = &self.text {
            parts.push(format!("text={text:?}"));
        }
        write!(f, "[{}]", parts.join(" "))
    }
}
