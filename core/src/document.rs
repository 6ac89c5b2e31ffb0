use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-assigned document identifier, unique within one indexing session.
pub type DocId = String;

/// term -> occurrences within a single document
pub type TfVector = HashMap<String, u32>;

/// A retrieved web document.
///
/// `id`, `url` and `description` come from the document source. `body` and
/// `tf_vector` stay `None` until a worker has processed the record, after which
/// they are never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "ID", alias = "id")]
    pub id: DocId,
    #[serde(rename = "Url", alias = "url")]
    pub url: String,
    /// Short search-result summary, used as the body when fetching fails.
    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,
    #[serde(rename = "Title", alias = "title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Body", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "tfVector", default, skip_serializing_if = "Option::is_none")]
    pub tf_vector: Option<TfVector>,
}

impl Document {
    pub fn new(id: impl Into<DocId>, url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            description: description.into(),
            title: None,
            body: None,
            tf_vector: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.body.is_some() && self.tf_vector.is_some()
    }

    /// Number of admitted tokens, i.e. the sum of the tf vector.
    pub fn admitted_tokens(&self) -> u64 {
        self.tf_vector
            .as_ref()
            .map_or(0, |tf| tf.values().map(|&n| n as u64).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_search_result_fields() {
        let doc: Document = serde_json::from_str(
            r#"{"ID":"a1","Url":"http://example.com","Description":"cats","Title":"Cats"}"#,
        )
        .unwrap();
        assert_eq!(doc.id, "a1");
        assert_eq!(doc.title.as_deref(), Some("Cats"));
        assert!(!doc.is_processed());
        assert_eq!(doc.admitted_tokens(), 0);
    }

    #[test]
    fn accepts_lowercase_aliases() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"b","url":"http://b.example"}"#).unwrap();
        assert_eq!(doc.id, "b");
        assert_eq!(doc.description, "");
    }
}
