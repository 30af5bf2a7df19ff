//! Request-scoped page state.
//!
//! The page is the structured half of a response: front matter merged into
//! `data`, markdown output appended to `html`, and whatever other fields code
//! artifacts choose to set. It serializes to a flat JSON object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accumulated page payload shared by every layer of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    /// Merged front matter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// HTML rendered from markdown bodies, in layer order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Any other field set by code artifacts.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PageState {
    /// Deep-merge `incoming` into `data`, creating it if needed.
    ///
    /// Nested objects merge key by key and arrays merge index by index, so
    /// earlier entries past the end of a shorter incoming array survive.
    /// Any other pairing replaces the existing value.
    pub fn merge_data(&mut self, incoming: Map<String, Value>) {
        let data = self.data.get_or_insert_with(Map::new);
        deep_merge(data, incoming);
    }

    /// Append rendered HTML to `html`, creating it if needed.
    pub fn append_html(&mut self, fragment: &str) {
        self.html.get_or_insert_with(String::new).push_str(fragment);
    }

    /// True when no layer has written anything.
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.html.is_none() && self.fields.is_empty()
    }

    /// JSON view handed to scripts and templates.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Rebuild a page from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn deep_merge(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(nested)) => deep_merge(existing, nested),
        (Value::Array(existing), Value::Array(items)) => {
            for (i, item) in items.into_iter().enumerate() {
                match existing.get_mut(i) {
                    Some(slot) => merge_value(slot, item),
                    None => existing.push(item),
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_later_front_matter_wins() {
        let mut page = PageState::default();
        page.merge_data(object(json!({"a": 1})));
        page.merge_data(object(json!({"a": 2, "b": 3})));
        assert_eq!(Value::Object(page.data.unwrap()), json!({"a": 2, "b": 3}));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let mut page = PageState::default();
        page.merge_data(object(json!({"site": {"title": "Base", "nav": ["home", "about"]}})));
        page.merge_data(object(json!({"site": {"title": "Blog", "nav": ["posts"], "lang": "en"}})));
        assert_eq!(
            Value::Object(page.data.unwrap()),
            json!({"site": {"title": "Blog", "nav": ["posts", "about"], "lang": "en"}})
        );
    }

    #[test]
    fn test_arrays_merge_by_index() {
        let mut page = PageState::default();
        page.merge_data(object(json!({
            "tags": ["a", "b", "c"],
            "nav": [{"t": "home", "u": "/"}]
        })));
        page.merge_data(object(json!({
            "tags": ["x"],
            "nav": [{"t": "Home"}, {"t": "Blog", "u": "/blog"}]
        })));
        assert_eq!(
            Value::Object(page.data.unwrap()),
            json!({
                "tags": ["x", "b", "c"],
                "nav": [{"t": "Home", "u": "/"}, {"t": "Blog", "u": "/blog"}]
            })
        );
    }

    #[test]
    fn test_array_and_scalar_replace_each_other() {
        let mut page = PageState::default();
        page.merge_data(object(json!({"tags": ["a"], "n": 1})));
        page.merge_data(object(json!({"tags": "none", "n": [1, 2]})));
        assert_eq!(Value::Object(page.data.unwrap()), json!({"tags": "none", "n": [1, 2]}));
    }

    #[test]
    fn test_scalar_replaces_object_and_back() {
        let mut page = PageState::default();
        page.merge_data(object(json!({"author": {"name": "A"}})));
        page.merge_data(object(json!({"author": "anonymous"})));
        page.merge_data(object(json!({"author": {"name": "B"}})));
        assert_eq!(Value::Object(page.data.unwrap()), json!({"author": {"name": "B"}}));
    }

    #[test]
    fn test_html_appends_in_order() {
        let mut page = PageState::default();
        page.append_html("X");
        page.append_html("Y");
        assert_eq!(page.html.as_deref(), Some("XY"));
    }

    #[test]
    fn test_serializes_flat() {
        let mut page = PageState::default();
        assert_eq!(page.to_value(), json!({}));
        assert!(page.is_empty());

        page.fields.insert("user".into(), json!("sam"));
        page.append_html("<p>hi</p>");
        assert_eq!(page.to_value(), json!({"html": "<p>hi</p>", "user": "sam"}));
    }

    #[test]
    fn test_from_value_splits_known_fields() {
        let page = PageState::from_value(json!({
            "data": {"title": "T"},
            "html": "",
            "count": 3
        }))
        .unwrap();
        assert_eq!(page.data.unwrap()["title"], json!("T"));
        assert_eq!(page.html.as_deref(), Some(""));
        assert_eq!(page.fields["count"], json!(3));
    }

    #[test]
    fn test_from_value_rejects_non_object_data() {
        assert!(PageState::from_value(json!({"data": 5})).is_err());
        assert!(PageState::from_value(json!({"html": ["x"]})).is_err());
    }
}
