//! Classification of chat-engine response fragments

use serde_json::Value;

/// One fragment of a streamed chat-engine response
///
/// The engine yields either structured records or raw strings; only some of
/// them carry user-visible text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFragment {
    /// A structured record (e.g. `{"type": "message", "content": "..."}`)
    Record(Value),
    /// A raw string, possibly holding JSON
    Raw(String),
}

impl ResponseFragment {
    /// The text this fragment contributes to the final response
    ///
    /// Message records contribute their `content`; any other record
    /// contributes nothing. Raw strings that parse as JSON contribute their
    /// `response` field (empty if absent); other raw strings are verbatim.
    pub fn text(&self) -> String {
        match self {
            ResponseFragment::Record(record) => {
                if record.get("type").and_then(Value::as_str) == Some("message") {
                    record
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                } else {
                    String::new()
                }
            }
            ResponseFragment::Raw(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => parsed
                    .get("response")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Err(_) => raw.clone(),
            },
        }
    }
}

impl From<Value> for ResponseFragment {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ResponseFragment::Raw(s),
            other => ResponseFragment::Record(other),
        }
    }
}

impl From<&str> for ResponseFragment {
    fn from(value: &str) -> Self {
        ResponseFragment::Raw(value.to_string())
    }
}

/// Join the text of every fragment and trim the result
pub fn collect_response<I>(fragments: I) -> String
where
    I: IntoIterator,
    I::Item: Into<ResponseFragment>,
{
    let joined: String = fragments
        .into_iter()
        .map(|f| f.into().text())
        .collect();
    joined.trim().to_string()
}
