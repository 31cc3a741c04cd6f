use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single persisted prompt/response record.
///
/// `engine` is always present in the serialized shape and is `null` when the
/// caller did not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub prompt: String,
    pub response: String,
    pub engine: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

/// Caller-side input for [`crate::store::Store::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLogEntry {
    pub prompt: String,
    pub response: String,
    pub engine: Option<String>,
    pub tags: Vec<String>,
}

impl NewLogEntry {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            ..Self::default()
        }
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Filters applied by [`crate::store::Store::list`]. Empty strings are
/// treated as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub engine: Option<String>,
    pub tag: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(engine) = non_empty(&self.engine) {
            if entry.engine.as_deref() != Some(engine) {
                return false;
            }
        }
        if let Some(tag) = non_empty(&self.tag) {
            if !entry.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// One page of list results. `total` counts every match before truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPage {
    pub logs: Vec<LogEntry>,
    pub total: usize,
}

/// Current time as ISO-8601 UTC with millisecond precision, e.g.
/// `2024-05-01T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
