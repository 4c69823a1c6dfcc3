//! Request and response bodies for the relay HTTP API.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::tasks::{TaskConfig, TaskId};

/// Body of `POST /api/tasks`. List fields are line-delimited text, as a
/// form textarea would submit them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub label_prefix: String,
    #[serde(default)]
    pub messages: String,
    #[serde(default)]
    pub credentials: String,
    /// Number or numeric string.
    #[serde(default)]
    pub interval_seconds: Option<serde_json::Value>,
}

impl CreateTaskRequest {
    /// Normalise into a task configuration. Blank lines are dropped, an
    /// unparsable interval falls back to `default_interval`, and anything
    /// below one second is raised to one.
    pub fn to_config(&self, default_interval: u64) -> TaskConfig {
        TaskConfig {
            target: self.target.trim().to_string(),
            label_prefix: self.label_prefix.trim().to_string(),
            messages: split_lines(&self.messages),
            credentials: split_lines(&self.credentials)
                .into_iter()
                .map(SecretString::from)
                .collect(),
            interval_seconds: parse_interval(self.interval_seconds.as_ref(), default_interval),
        }
    }
}

/// Non-empty trimmed lines of `text`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_interval(value: Option<&serde_json::Value>, default: u64) -> u64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(secs) if secs < 1 => 1,
        Some(secs) => secs as u64,
        None => default.max(1),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn split_lines_drops_blanks() {
        assert_eq!(
            split_lines("  first \n\n\r\nsecond\n   \n"),
            vec!["first", "second"]
        );
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn interval_parsing_follows_form_rules() {
        assert_eq!(parse_interval(Some(&json!(15)), 60), 15);
        assert_eq!(parse_interval(Some(&json!("20")), 60), 20);
        assert_eq!(parse_interval(Some(&json!(0)), 60), 1);
        assert_eq!(parse_interval(Some(&json!("-4")), 60), 1);
        assert_eq!(parse_interval(Some(&json!("soon")), 60), 60);
        assert_eq!(parse_interval(None, 60), 60);
    }

    #[test]
    fn request_becomes_config() {
        let request = CreateTaskRequest {
            target: " 1234 ".into(),
            label_prefix: "team".into(),
            messages: "one\ntwo\n".into(),
            credentials: "tok-a\n\ntok-b".into(),
            interval_seconds: Some(json!("5")),
        };
        let config = request.to_config(60);
        assert_eq!(config.target, "1234");
        assert_eq!(config.messages, vec!["one", "two"]);
        assert_eq!(config.credentials.len(), 2);
        assert_eq!(config.interval_seconds, 5);
        assert!(config.validate().is_ok());
    }
}
