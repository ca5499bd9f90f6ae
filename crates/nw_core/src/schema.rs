//! Shape checks for payloads coming back from the news API.
//!
//! This is the only place upstream data is trusted. Both validators walk the
//! untyped JSON, collect every violation they find, and only build the typed
//! value when there are none.

use std::fmt;

use serde_json::{Map, Value};
use url::Url;

use crate::types::{Article, FeedResponse, Source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    WrongType { expected: &'static str },
    InvalidUrl,
    OutOfRange,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => f.write_str("required field is missing"),
            Problem::WrongType { expected } => write!(f, "expected {}", expected),
            Problem::InvalidUrl => f.write_str("not an absolute URL"),
            Problem::OutOfRange => f.write_str("out of range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(path: impl Into<String>, problem: Problem) -> Self {
        Self {
            issues: vec![FieldIssue {
                path: path.into(),
                problem,
            }],
        }
    }

    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let path = if issue.path.is_empty() { "value" } else { &issue.path };
            write!(f, "{}: {}", path, issue.problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, path: String, problem: Problem) {
        self.0.push(FieldIssue { path, problem });
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => {
                self.push(path.to_string(), Problem::WrongType { expected: "object" });
                None
            }
        }
    }

    fn required_str(&mut self, obj: &Map<String, Value>, prefix: &str, key: &str) -> Option<String> {
        match obj.get(key) {
            None => {
                self.push(join(prefix, key), Problem::Missing);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(join(prefix, key), Problem::WrongType { expected: "string" });
                None
            }
        }
    }

    fn optional_str(&mut self, obj: &Map<String, Value>, prefix: &str, key: &str) -> Option<String> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(join(prefix, key), Problem::WrongType { expected: "string or null" });
                None
            }
        }
    }

    fn absolute_url(&mut self, raw: Option<&str>, prefix: &str, key: &str) {
        if let Some(raw) = raw {
            if Url::parse(raw).is_err() {
                self.push(join(prefix, key), Problem::InvalidUrl);
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(ValidationError { issues: self.0 }),
        }
    }
}

fn source_at(value: Option<&Value>, prefix: &str, issues: &mut Issues) -> Option<Source> {
    let path = join(prefix, "source");
    let Some(value) = value else {
        issues.push(path, Problem::Missing);
        return None;
    };
    let obj = issues.object(value, &path)?;
    let id = issues.optional_str(obj, &path, "id");
    let name = issues.required_str(obj, &path, "name")?;
    Some(Source { id, name })
}

fn article_at(value: &Value, prefix: &str, issues: &mut Issues) -> Option<Article> {
    let obj = issues.object(value, prefix)?;

    let source = source_at(obj.get("source"), prefix, issues);
    let author = issues.optional_str(obj, prefix, "author");
    let title = issues.required_str(obj, prefix, "title");
    let description = issues.optional_str(obj, prefix, "description");
    let url = issues.required_str(obj, prefix, "url");
    issues.absolute_url(url.as_deref(), prefix, "url");
    let url_to_image = issues.optional_str(obj, prefix, "urlToImage");
    issues.absolute_url(url_to_image.as_deref(), prefix, "urlToImage");
    let published_at = issues.required_str(obj, prefix, "publishedAt");
    let content = issues.optional_str(obj, prefix, "content");

    Some(Article {
        source: source?,
        author,
        title: title?,
        description,
        url: url?,
        url_to_image,
        published_at: published_at?,
        content,
    })
}

fn total_results_at(obj: &Map<String, Value>, issues: &mut Issues) -> Option<u64> {
    let Some(value) = obj.get("totalResults") else {
        issues.push("totalResults".to_string(), Problem::Missing);
        return None;
    };
    let Value::Number(n) = value else {
        issues.push("totalResults".to_string(), Problem::WrongType { expected: "integer" });
        return None;
    };
    if let Some(total) = n.as_u64() {
        return Some(total);
    }
    if n.as_i64().is_some() {
        issues.push("totalResults".to_string(), Problem::OutOfRange);
        return None;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        Some(f) if f.fract() == 0.0 => {
            issues.push("totalResults".to_string(), Problem::OutOfRange);
            None
        }
        _ => {
            issues.push("totalResults".to_string(), Problem::WrongType { expected: "integer" });
            None
        }
    }
}

/// Validates a single upstream article.
pub fn validate_article(value: &Value) -> Result<Article, ValidationError> {
    let mut issues = Issues::default();
    let article = article_at(value, "", &mut issues);
    issues.finish(article)
}

/// Validates a full `{status, totalResults, articles}` response. Any
/// violation anywhere rejects the whole payload.
pub fn validate_feed(value: &Value) -> Result<FeedResponse, ValidationError> {
    let mut issues = Issues::default();
    let Some(obj) = issues.object(value, "") else {
        return issues.finish(None);
    };

    let status = issues.required_str(obj, "", "status");
    let total_results = total_results_at(obj, &mut issues);

    let articles = match obj.get("articles") {
        None => {
            issues.push("articles".to_string(), Problem::Missing);
            None
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| article_at(item, &format!("articles[{}]", i), &mut issues))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Option<Vec<_>>>(),
        Some(_) => {
            issues.push("articles".to_string(), Problem::WrongType { expected: "array" });
            None
        }
    };

    let feed = match (status, total_results, articles) {
        (Some(status), Some(total_results), Some(articles)) => Some(FeedResponse {
            status,
            total_results,
            articles,
        }),
        _ => None,
    };
    issues.finish(feed)
}
