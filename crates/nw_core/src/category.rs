use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Topical filter accepted by the category feed. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Sports,
    Entertainment,
    Health,
    Science,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Technology,
        Category::Business,
        Category::Sports,
        Category::Entertainment,
        Category::Health,
        Category::Science,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput("Invalid category".to_string()))
    }
}
