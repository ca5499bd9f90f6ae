use serde::{Deserialize, Serialize};

use crate::{Category, Error, Result};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<Category>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: None,
            category: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank queries are treated as no query at all.
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        let q = q.into();
        let trimmed = q.trim();
        self.q = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_page(mut self, page: u32) -> Result<Self> {
        if page < 1 {
            return Err(Error::InvalidInput("page must be at least 1".to_string()));
        }
        self.page = page;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self> {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(Error::InvalidInput(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Query-string pairs in a fixed order, leaving out values equal to
    /// their defaults so equivalent parameter sets serialize identically.
    pub fn normalized_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if self.page != DEFAULT_PAGE {
            pairs.push(("page", self.page.to_string()));
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            pairs.push(("pageSize", self.page_size.to_string()));
        }
        pairs
    }
}
