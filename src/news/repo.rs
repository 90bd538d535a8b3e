use anyhow::Context;

use super::repo_types::Article;
use crate::catalog::repo::ALL;

const BUNDLED_ARTICLES: &str = include_str!("../../data/news-articles.json");

/// Static article list for the news screen.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    articles: Vec<Article>,
}

impl NewsFeed {
    pub fn bundled() -> anyhow::Result<Self> {
        let articles = serde_json::from_str(BUNDLED_ARTICLES).context("parse bundled articles")?;
        Ok(Self::new(articles))
    }

    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn list(&self, category: Option<&str>, search: Option<&str>) -> Vec<&Article> {
        let category = category.unwrap_or(ALL);
        let needle = search.unwrap_or("").to_lowercase();
        self.articles
            .iter()
            .filter(|a| category == ALL || a.category == category)
            .filter(|a| a.matches(&needle))
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut out = vec![ALL.to_owned()];
        for a in &self.articles {
            if !out.contains(&a.category) {
                out.push(a.category.clone());
            }
        }
        out
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }
}
