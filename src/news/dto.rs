use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}
