use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DishQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub vegetarian_only: bool,
}
