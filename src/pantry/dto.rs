use serde::Deserialize;

fn default_category() -> String {
    "Grains".into()
}

fn default_unit() -> String {
    "kg".into()
}

#[derive(Debug, Deserialize)]
pub struct NewPantryItem {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityChange {
    pub delta: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PantryQuery {
    pub category: Option<String>,
}
