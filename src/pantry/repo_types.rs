use serde::{Deserialize, Serialize};

/// One stocked ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    /// Set by the user; never derived from quantity.
    #[serde(default)]
    pub low_stock: bool,
}

pub const CATEGORIES: [&str; 8] = [
    "All",
    "Grains",
    "Lentils",
    "Spices",
    "Fats",
    "Dairy",
    "Vegetables",
    "Other",
];

fn item(
    id: &str,
    name: &str,
    category: &str,
    quantity: f64,
    unit: &str,
    expiry_date: Option<&str>,
    low_stock: bool,
) -> PantryItem {
    PantryItem {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        quantity,
        unit: unit.into(),
        expiry_date: expiry_date.map(str::to_owned),
        low_stock,
    }
}

/// Starter pantry shown until the user has saved one.
pub fn seed_items() -> Vec<PantryItem> {
    vec![
        item("1", "Basmati Rice", "Grains", 2.0, "kg", None, false),
        item("2", "Toor Dal", "Lentils", 0.5, "kg", None, true),
        item("3", "Turmeric Powder", "Spices", 100.0, "g", None, false),
        item("4", "Garam Masala", "Spices", 50.0, "g", None, true),
        item("5", "Ghee", "Fats", 500.0, "ml", None, false),
        item("6", "Paneer", "Dairy", 200.0, "g", Some("2025-01-25"), false),
        item("7", "Tomatoes", "Vegetables", 1.0, "kg", Some("2025-01-22"), false),
        item("8", "Onions", "Vegetables", 2.0, "kg", None, false),
    ]
}
