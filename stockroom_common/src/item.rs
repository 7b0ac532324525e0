//! Inventory records and the scope they belong to

use crate::coerce::{parse_price, parse_quantity, QuantityDefault};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Flat field-map as persisted by a record store
pub type Document = serde_json::Map<String, Value>;

/// Namespace of one user's inventory, derived from the authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Returns `None` for a blank identity.
    pub fn new(user_id: impl Into<String>) -> Option<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            None
        } else {
            Some(Scope(user_id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection path of this scope's records, e.g. `users/abc/inventory`
    pub fn collection_path(&self) -> String {
        format!("users/{}/inventory", self.0)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named inventory record. The name is the store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub supplier: String,
}

impl InventoryItem {
    /// A record with quantity 0 and empty optional fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 0,
            description: String::new(),
            price: 0.0,
            supplier: String::new(),
        }
    }

    /// Total value held (`price × quantity`)
    pub fn value(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// All five fields as a store document
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("name".to_string(), Value::from(self.name.clone()));
        doc.insert("quantity".to_string(), Value::from(self.quantity));
        doc.insert(
            "description".to_string(),
            Value::from(self.description.clone()),
        );
        doc.insert("price".to_string(), Value::from(self.price));
        doc.insert("supplier".to_string(), Value::from(self.supplier.clone()));
        doc
    }

    /// Reads a stored document leniently.
    ///
    /// The key is the name. Missing or mistyped fields take their defaults;
    /// numeric text goes through the usual coercions.
    pub fn from_document(key: &str, doc: &Document) -> Self {
        Self {
            name: key.to_string(),
            quantity: quantity_field(doc.get("quantity")),
            description: text_field(doc.get("description")),
            price: price_field(doc.get("price")),
            supplier: text_field(doc.get("supplier")),
        }
    }
}

fn quantity_field(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Some(Value::String(s)) => parse_quantity(s, QuantityDefault::Edit),
        _ => 0,
    }
}

fn price_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .unwrap_or(0.0),
        Some(Value::String(s)) => parse_price(s),
        _ => 0.0,
    }
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Renders a number the short way: `5`, `2.5`, `0.1`
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Raw item input as typed into a form.
///
/// Numeric fields stay text until coerced, so JSON clients may send either
/// `"quantity": 3` or `"quantity": "3"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub quantity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Pre-filled from an existing record, as the edit form starts out
    pub fn from_item(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: Some(item.quantity.to_string()),
            description: Some(item.description.clone()),
            price: Some(format_number(item.price)),
            supplier: Some(item.supplier.clone()),
        }
    }

    pub fn quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// Applies the field coercions. The name is taken verbatim.
    pub fn coerce(&self, default: QuantityDefault) -> InventoryItem {
        InventoryItem {
            name: self.name.clone(),
            quantity: parse_quantity(self.quantity.as_deref().unwrap_or(""), default),
            description: self.description.clone().unwrap_or_default(),
            price: parse_price(self.price.as_deref().unwrap_or("")),
            supplier: self.supplier.clone().unwrap_or_default(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
