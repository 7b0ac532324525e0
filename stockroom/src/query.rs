//! Filtered and sorted views of a snapshot, plus the summaries shown
//! next to the list (quantity per supplier, value per item).
//!
//! Everything here is a pure function of the items passed in.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use stockroom_common::{format_number, InventoryItem};

/// Supplier label for items without one
pub const NO_SUPPLIER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending by name
    #[default]
    Name,
    /// Highest quantity first
    Quantity,
    /// Highest price first
    Price,
    /// Ascending by supplier
    Supplier,
    /// Leave items in store order
    Retrieval,
}

impl SortKey {
    /// Parses a sort key name; anything unknown keeps store order.
    pub fn parse(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "name" => SortKey::Name,
            "quantity" => SortKey::Quantity,
            "price" => SortKey::Price,
            "supplier" => SortKey::Supplier,
            _ => SortKey::Retrieval,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Quantity => "quantity",
            SortKey::Price => "price",
            SortKey::Supplier => "supplier",
            SortKey::Retrieval => "retrieval",
        }
    }
}

/// Compares the way a reader expects: case-insensitive first, then by
/// exact text so the order is total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Whether any field of `item` contains `term`.
///
/// Name, description and supplier match case-insensitively; price and
/// quantity match against their printed form.
pub fn matches(item: &InventoryItem, term: &str) -> bool {
    let needle = term.to_lowercase();
    item.name.to_lowercase().contains(&needle)
        || item.description.to_lowercase().contains(&needle)
        || item.supplier.to_lowercase().contains(&needle)
        || format_number(item.price).contains(term)
        || item.quantity.to_string().contains(term)
}

pub fn filter(items: &[InventoryItem], term: &str) -> Vec<InventoryItem> {
    items
        .iter()
        .filter(|item| matches(item, term))
        .cloned()
        .collect()
}

/// Stable sort: items with equal keys keep their input order.
pub fn sort(items: &[InventoryItem], key: SortKey) -> Vec<InventoryItem> {
    let mut sorted = items.to_vec();
    match key {
        SortKey::Name => sorted.sort_by(|a, b| locale_cmp(&a.name, &b.name)),
        SortKey::Supplier => sorted.sort_by(|a, b| locale_cmp(&a.supplier, &b.supplier)),
        SortKey::Quantity => sorted.sort_by(|a, b| b.quantity.cmp(&a.quantity)),
        SortKey::Price => sorted.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::Retrieval => {}
    }
    sorted
}

/// Filter, then sort
pub fn view(items: &[InventoryItem], term: &str, key: SortKey) -> Vec<InventoryItem> {
    sort(&filter(items, term), key)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierTotal {
    pub supplier: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemValue {
    pub name: String,
    pub value: f64,
}

/// Quantity summed per supplier, in order of first appearance.
pub fn quantity_by_supplier(items: &[InventoryItem]) -> Vec<SupplierTotal> {
    let mut totals: Vec<SupplierTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let supplier = if item.supplier.is_empty() {
            NO_SUPPLIER
        } else {
            item.supplier.as_str()
        };
        match index.get(supplier) {
            Some(&i) => {
                totals[i].quantity = totals[i].quantity.saturating_add(item.quantity)
            }
            None => {
                index.insert(supplier, totals.len());
                totals.push(SupplierTotal {
                    supplier: supplier.to_string(),
                    quantity: item.quantity,
                });
            }
        }
    }
    totals
}

pub fn value_by_item(items: &[InventoryItem]) -> Vec<ItemValue> {
    items
        .iter()
        .map(|item| ItemValue {
            name: item.name.clone(),
            value: item.value(),
        })
        .collect()
}

pub fn total_value(items: &[InventoryItem]) -> f64 {
    items.iter().map(InventoryItem::value).sum()
}
