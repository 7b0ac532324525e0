//! Plain comma-separated text, in and out.
//!
//! Quoting is switched off in both directions: a comma inside a
//! description shifts every later field of that row, on import and on
//! export alike.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use stockroom_common::{format_number, InventoryItem, ItemDraft, QuantityDefault};

/// Header row written by `export_csv`
pub const EXPORT_HEADERS: [&str; 5] = ["name", "quantity", "description", "price", "supplier"];

/// One data line of an import, fields keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    fields: HashMap<String, String>,
}

impl ImportRow {
    fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        ImportRow { fields }
    }

    /// Field value, or "" when the header or the cell is missing
    pub fn field(&self, header: &str) -> &str {
        self.fields.get(header).map(String::as_str).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.field("name")
    }

    /// The record this row describes, with import coercions applied
    pub fn to_item(&self) -> InventoryItem {
        let draft = ItemDraft {
            name: self.name().to_string(),
            quantity: Some(self.field("quantity").to_string()),
            description: Some(self.field("description").to_string()),
            price: Some(self.field("price").to_string()),
            supplier: Some(self.field("supplier").to_string()),
        };
        draft.coerce(QuantityDefault::Import)
    }
}

/// Parses import text.
///
/// The first line is the header row. Every later non-empty line becomes
/// one row; cells are matched to headers by position and trimmed. Cells
/// past the last header are dropped, missing trailing cells read as "".
pub fn parse_rows(text: &str) -> Vec<ImportRow> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = match rdr.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            log::warn!("Cannot read import header row: {}", e);
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for result in rdr.records() {
        match result {
            Ok(record) => rows.push(ImportRow::from_record(&headers, &record)),
            Err(e) => log::warn!("Skipping unreadable import line: {}", e),
        }
    }
    rows
}

/// Renders items as CSV text: header row, one line per item, no
/// trailing newline.
pub fn export_csv(items: &[InventoryItem]) -> io::Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);

    wtr.write_record(EXPORT_HEADERS)?;
    for item in items {
        let quantity = item.quantity.to_string();
        let price = format_number(item.price);
        wtr.write_record([
            item.name.as_str(),
            quantity.as_str(),
            item.description.as_str(),
            price.as_str(),
            item.supplier.as_str(),
        ])?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    let mut text =
        String::from_utf8(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Writes `export_csv(items)` to `path`.
pub async fn write_export(path: &Path, items: &[InventoryItem]) -> io::Result<()> {
    tokio::fs::write(path, export_csv(items)?).await?;
    log::info!("Exported {} item(s) to {}", items.len(), path.display());
    Ok(())
}
