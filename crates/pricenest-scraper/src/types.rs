//! Search provider payload types.
//!
//! ## Observed shape (Google results via SerpApi, `gl=in`)
//!
//! ### Sections
//! Every section is optional. A query may return any mix of
//! `shopping_results`, `inline_shopping_results`, `organic_results`, and a
//! singular `product_result`. Absent sections are treated as empty.
//!
//! ### Items
//! Items are loosely typed. `price` is usually a display string
//! (`"₹49,999.00"`) but has been seen as a bare number; `extracted_price` is
//! a float when present. Some items carry EMI copy in fields such as
//! `extensions`, `delivery`, or `tag`. The full original object is kept on
//! every record so the EMI signal scan can see fields we do not model.
//!
//! ### Product result
//! `product_result.pricing` (older payloads: `sellers`) lists one entry per
//! seller with `name`, `link`, `price`, and `extracted_price`. The product
//! title lives on the parent object.
//!
//! Each item is decoded on its own. A malformed item is skipped with a debug
//! log; it never discards the rest of its section.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Which part of the provider payload a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSection {
    ProductPricing,
    Shopping,
    InlineShopping,
    Organic,
}

impl ResultSection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultSection::ProductPricing => "product_result",
            ResultSection::Shopping => "shopping_results",
            ResultSection::InlineShopping => "inline_shopping_results",
            ResultSection::Organic => "organic_results",
        }
    }
}

/// One result item, decoded defensively from the provider payload.
#[derive(Debug, Clone)]
pub struct RawResultRecord {
    pub section: ResultSection,
    pub title: Option<String>,
    pub link: Option<String>,
    /// Display price text, e.g. `"₹49,999.00"`.
    pub price: Option<String>,
    /// Provider-parsed numeric price.
    pub extracted_price: Option<f64>,
    pub snippet: Option<String>,
    /// Store display name as reported by the provider (e.g. `"Flipkart"`).
    pub source: Option<String>,
    pub thumbnail: Option<String>,
    /// Store logo: `source_icon` for shopping items, `favicon` for organic.
    pub store_logo: Option<String>,
    /// The item exactly as received.
    pub fields: Map<String, Value>,
}

impl RawResultRecord {
    fn from_object(section: ResultSection, fields: Map<String, Value>) -> Self {
        let store_logo = match section {
            ResultSection::Organic => text_field(&fields, "favicon"),
            ResultSection::ProductPricing => {
                text_field(&fields, "logo").or_else(|| text_field(&fields, "source_icon"))
            }
            ResultSection::Shopping | ResultSection::InlineShopping => {
                text_field(&fields, "source_icon")
            }
        };
        let source = match section {
            ResultSection::ProductPricing => text_field(&fields, "name"),
            _ => text_field(&fields, "source"),
        };

        Self {
            section,
            title: text_field(&fields, "title"),
            link: text_field(&fields, "link"),
            price: text_field(&fields, "price"),
            extracted_price: fields.get("extracted_price").and_then(Value::as_f64),
            snippet: text_field(&fields, "snippet"),
            source,
            thumbnail: text_field(&fields, "thumbnail"),
            store_logo,
            fields,
        }
    }
}

/// The singular product panel: one product, many sellers.
#[derive(Debug, Clone, Default)]
pub struct ProductResult {
    pub title: Option<String>,
    /// First product thumbnail, used as the image for every seller entry.
    pub thumbnail: Option<String>,
    pub sellers: Vec<RawResultRecord>,
}

/// A decoded provider payload. Build with `serde_json::from_value` /
/// `from_str`; decoding never fails on missing or oddly typed sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "WirePayload")]
pub struct SearchPayload {
    pub shopping_results: Vec<RawResultRecord>,
    pub inline_shopping_results: Vec<RawResultRecord>,
    pub organic_results: Vec<RawResultRecord>,
    pub product_result: Option<ProductResult>,
    /// Provider-level error message (e.g. quota exhausted), if any.
    pub error: Option<String>,
}

impl SearchPayload {
    /// Total number of decoded records across all sections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.shopping_results.len()
            + self.inline_shopping_results.len()
            + self.organic_results.len()
            + self.product_result.as_ref().map_or(0, |p| p.sellers.len())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WirePayload {
    #[serde(default)]
    shopping_results: Option<Value>,
    #[serde(default)]
    inline_shopping_results: Option<Value>,
    #[serde(default)]
    organic_results: Option<Value>,
    #[serde(default)]
    product_result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl From<WirePayload> for SearchPayload {
    fn from(wire: WirePayload) -> Self {
        Self {
            shopping_results: decode_section(wire.shopping_results, ResultSection::Shopping),
            inline_shopping_results: decode_section(
                wire.inline_shopping_results,
                ResultSection::InlineShopping,
            ),
            organic_results: decode_section(wire.organic_results, ResultSection::Organic),
            product_result: wire.product_result.and_then(decode_product_result),
            error: wire.error.as_ref().and_then(value_as_text),
        }
    }
}

fn decode_section(value: Option<Value>, section: ResultSection) -> Vec<RawResultRecord> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => {
            tracing::debug!(
                section = section.as_str(),
                kind = value_kind(&other),
                "result section is not an array; ignoring"
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) => Some(RawResultRecord::from_object(section, fields)),
            other => {
                tracing::debug!(
                    section = section.as_str(),
                    kind = value_kind(&other),
                    "skipping non-object result item"
                );
                None
            }
        })
        .collect()
}

fn decode_product_result(value: Value) -> Option<ProductResult> {
    let Value::Object(mut fields) = value else {
        return None;
    };

    let title = text_field(&fields, "title");
    let thumbnail = match fields.get("thumbnails") {
        Some(Value::Array(thumbs)) => thumbs.iter().find_map(value_as_text),
        _ => text_field(&fields, "thumbnail"),
    };
    let listing = fields
        .remove("pricing")
        .filter(|v| !v.is_null())
        .or_else(|| fields.remove("sellers"));

    Some(ProductResult {
        title,
        thumbnail,
        sellers: decode_section(listing, ResultSection::ProductPricing),
    })
}

/// Reads a scalar field as text. Numbers are rendered, everything else
/// (including empty strings) is treated as absent.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(value_as_text)
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
