//! Request payloads and the fixed-schema item record
//!
//! `/predict` bodies are loosely typed JSON. They are read into a
//! [`PredictRequest`] whose fields are all optional, then mapped onto an
//! [`ItemRecord`] with six named fields. Values that cannot be used for their
//! field become missing instead of failing the request.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Column names shared with the preprocessing artifact.
pub const PLASTIC_TYPE: &str = "Plastic_Type";
pub const CONDITION: &str = "Condition";
pub const WEIGHT_KG: &str = "Weight_Kg";
pub const AGE_MONTHS: &str = "Age_Months";
pub const ORIGINAL_PRICE: &str = "Original_Price";
pub const LOCATION: &str = "Location";

/// Columns of an item row, in order.
pub const COLUMNS: [&str; 6] = [
    PLASTIC_TYPE,
    CONDITION,
    WEIGHT_KG,
    AGE_MONTHS,
    ORIGINAL_PRICE,
    LOCATION,
];

// =============================================================================
// Request
// =============================================================================

/// Body of a `POST /predict` request.
///
/// Unknown keys are ignored. Text fields also accept numbers and booleans
/// (stringified); numeric fields also accept numeric strings. `null` and any
/// other unusable value are recorded as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub ptype: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub condition: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
}

impl PredictRequest {
    /// Read a request out of an already parsed JSON document.
    ///
    /// Fails only when the document is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

// =============================================================================
// Condition vocabulary
// =============================================================================

/// Known item conditions, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Cracked = 1,
    Used = 2,
    Good = 3,
    New = 4,
}

impl Condition {
    /// Case-insensitive match after trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cracked" => Some(Condition::Cracked),
            "used" => Some(Condition::Used),
            "good" => Some(Condition::Good),
            "new" => Some(Condition::New),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Ordinal code for a condition value: 1-4 for the vocabulary, 0 otherwise.
pub fn condition_ordinal(raw: Option<&str>) -> u8 {
    raw.and_then(Condition::parse).map_or(0, Condition::ordinal)
}

// =============================================================================
// Item record
// =============================================================================

/// One cell of an item row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Missing, Cell::Text)
    }
}

/// A single row keyed by column name, in [`COLUMNS`] order.
pub type Row = IndexMap<String, Cell>;

/// Fixed-schema description of one plastic item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    pub plastic_type: Option<String>,
    pub condition: Option<String>,
    pub weight_kg: Option<f64>,
    pub age_months: Option<f64>,
    pub original_price: Option<f64>,
    pub location: Option<String>,
}

impl ItemRecord {
    /// Lay the record out as a row for the preprocessing artifact.
    pub fn to_row(&self) -> Row {
        let mut row = Row::with_capacity(COLUMNS.len());
        row.insert(PLASTIC_TYPE.to_string(), self.plastic_type.clone().into());
        row.insert(CONDITION.to_string(), self.condition.clone().into());
        row.insert(WEIGHT_KG.to_string(), self.weight_kg.into());
        row.insert(AGE_MONTHS.to_string(), self.age_months.into());
        row.insert(ORIGINAL_PRICE.to_string(), self.original_price.into());
        row.insert(LOCATION.to_string(), self.location.clone().into());
        row
    }
}

/// Map a request onto an item record. Absent fields stay missing.
pub fn build_record(request: &PredictRequest) -> ItemRecord {
    ItemRecord {
        plastic_type: request.ptype.clone(),
        condition: request.condition.clone(),
        weight_kg: request.weight,
        age_months: request.age,
        original_price: request.price,
        location: request.location.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_vocabulary() {
        assert_eq!(condition_ordinal(Some("cracked")), 1);
        assert_eq!(condition_ordinal(Some("used")), 2);
        assert_eq!(condition_ordinal(Some("good")), 3);
        assert_eq!(condition_ordinal(Some("new")), 4);
    }

    #[test]
    fn test_condition_case_and_whitespace() {
        assert_eq!(condition_ordinal(Some("  NEW ")), 4);
        assert_eq!(condition_ordinal(Some("\tCracked\n")), 1);
        assert_eq!(condition_ordinal(Some("GoOd")), 3);
    }

    #[test]
    fn test_condition_unknown_and_missing() {
        assert_eq!(condition_ordinal(None), 0);
        assert_eq!(condition_ordinal(Some("")), 0);
        assert_eq!(condition_ordinal(Some("broken")), 0);
        assert_eq!(condition_ordinal(Some("like new")), 0);
    }

    #[test]
    fn test_request_full_payload() {
        let req = PredictRequest::from_value(json!({
            "ptype": "PET",
            "condition": "good",
            "weight": 1.5,
            "age": 12,
            "price": 40.0,
            "location": "Pune"
        }))
        .unwrap();
        assert_eq!(req.ptype.as_deref(), Some("PET"));
        assert_eq!(req.condition.as_deref(), Some("good"));
        assert_eq!(req.weight, Some(1.5));
        assert_eq!(req.age, Some(12.0));
        assert_eq!(req.price, Some(40.0));
        assert_eq!(req.location.as_deref(), Some("Pune"));
    }

    #[test]
    fn test_request_missing_fields() {
        let req = PredictRequest::from_value(json!({ "price": 10 })).unwrap();
        assert_eq!(req.price, Some(10.0));
        assert!(req.ptype.is_none());
        assert!(req.weight.is_none());
        assert!(req.location.is_none());
    }

    #[test]
    fn test_request_lenient_values() {
        let req = PredictRequest::from_value(json!({
            "ptype": 7,
            "condition": null,
            "weight": " 2.5 ",
            "age": "ten",
            "price": true,
            "location": ["a", "b"],
            "extra": "ignored"
        }))
        .unwrap();
        assert_eq!(req.ptype.as_deref(), Some("7"));
        assert!(req.condition.is_none());
        assert_eq!(req.weight, Some(2.5));
        assert!(req.age.is_none());
        assert!(req.price.is_none());
        assert!(req.location.is_none());
    }

    #[test]
    fn test_request_rejects_non_object() {
        assert!(PredictRequest::from_value(json!([1, 2, 3])).is_err());
        assert!(PredictRequest::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_row_layout() {
        let record = build_record(&PredictRequest {
            ptype: Some("HDPE".into()),
            weight: Some(3.0),
            ..Default::default()
        });
        let row = record.to_row();
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, COLUMNS.to_vec());
        assert_eq!(row[PLASTIC_TYPE], Cell::Text("HDPE".into()));
        assert_eq!(row[WEIGHT_KG], Cell::Number(3.0));
        assert!(row[CONDITION].is_missing());
        assert!(row[ORIGINAL_PRICE].is_missing());
    }
}
