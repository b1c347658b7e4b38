use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{DomainError, UpstreamError, ValidationError};
use crate::serde_helpers::{coerce_number, lenient_f64, lenient_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Inventory,
    Orders,
    Purchases,
    Suppliers,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Inventory => "inventory",
            ReportKind::Orders => "orders",
            ReportKind::Purchases => "purchases",
            ReportKind::Suppliers => "suppliers",
        }
    }

    /// Types the raw rows for this kind and applies the text filter.
    pub fn shape(&self, raw: RawReport, search: &str) -> Result<ReportView, DomainError> {
        match self {
            ReportKind::Inventory => shape_rows::<InventoryReportRow>(*self, raw, search),
            ReportKind::Orders => shape_rows::<OrderReportRow>(*self, raw, search),
            ReportKind::Purchases => shape_rows::<PurchaseReportRow>(*self, raw, search),
            ReportKind::Suppliers => shape_rows::<SupplierReportRow>(*self, raw, search),
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(ReportKind::Inventory),
            "orders" => Ok(ReportKind::Orders),
            "purchases" => Ok(ReportKind::Purchases),
            "suppliers" => Ok(ReportKind::Suppliers),
            other => Err(DomainError::NotFound(format!("Report '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportRange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ValidationError::InvalidReportRange),
            _ => Ok(()),
        }
    }
}

/// A report exactly as the backend summarised it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReport {
    pub summary: Map<String, Value>,
    pub rows: Vec<Value>,
}

/// A report ready for display: numbers coerced, rows filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub kind: ReportKind,
    pub summary: BTreeMap<String, f64>,
    pub total_rows: usize,
    pub rows: Vec<Value>,
}

/// Rows that the report search box can match against.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Case-insensitive substring match over the row's search fields. A blank
/// query matches everything.
pub fn matches_search<T: Searchable>(row: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_rows<T: Searchable>(rows: Vec<T>, query: &str) -> Vec<T> {
    rows.into_iter().filter(|r| matches_search(r, query)).collect()
}

/// Numeric summary values; nested structures are dropped.
pub fn coerce_summary(summary: &Map<String, Value>) -> BTreeMap<String, f64> {
    summary
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, v)| (k.clone(), coerce_number(v)))
        .collect()
}

fn shape_rows<T>(kind: ReportKind, raw: RawReport, search: &str) -> Result<ReportView, DomainError>
where
    T: Searchable + DeserializeOwned + Serialize,
{
    let total_rows = raw.rows.len();
    let mut rows = Vec::new();
    for original in raw.rows {
        let typed = serde_json::from_value::<T>(original.clone())
            .map_err(|e| UpstreamError::Decode(format!("{} report row: {e}", kind.as_str())))?;
        if !matches_search(&typed, search) {
            continue;
        }
        let coerced =
            serde_json::to_value(&typed).map_err(|e| DomainError::Internal(e.to_string()))?;
        rows.push(overlay(original, coerced));
    }
    Ok(ReportView {
        kind,
        summary: coerce_summary(&raw.summary),
        total_rows,
        rows,
    })
}

/// The backend row with its typed columns replaced by their coerced values.
/// Columns the typed row does not know about pass through untouched.
fn overlay(original: Value, coerced: Value) -> Value {
    match (original, coerced) {
        (Value::Object(mut row), Value::Object(typed)) => {
            row.extend(typed);
            Value::Object(row)
        }
        (_, coerced) => coerced,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReportRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub available_quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rented_quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_value: f64,
}

impl Searchable for InventoryReportRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.product_name.as_str(), self.category.as_str()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReportRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub paid_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
}

impl Searchable for OrderReportRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.order_number.as_str(),
            self.customer_name.as_str(),
            self.customer_phone.as_str(),
            self.status.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReportRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub purchase_date: String,
}

impl Searchable for PurchaseReportRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.supplier_name.as_str(),
            self.product_name.as_str(),
            self.invoice_number.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierReportRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_purchases: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
}

impl Searchable for SupplierReportRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.supplier_name.as_str(),
            self.contact_person.as_str(),
            self.phone.as_str(),
        ]
    }
}
