//! JSON shapes exchanged with the rental backend.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::dispatch::{DispatchRecord, DispatchStatus, MovementBatch, MovementKind};
use crate::domain::line_item::{CatalogProduct, ItemKind, ItemRef, LineItem};
use crate::domain::order::{
    BookingSubmission, Customer, Order, PaymentUpdate, PreBooking, RentalPeriod,
};
use crate::domain::report::RawReport;
use crate::serde_helpers::{
    coerce_number, decimal_as_number, lenient_date, lenient_decimal, lenient_i32,
    lenient_opt_i64, lenient_opt_string, lenient_string, lenient_time, null_as_default,
    opt_decimal_as_number,
};

/// `{ success, data, message }` as sent by the backend.
#[derive(Debug, Deserialize)]
pub struct EnvelopeRow<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Inbound ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProductRow {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub available_quantity: Option<i64>,
}

impl ProductRow {
    pub fn into_product(self, kind: ItemKind) -> Option<CatalogProduct> {
        Some(CatalogProduct {
            item: ItemRef {
                kind,
                id: self.id?,
            },
            name: self.name,
            unit_price: self.price,
            available_quantity: match kind {
                ItemKind::Inventory => self.available_quantity.map(saturate_i32),
                ItemKind::Outsourced => None,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LineRow {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub out_product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub days: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub available_quantity: Option<i64>,
}

impl LineRow {
    fn item(&self) -> Option<ItemRef> {
        match (self.out_product_id, self.product_id) {
            (Some(id), _) => Some(ItemRef::outsourced(id)),
            (None, Some(id)) => Some(ItemRef::inventory(id)),
            (None, None) => None,
        }
    }

    /// Lines without any product reference are dropped.
    pub fn into_line(self, default_days: i32) -> Option<LineItem> {
        let item = self.item()?;
        Some(LineItem {
            item,
            name: self.name,
            unit_price: self.price,
            quantity: self.quantity,
            days: self.days.map(saturate_i32).unwrap_or(default_days),
            available_quantity: match item.kind {
                ItemKind::Inventory => self.available_quantity.map(saturate_i32),
                ItemKind::Outsourced => None,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DispatchRow {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub out_product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "lenient_date")]
    pub dispatch_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub dispatch_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

impl DispatchRow {
    /// Records with an unknown status or no product reference are dropped.
    pub fn into_record(self) -> Option<DispatchRecord> {
        let status = match self.status.trim().to_ascii_lowercase().as_str() {
            "dispatched" => DispatchStatus::Dispatched,
            "returned" => DispatchStatus::Returned,
            _ => return None,
        };
        let item = match (self.out_product_id, self.product_id) {
            (Some(id), _) => ItemRef::outsourced(id),
            (None, Some(id)) => ItemRef::inventory(id),
            (None, None) => return None,
        };
        Some(DispatchRecord {
            id: self.id,
            item,
            quantity: self.quantity,
            dispatch_date: self.dispatch_date,
            dispatch_time: self.dispatch_time,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomerFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub customer_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub customer_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub no_of_days: Option<i64>,
}

impl CustomerFields {
    fn customer(&self) -> Customer {
        Customer {
            name: self.customer_name.clone(),
            phone: self.customer_phone.clone(),
            email: self.customer_email.clone(),
            address: self.customer_address.clone(),
        }
    }

    fn period(&self) -> Option<RentalPeriod> {
        RentalPeriod::new(self.start_date?, self.end_date?).ok()
    }

    fn no_of_days(&self) -> i32 {
        self.no_of_days
            .map(saturate_i32)
            .or_else(|| self.period().map(|p| p.days()))
            .unwrap_or(1)
    }
}

fn lines(rows: Vec<LineRow>, days: i32) -> Vec<LineItem> {
    rows.into_iter().filter_map(|r| r.into_line(days)).collect()
}

#[derive(Debug, Deserialize)]
pub struct BookingRow {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: CustomerFields,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outsourced_items: Vec<LineRow>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount: BigDecimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub notes: Option<String>,
}

impl BookingRow {
    pub fn into_booking(self, fallback_id: i64) -> PreBooking {
        let days = self.fields.no_of_days();
        PreBooking {
            id: self.id.unwrap_or(fallback_id),
            customer: self.fields.customer(),
            period: self.fields.period(),
            no_of_days: days,
            items: lines(self.items, days),
            outsourced_items: lines(self.outsourced_items, days),
            discount: self.discount,
            status: self.status,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderRow {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub booking_id: Option<i64>,
    #[serde(flatten)]
    pub fields: CustomerFields,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outsourced_items: Vec<LineRow>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount: BigDecimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub paid_amount: BigDecimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dispatches: Vec<DispatchRow>,
}

impl OrderRow {
    pub fn into_order(self, fallback_id: i64) -> Order {
        let days = self.fields.no_of_days();
        Order {
            id: self.id.unwrap_or(fallback_id),
            booking_id: self.booking_id,
            customer: self.fields.customer(),
            period: self.fields.period(),
            no_of_days: days,
            items: lines(self.items, days),
            outsourced_items: lines(self.outsourced_items, days),
            discount: self.discount,
            paid_amount: self.paid_amount,
            status: self.status,
            dispatches: self
                .dispatches
                .into_iter()
                .filter_map(DispatchRow::into_record)
                .collect(),
        }
    }
}

/// Reports arrive either as a bare row array or as an object carrying a
/// `summary` block next to the rows.
pub fn raw_report(data: Value) -> RawReport {
    match data {
        Value::Array(rows) => RawReport {
            summary: Map::new(),
            rows,
        },
        Value::Object(mut map) => {
            let rows = ["rows", "items", "data"]
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(_)) => map.remove(*key),
                    _ => None,
                })
                .and_then(|v| match v {
                    Value::Array(rows) => Some(rows),
                    _ => None,
                })
                .unwrap_or_default();
            let summary = match map.remove("summary") {
                Some(Value::Object(summary)) => summary,
                _ => map,
            };
            RawReport { summary, rows }
        }
        _ => RawReport::default(),
    }
}

/// Id of a newly created record, wherever the backend put it.
pub fn created_id(data: Option<&Value>, keys: &[&str]) -> Option<i64> {
    let data = data?;
    if data.is_number() || data.is_string() {
        let n = coerce_number(data);
        return (n > 0.0).then_some(n as i64);
    }
    keys.iter()
        .filter_map(|k| data.get(*k))
        .map(coerce_number)
        .find(|n| *n > 0.0)
        .map(|n| n as i64)
}

fn saturate_i32(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
}

// ── Outbound ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct NewLineRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_product_id: Option<i64>,
    pub name: String,
    #[serde(serialize_with = "decimal_as_number")]
    pub price: BigDecimal,
    pub quantity: i32,
    pub days: i32,
    #[serde(serialize_with = "decimal_as_number")]
    pub total: BigDecimal,
}

impl From<&LineItem> for NewLineRow {
    fn from(line: &LineItem) -> Self {
        let (product_id, out_product_id) = match line.item.kind {
            ItemKind::Inventory => (Some(line.item.id), None),
            ItemKind::Outsourced => (None, Some(line.item.id)),
        };
        Self {
            product_id,
            out_product_id,
            name: line.name.clone(),
            price: line.unit_price.clone(),
            quantity: line.quantity,
            days: line.days,
            total: line.line_total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewBookingRow {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub no_of_days: i32,
    pub items: Vec<NewLineRow>,
    pub outsourced_items: Vec<NewLineRow>,
    #[serde(serialize_with = "decimal_as_number")]
    pub sub_total: BigDecimal,
    #[serde(serialize_with = "decimal_as_number")]
    pub discount: BigDecimal,
    #[serde(serialize_with = "decimal_as_number")]
    pub total_amount: BigDecimal,
    pub total_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "opt_decimal_as_number"
    )]
    pub advance_payment: Option<BigDecimal>,
}

impl From<&BookingSubmission> for NewBookingRow {
    fn from(b: &BookingSubmission) -> Self {
        Self {
            customer_name: b.customer.name.clone(),
            customer_phone: b.customer.phone.clone(),
            customer_email: b.customer.email.clone(),
            customer_address: b.customer.address.clone(),
            start_date: b.period.start_date,
            end_date: b.period.end_date,
            no_of_days: b.no_of_days,
            items: b.items.iter().map(NewLineRow::from).collect(),
            outsourced_items: b.outsourced_items.iter().map(NewLineRow::from).collect(),
            sub_total: b.totals.sub_total.clone(),
            discount: b.totals.discount.clone(),
            total_amount: b.totals.total_amount.clone(),
            total_quantity: b.totals.total_quantity,
            notes: b.notes.clone(),
            advance_payment: b.advance_payment.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovementLineRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_product_id: Option<i64>,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct MovementRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_time: Option<String>,
    pub items: Vec<MovementLineRow>,
}

impl From<&MovementBatch> for MovementRow {
    fn from(batch: &MovementBatch) -> Self {
        let time = batch.time.map(|t| t.format("%H:%M").to_string());
        let items = batch
            .lines
            .iter()
            .map(|l| {
                let (product_id, out_product_id) = match l.item.kind {
                    ItemKind::Inventory => (Some(l.item.id), None),
                    ItemKind::Outsourced => (None, Some(l.item.id)),
                };
                MovementLineRow {
                    product_id,
                    out_product_id,
                    quantity: l.quantity,
                }
            })
            .collect();
        match batch.kind {
            MovementKind::Dispatch => Self {
                dispatch_date: Some(batch.date),
                dispatch_time: time,
                return_date: None,
                return_time: None,
                items,
            },
            MovementKind::Return => Self {
                dispatch_date: None,
                dispatch_time: None,
                return_date: Some(batch.date),
                return_time: time,
                items,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentRow {
    #[serde(serialize_with = "decimal_as_number")]
    pub amount: BigDecimal,
    pub payment_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&PaymentUpdate> for PaymentRow {
    fn from(p: &PaymentUpdate) -> Self {
        Self {
            amount: p.amount.clone(),
            payment_mode: p.mode.clone(),
            note: p.note.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_without_data_decodes_for_non_default_rows() {
        let env: EnvelopeRow<ProductRow> =
            serde_json::from_value(json!({"success": false, "message": "gone"})).unwrap();
        assert!(env.data.is_none());
        assert!(!env.success);

        let env: EnvelopeRow<ProductRow> =
            serde_json::from_value(json!({"success": true, "data": {"id": 3, "name": "Tent"}}))
                .unwrap();
        assert_eq!(env.data.map(|p| p.name).as_deref(), Some("Tent"));
    }

    #[test]
    fn order_row_maps_lines_and_history() {
        let row: OrderRow = serde_json::from_value(json!({
            "id": "41",
            "customer_name": "Asha",
            "customer_phone": 9876543210u64,
            "start_date": "2024-03-01T00:00:00.000Z",
            "end_date": "2024-03-02",
            "items": [
                {"product_id": 1, "name": "Chair", "price": "10.50", "quantity": "10"}
            ],
            "outsourced_items": null,
            "discount": null,
            "paid_amount": 100,
            "status": "confirmed",
            "dispatches": [
                {"product_id": 1, "quantity": 4, "dispatch_date": "2024-03-01", "dispatch_time": "09:30", "status": "dispatched"},
                {"product_id": 1, "quantity": 1, "status": "Returned"},
                {"quantity": 3, "status": "dispatched"},
                {"product_id": 1, "quantity": 3, "status": "cancelled"}
            ]
        }))
        .expect("order row should decode");

        let order = row.into_order(0);
        assert_eq!(order.id, 41);
        assert_eq!(order.customer.phone, "9876543210");
        assert_eq!(order.no_of_days, 2);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].days, 2);
        assert_eq!(order.items[0].quantity, 10);
        assert_eq!(order.items[0].unit_price, BigDecimal::from_str("10.5").unwrap());
        assert!(order.outsourced_items.is_empty());
        assert_eq!(order.dispatches.len(), 2);
        assert_eq!(order.dispatches[1].status, DispatchStatus::Returned);
    }

    #[test]
    fn booking_row_without_dates_has_no_period() {
        let row: BookingRow = serde_json::from_value(json!({
            "customer_name": "Ravi",
            "no_of_days": 3,
            "outsourced_items": [{"out_product_id": 5, "name": "Generator", "price": 250}]
        }))
        .unwrap();
        let booking = row.into_booking(12);
        assert_eq!(booking.id, 12);
        assert_eq!(booking.period, None);
        assert_eq!(booking.outsourced_items[0].item, ItemRef::outsourced(5));
        assert_eq!(booking.outsourced_items[0].days, 3);
    }

    #[test]
    fn movement_row_uses_kind_specific_keys() {
        let batch = MovementBatch {
            kind: MovementKind::Return,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            time: NaiveTime::from_hms_opt(17, 5, 0),
            lines: vec![crate::domain::dispatch::QuantityRequest {
                item: ItemRef::outsourced(5),
                quantity: 2,
            }],
        };
        let value = serde_json::to_value(MovementRow::from(&batch)).unwrap();
        assert_eq!(
            value,
            json!({
                "return_date": "2024-03-04",
                "return_time": "17:05",
                "items": [{"out_product_id": 5, "quantity": 2}]
            })
        );
    }

    #[test]
    fn reports_accept_both_shapes() {
        let bare = raw_report(json!([{"a": 1}]));
        assert_eq!(bare.rows.len(), 1);
        assert!(bare.summary.is_empty());

        let wrapped = raw_report(json!({"summary": {"total": "4"}, "rows": [{"a": 1}, {"a": 2}]}));
        assert_eq!(wrapped.rows.len(), 2);
        assert_eq!(wrapped.summary.get("total"), Some(&json!("4")));

        let flat = raw_report(json!({"total": 4, "items": []}));
        assert!(flat.rows.is_empty());
        assert_eq!(flat.summary.get("total"), Some(&json!(4)));
    }

    #[test]
    fn created_id_looks_in_known_keys() {
        assert_eq!(created_id(Some(&json!({"booking_id": "17"})), &["id", "booking_id"]), Some(17));
        assert_eq!(created_id(Some(&json!(9)), &["id"]), Some(9));
        assert_eq!(created_id(Some(&json!({"other": 1})), &["id"]), None);
        assert_eq!(created_id(None, &["id"]), None);
    }
}
