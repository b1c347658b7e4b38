//! Backend paths, relative to the configured base URL.

use crate::domain::line_item::ItemKind;
use crate::domain::report::ReportKind;

pub const BOOKINGS: &str = "bookings";

pub fn catalog(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Inventory => "inventory",
        ItemKind::Outsourced => "outsourced-products",
    }
}

pub fn catalog_item(kind: ItemKind, id: i64) -> String {
    format!("{}/{id}", catalog(kind))
}

pub fn booking(id: i64) -> String {
    format!("{BOOKINGS}/{id}")
}

pub fn booking_convert(id: i64) -> String {
    format!("{BOOKINGS}/{id}/convert")
}

pub fn order(id: i64) -> String {
    format!("orders/{id}")
}

pub fn order_dispatch(id: i64) -> String {
    format!("orders/{id}/dispatch")
}

pub fn order_return(id: i64) -> String {
    format!("orders/{id}/return")
}

pub fn payment_update(order_id: i64) -> String {
    format!("payments/{order_id}")
}

pub fn report(kind: ReportKind) -> String {
    format!("reports/{}", kind.as_str())
}
