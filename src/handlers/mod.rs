pub mod drafts;
pub mod orders;
pub mod reports;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::line_item::{ItemKind, ItemRef, LineItem};
use crate::domain::order::{Customer, OrderTotals};
use crate::errors::AppError;

// ── Shared DTOs ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerDto {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<&Customer> for CustomerDto {
    fn from(c: &Customer) -> Self {
        Self {
            name: c.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
            address: c.address.clone(),
        }
    }
}

impl From<CustomerDto> for Customer {
    fn from(c: CustomerDto) -> Self {
        Customer {
            name: c.name,
            phone: c.phone,
            email: c.email,
            address: c.address,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    /// `inventory` or `outsourced`
    pub kind: String,
    pub product_id: i64,
    pub name: String,
    pub unit_price: String,
    pub quantity: i32,
    pub days: i32,
    pub available_quantity: Option<i32>,
    pub line_total: String,
}

impl From<&LineItem> for LineItemResponse {
    fn from(l: &LineItem) -> Self {
        Self {
            kind: l.item.kind.as_str().to_string(),
            product_id: l.item.id,
            name: l.name.clone(),
            unit_price: money(&l.unit_price),
            quantity: l.quantity,
            days: l.days,
            available_quantity: l.available_quantity,
            line_total: money(&l.line_total()),
        }
    }
}

pub(crate) fn lines(items: &[LineItem]) -> Vec<LineItemResponse> {
    items.iter().map(LineItemResponse::from).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsResponse {
    pub sub_total: String,
    pub discount: String,
    pub total_amount: String,
    pub total_quantity: i64,
}

impl From<&OrderTotals> for TotalsResponse {
    fn from(t: &OrderTotals) -> Self {
        Self {
            sub_total: money(&t.sub_total),
            discount: money(&t.discount),
            total_amount: money(&t.total_amount),
            total_quantity: t.total_quantity,
        }
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────────────

/// Two-decimal display string, truncated.
pub(crate) fn money(value: &BigDecimal) -> String {
    value.with_scale(2).to_string()
}

const MAX_MONEY_INPUT: usize = 32;
const MAX_MONEY_PLACES: i64 = 4;
const MAX_MONEY_INTEGER_DIGITS: i64 = 15;

/// Parses a money field from a request. Exponents are accepted only while the
/// value stays within fifteen integer digits and four decimal places.
pub(crate) fn parse_money(raw: &str, field: &str) -> Result<BigDecimal, AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid {field} '{raw}'"));
    let trimmed = raw.trim();
    if trimmed.len() > MAX_MONEY_INPUT {
        return Err(invalid());
    }
    let value = BigDecimal::from_str(trimmed).map_err(|_| invalid())?;
    let normalized = value.normalized();
    let (digits, scale) = normalized.as_bigint_and_exponent();
    let integer_digits = digits.to_string().trim_start_matches('-').len() as i64 - scale;
    if scale > MAX_MONEY_PLACES || integer_digits > MAX_MONEY_INTEGER_DIGITS {
        return Err(invalid());
    }
    Ok(normalized)
}

pub(crate) fn parse_kind(raw: &str) -> Result<ItemKind, AppError> {
    match raw {
        "inventory" => Ok(ItemKind::Inventory),
        "outsourced" => Ok(ItemKind::Outsourced),
        other => Err(AppError::BadRequest(format!(
            "Unknown item kind '{other}', expected inventory or outsourced"
        ))),
    }
}

pub(crate) fn item_ref(kind: &str, product_id: i64) -> Result<ItemRef, AppError> {
    Ok(ItemRef {
        kind: parse_kind(kind)?,
        id: product_id,
    })
}
