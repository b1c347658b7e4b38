use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{item_ref, lines, money, parse_money, CustomerDto, LineItemResponse, TotalsResponse};
use crate::application::order_service::OrderDetails;
use crate::domain::dispatch::{
    DispatchRecord, DispatchStatus, ItemBalance, Progress, QuantityRequest, Reconciliation,
    ReturnAccounting,
};
use crate::domain::order::{PaymentSummary, PaymentUpdate};
use crate::envelope;
use crate::errors::AppError;
use crate::serde_helpers::parse_time;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub total_amount: String,
    pub paid_amount: String,
    pub balance_due: String,
    pub paid_percent: f64,
}

impl From<&PaymentSummary> for PaymentResponse {
    fn from(p: &PaymentSummary) -> Self {
        Self {
            total_amount: money(&p.total_amount),
            paid_amount: money(&p.paid_amount),
            balance_due: money(&p.balance_due),
            paid_percent: p.paid_percent,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemBalanceResponse {
    pub kind: String,
    pub product_id: i64,
    pub name: String,
    pub ordered: i32,
    pub dispatched: i32,
    pub returned: i32,
    /// Most that can still be dispatched.
    pub remaining: i32,
    /// Most that can be returned.
    pub returnable: i32,
    pub can_dispatch: bool,
    pub can_return: bool,
}

impl From<&ItemBalance> for ItemBalanceResponse {
    fn from(b: &ItemBalance) -> Self {
        Self {
            kind: b.item.kind.as_str().to_string(),
            product_id: b.item.id,
            name: b.name.clone(),
            ordered: b.ordered,
            dispatched: b.dispatched,
            returned: b.returned,
            remaining: b.remaining,
            returnable: b.returnable,
            can_dispatch: b.can_dispatch(),
            can_return: b.can_return(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResponse {
    /// `gross` or `net`
    pub accounting: String,
    pub dispatched_percent: f64,
    pub returned_percent: f64,
    /// `not_started`, `partial` or `complete`
    pub dispatch_progress: String,
    pub return_progress: String,
    pub items: Vec<ItemBalanceResponse>,
}

fn progress_label(progress: Progress) -> &'static str {
    match progress {
        Progress::NotStarted => "not_started",
        Progress::Partial => "partial",
        Progress::Complete => "complete",
    }
}

impl From<&Reconciliation> for ReconciliationResponse {
    fn from(r: &Reconciliation) -> Self {
        Self {
            accounting: match r.accounting {
                ReturnAccounting::Gross => "gross",
                ReturnAccounting::Net => "net",
            }
            .to_string(),
            dispatched_percent: r.dispatched_percent(),
            returned_percent: r.returned_percent(),
            dispatch_progress: progress_label(r.dispatch_progress()).to_string(),
            return_progress: progress_label(r.return_progress()).to_string(),
            items: r.balances.iter().map(ItemBalanceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchRecordResponse {
    pub id: Option<i64>,
    pub kind: String,
    pub product_id: i64,
    pub quantity: i32,
    pub date: Option<NaiveDate>,
    /// `HH:MM`
    pub time: Option<String>,
    /// `dispatched` or `returned`
    pub status: String,
}

impl From<&DispatchRecord> for DispatchRecordResponse {
    fn from(d: &DispatchRecord) -> Self {
        Self {
            id: d.id,
            kind: d.item.kind.as_str().to_string(),
            product_id: d.item.id,
            quantity: d.quantity,
            date: d.dispatch_date,
            time: d.dispatch_time.map(|t| t.format("%H:%M").to_string()),
            status: match d.status {
                DispatchStatus::Dispatched => "dispatched",
                DispatchStatus::Returned => "returned",
            }
            .to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub booking_id: Option<i64>,
    pub status: String,
    pub customer: CustomerDto,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub no_of_days: i32,
    pub items: Vec<LineItemResponse>,
    pub outsourced_items: Vec<LineItemResponse>,
    pub totals: TotalsResponse,
    pub payment: PaymentResponse,
    pub reconciliation: ReconciliationResponse,
    pub dispatches: Vec<DispatchRecordResponse>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let order = &details.order;
        Self {
            id: order.id,
            booking_id: order.booking_id,
            status: order.status.clone(),
            customer: CustomerDto::from(&order.customer),
            start_date: order.period.map(|p| p.start_date),
            end_date: order.period.map(|p| p.end_date),
            no_of_days: order.no_of_days,
            items: lines(&order.items),
            outsourced_items: lines(&order.outsourced_items),
            totals: TotalsResponse::from(&details.totals),
            payment: PaymentResponse::from(&details.payment),
            reconciliation: ReconciliationResponse::from(&details.reconciliation),
            dispatches: order
                .dispatches
                .iter()
                .map(DispatchRecordResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementItemRequest {
    /// `inventory` or `outsourced`
    pub kind: String,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MovementRequest {
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// `HH:MM` or `HH:MM:SS`
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<MovementItemRequest>,
}

impl MovementRequest {
    fn when(&self) -> Result<(NaiveDate, Option<NaiveTime>), AppError> {
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let time = match self.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_time(raw)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid time '{raw}'")))?,
            ),
        };
        Ok((date, time))
    }

    fn requests(&self) -> Result<Vec<QuantityRequest>, AppError> {
        self.items
            .iter()
            .map(|i| {
                Ok(QuantityRequest {
                    item: item_ref(&i.kind, i.product_id)?,
                    quantity: i.quantity,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentRequest {
    /// Decimal amount as a string, e.g. "250.00"
    pub amount: String,
    pub payment_mode: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn order(details: OrderDetails) -> HttpResponse {
    envelope::ok(OrderResponse::from(details))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{id}
///
/// Returns the order with its totals, payment summary and per-item dispatch
/// reconciliation.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Backend failure"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let details = state
        .orders
        .order_details(path.into_inner())
        .await
        .map_err(AppError::fallback("Failed to load order"))?;
    Ok(order(details))
}

/// POST /orders/{id}/dispatch
///
/// Each requested quantity is clamped to what remains for its item; lines
/// that clamp to zero are dropped and the rest go out as one batch.
#[utoipa::path(
    post,
    path = "/orders/{id}/dispatch",
    params(("id" = i64, Path, description = "Order id")),
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Order after the dispatch", body = OrderResponse),
        (status = 400, description = "Nothing to dispatch"),
        (status = 502, description = "Backend rejected the dispatch"),
    ),
    tag = "orders"
)]
pub async fn dispatch(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, AppError> {
    let (date, time) = body.when()?;
    let requests = body.requests()?;
    let details = state
        .orders
        .dispatch(path.into_inner(), date, time, &requests)
        .await
        .map_err(AppError::fallback("Failed to dispatch items"))?;
    Ok(order(details))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/dispatch-all",
    params(("id" = i64, Path, description = "Order id")),
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Order after the dispatch", body = OrderResponse),
        (status = 400, description = "Nothing to dispatch"),
    ),
    tag = "orders"
)]
pub async fn dispatch_all(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, AppError> {
    let (date, time) = body.when()?;
    let details = state
        .orders
        .dispatch_all(path.into_inner(), date, time)
        .await
        .map_err(AppError::fallback("Failed to dispatch items"))?;
    Ok(order(details))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/return",
    params(("id" = i64, Path, description = "Order id")),
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Order after the return", body = OrderResponse),
        (status = 400, description = "Nothing to return"),
        (status = 502, description = "Backend rejected the return"),
    ),
    tag = "orders"
)]
pub async fn return_items(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, AppError> {
    let (date, time) = body.when()?;
    let requests = body.requests()?;
    let details = state
        .orders
        .return_items(path.into_inner(), date, time, &requests)
        .await
        .map_err(AppError::fallback("Failed to return items"))?;
    Ok(order(details))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/return-all",
    params(("id" = i64, Path, description = "Order id")),
    request_body = MovementRequest,
    responses(
        (status = 200, description = "Order after the return", body = OrderResponse),
        (status = 400, description = "Nothing to return"),
    ),
    tag = "orders"
)]
pub async fn return_all(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MovementRequest>,
) -> Result<HttpResponse, AppError> {
    let (date, time) = body.when()?;
    let details = state
        .orders
        .return_all(path.into_inner(), date, time)
        .await
        .map_err(AppError::fallback("Failed to return items"))?;
    Ok(order(details))
}

/// POST /orders/{id}/payments
///
/// The amount must be positive and no more than the balance due.
#[utoipa::path(
    post,
    path = "/orders/{id}/payments",
    params(("id" = i64, Path, description = "Order id")),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Order after the payment", body = OrderResponse),
        (status = 400, description = "Invalid amount"),
        (status = 502, description = "Backend rejected the payment"),
    ),
    tag = "orders"
)]
pub async fn record_payment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let payment = PaymentUpdate {
        amount: parse_money(&body.amount, "amount")?,
        mode: body.payment_mode,
        note: body.note.filter(|n| !n.trim().is_empty()),
    };
    let details = state
        .orders
        .record_payment(path.into_inner(), payment)
        .await
        .map_err(AppError::fallback("Failed to update payment"))?;
    Ok(order(details))
}
