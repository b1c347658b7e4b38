use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    item_ref, lines, money, parse_kind, parse_money, CustomerDto, LineItemResponse, TotalsResponse,
};
use crate::application::order_service::{DraftView, SubmitOutcome};
use crate::domain::line_item::CatalogProduct;
use crate::domain::order::{DraftPurpose, ItemUpdate};
use crate::envelope;
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct DraftResponse {
    pub id: Uuid,
    /// `new_booking`, `edit_booking` or `convert_booking`
    pub purpose: String,
    pub booking_id: Option<i64>,
    pub customer: CustomerDto,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub no_of_days: i32,
    pub items: Vec<LineItemResponse>,
    pub outsourced_items: Vec<LineItemResponse>,
    pub notes: Option<String>,
    pub totals: TotalsResponse,
    /// Reasons the draft cannot be submitted yet, in form order.
    pub issues: Vec<String>,
    pub ready: bool,
}

impl From<DraftView> for DraftResponse {
    fn from(view: DraftView) -> Self {
        let (purpose, booking_id) = match view.draft.purpose {
            DraftPurpose::NewBooking => ("new_booking", None),
            DraftPurpose::EditBooking(id) => ("edit_booking", Some(id)),
            DraftPurpose::ConvertBooking(id) => ("convert_booking", Some(id)),
        };
        let draft = &view.draft;
        Self {
            id: view.id,
            purpose: purpose.to_string(),
            booking_id,
            customer: CustomerDto::from(&draft.customer),
            start_date: draft.period.map(|p| p.start_date),
            end_date: draft.period.map(|p| p.end_date),
            no_of_days: draft.no_of_days,
            items: lines(&draft.items),
            outsourced_items: lines(&draft.outsourced_items),
            notes: draft.notes.clone(),
            totals: TotalsResponse::from(&view.totals),
            ready: view.issues.is_empty(),
            issues: view.issues.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PeriodRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Overrides the inclusive day count derived from the dates.
    #[serde(default)]
    pub no_of_days: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscountRequest {
    /// Decimal amount as a string, e.g. "50.00"
    pub discount: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    /// `inventory` or `outsourced`
    pub kind: String,
    pub product_id: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: Option<i32>,
    pub unit_price: Option<String>,
    pub days: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Only accepted when converting a pre-booking into an order.
    #[serde(default)]
    pub advance_payment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    /// `booking_created`, `booking_updated` or `order_created`
    pub outcome: String,
    pub booking_id: i64,
    pub order_id: Option<i64>,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::BookingCreated { booking_id } => Self {
                outcome: "booking_created".to_string(),
                booking_id,
                order_id: None,
            },
            SubmitOutcome::BookingUpdated { booking_id } => Self {
                outcome: "booking_updated".to_string(),
                booking_id,
                order_id: None,
            },
            SubmitOutcome::OrderCreated {
                booking_id,
                order_id,
            } => Self {
                outcome: "order_created".to_string(),
                booking_id,
                order_id: Some(order_id),
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub kind: String,
    pub product_id: i64,
    pub name: String,
    pub unit_price: String,
    pub available_quantity: Option<i32>,
}

impl From<CatalogProduct> for ProductResponse {
    fn from(p: CatalogProduct) -> Self {
        Self {
            kind: p.item.kind.as_str().to_string(),
            product_id: p.item.id,
            unit_price: money(&p.unit_price),
            name: p.name,
            available_quantity: p.available_quantity,
        }
    }
}

fn draft(view: DraftView) -> HttpResponse {
    envelope::ok(DraftResponse::from(view))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /drafts
#[utoipa::path(
    post,
    path = "/drafts",
    responses(
        (status = 201, description = "Empty pre-booking draft", body = DraftResponse),
    ),
    tag = "drafts"
)]
pub async fn start_booking(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let view = state.orders.start_booking()?;
    Ok(envelope::created(DraftResponse::from(view), "Draft started"))
}

/// POST /pre-bookings/{id}/edit
///
/// Loads the pre-booking into a draft for editing.
#[utoipa::path(
    post,
    path = "/pre-bookings/{id}/edit",
    params(("id" = i64, Path, description = "Pre-booking id")),
    responses(
        (status = 201, description = "Draft holding the pre-booking", body = DraftResponse),
        (status = 404, description = "Pre-booking not found"),
        (status = 502, description = "Backend failure"),
    ),
    tag = "drafts"
)]
pub async fn start_booking_edit(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = state
        .orders
        .start_booking_edit(path.into_inner())
        .await
        .map_err(AppError::fallback("Failed to load pre-booking"))?;
    Ok(envelope::created(DraftResponse::from(view), "Draft started"))
}

/// POST /pre-bookings/{id}/convert
///
/// Loads the pre-booking into a draft that submits as a new order.
#[utoipa::path(
    post,
    path = "/pre-bookings/{id}/convert",
    params(("id" = i64, Path, description = "Pre-booking id")),
    responses(
        (status = 201, description = "Conversion draft", body = DraftResponse),
        (status = 400, description = "Pre-booking already converted"),
        (status = 404, description = "Pre-booking not found"),
    ),
    tag = "drafts"
)]
pub async fn start_conversion(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = state
        .orders
        .start_conversion(path.into_inner())
        .await
        .map_err(AppError::fallback("Failed to load pre-booking"))?;
    Ok(envelope::created(DraftResponse::from(view), "Draft started"))
}

#[utoipa::path(
    get,
    path = "/drafts/{id}",
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft with live totals", body = DraftResponse),
        (status = 404, description = "Draft not found"),
    ),
    tag = "drafts"
)]
pub async fn get_draft(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    Ok(draft(state.orders.get_draft(path.into_inner())?))
}

#[utoipa::path(
    delete,
    path = "/drafts/{id}",
    params(("id" = Uuid, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft discarded"),
        (status = 404, description = "Draft not found"),
    ),
    tag = "drafts"
)]
pub async fn discard_draft(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    state.orders.discard_draft(id)?;
    Ok(envelope::ok(id))
}

#[utoipa::path(
    put,
    path = "/drafts/{id}/customer",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = CustomerDto,
    responses((status = 200, description = "Updated draft", body = DraftResponse)),
    tag = "drafts"
)]
pub async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerDto>,
) -> Result<HttpResponse, AppError> {
    let view = state
        .orders
        .update_customer(path.into_inner(), body.into_inner().into())?;
    Ok(draft(view))
}

/// PUT /drafts/{id}/period
///
/// Setting the period resets every line's days to the new day count.
#[utoipa::path(
    put,
    path = "/drafts/{id}/period",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = PeriodRequest,
    responses(
        (status = 200, description = "Updated draft", body = DraftResponse),
        (status = 400, description = "End date before start date"),
    ),
    tag = "drafts"
)]
pub async fn update_period(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PeriodRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let view = state.orders.update_period(
        path.into_inner(),
        body.start_date,
        body.end_date,
        body.no_of_days,
    )?;
    Ok(draft(view))
}

#[utoipa::path(
    put,
    path = "/drafts/{id}/discount",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = DiscountRequest,
    responses((status = 200, description = "Updated draft", body = DraftResponse)),
    tag = "drafts"
)]
pub async fn update_discount(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<DiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let discount = parse_money(&body.discount, "discount")?;
    Ok(draft(state.orders.update_discount(path.into_inner(), discount)?))
}

#[utoipa::path(
    put,
    path = "/drafts/{id}/notes",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = NotesRequest,
    responses((status = 200, description = "Updated draft", body = DraftResponse)),
    tag = "drafts"
)]
pub async fn update_notes(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<NotesRequest>,
) -> Result<HttpResponse, AppError> {
    let notes = body.into_inner().notes;
    Ok(draft(state.orders.update_notes(path.into_inner(), notes)?))
}

/// POST /drafts/{id}/items
///
/// Adds one unit of a catalog product; a product already on the draft has
/// its quantity incremented instead.
#[utoipa::path(
    post,
    path = "/drafts/{id}/items",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated draft", body = DraftResponse),
        (status = 404, description = "Draft or product not found"),
    ),
    tag = "drafts"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = item_ref(&body.kind, body.product_id)?;
    let view = state
        .orders
        .add_item(path.into_inner(), item)
        .await
        .map_err(AppError::fallback("Failed to load product"))?;
    Ok(draft(view))
}

#[utoipa::path(
    patch,
    path = "/drafts/{id}/items/{kind}/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Draft id"),
        ("kind" = String, Path, description = "inventory or outsourced"),
        ("product_id" = i64, Path, description = "Catalog product id"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated draft", body = DraftResponse),
        (status = 404, description = "Line not on draft"),
    ),
    tag = "drafts"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String, i64)>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, kind, product_id) = path.into_inner();
    let body = body.into_inner();
    let update = ItemUpdate {
        quantity: body.quantity,
        unit_price: body
            .unit_price
            .as_deref()
            .map(|p| parse_money(p, "unit_price"))
            .transpose()?,
        days: body.days,
    };
    let view = state
        .orders
        .update_item(id, item_ref(&kind, product_id)?, update)?;
    Ok(draft(view))
}

#[utoipa::path(
    delete,
    path = "/drafts/{id}/items/{kind}/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Draft id"),
        ("kind" = String, Path, description = "inventory or outsourced"),
        ("product_id" = i64, Path, description = "Catalog product id"),
    ),
    responses(
        (status = 200, description = "Updated draft", body = DraftResponse),
        (status = 404, description = "Line not on draft"),
    ),
    tag = "drafts"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String, i64)>,
) -> Result<HttpResponse, AppError> {
    let (id, kind, product_id) = path.into_inner();
    let view = state.orders.remove_item(id, item_ref(&kind, product_id)?)?;
    Ok(draft(view))
}

/// POST /drafts/{id}/submit
///
/// Validates the draft and sends it to the backend: a new pre-booking, an
/// update of the loaded one, or a conversion into an order. The draft is
/// discarded once the backend accepts it.
#[utoipa::path(
    post,
    path = "/drafts/{id}/submit",
    params(("id" = Uuid, Path, description = "Draft id")),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submitted", body = SubmitResponse),
        (status = 400, description = "Draft failed validation"),
        (status = 502, description = "Backend rejected the submission"),
    ),
    tag = "drafts"
)]
pub async fn submit_draft(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, AppError> {
    let advance = body
        .advance_payment
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .map(|a| parse_money(a, "advance_payment"))
        .transpose()?;
    let outcome = state
        .orders
        .submit_draft(path.into_inner(), advance)
        .await
        .map_err(AppError::fallback("Failed to save booking"))?;
    let message = match outcome {
        SubmitOutcome::BookingCreated { .. } => "Pre-booking created",
        SubmitOutcome::BookingUpdated { .. } => "Pre-booking updated",
        SubmitOutcome::OrderCreated { .. } => "Order created",
    };
    Ok(envelope::created(SubmitResponse::from(outcome), message))
}

#[utoipa::path(
    get,
    path = "/catalog/{kind}",
    params(
        ("kind" = String, Path, description = "inventory or outsourced"),
        ("search" = Option<String>, Query, description = "Product name filter"),
    ),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductResponse>),
        (status = 502, description = "Backend failure"),
    ),
    tag = "catalog"
)]
pub async fn search_catalog(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, AppError> {
    let kind = parse_kind(&path)?;
    let products = state
        .orders
        .search_catalog(kind, query.search.as_deref().unwrap_or(""))
        .await
        .map_err(AppError::fallback("Failed to load products"))?;
    Ok(envelope::ok(
        products
            .into_iter()
            .map(ProductResponse::from)
            .collect::<Vec<_>>(),
    ))
}
