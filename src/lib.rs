pub mod application;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod serde_helpers;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use application::report_service::ReportService;
use domain::dispatch::ReturnAccounting;
use errors::AppError;
use handlers::{drafts, orders, reports};
use infrastructure::backend_client::HttpBackend;
use infrastructure::draft_repo::InMemoryDraftRepository;

/// Services shared by every worker.
pub struct AppState {
    pub orders: OrderService<HttpBackend, InMemoryDraftRepository>,
    pub reports: ReportService<HttpBackend>,
}

impl AppState {
    pub fn new(backend: Arc<HttpBackend>, accounting: ReturnAccounting) -> Self {
        Self {
            orders: OrderService::new(backend.clone(), InMemoryDraftRepository::new(), accounting),
            reports: ReportService::new(backend),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rental Order Desk API",
        description = "Pre-booking drafts, order dispatch/return reconciliation, payments and reports over the rental backend."
    ),
    paths(
        drafts::start_booking,
        drafts::start_booking_edit,
        drafts::start_conversion,
        drafts::get_draft,
        drafts::discard_draft,
        drafts::update_customer,
        drafts::update_period,
        drafts::update_discount,
        drafts::update_notes,
        drafts::add_item,
        drafts::update_item,
        drafts::remove_item,
        drafts::submit_draft,
        drafts::search_catalog,
        orders::get_order,
        orders::dispatch,
        orders::dispatch_all,
        orders::return_items,
        orders::return_all,
        orders::record_payment,
        reports::get_report,
    ),
    components(schemas(
        handlers::CustomerDto,
        handlers::LineItemResponse,
        handlers::TotalsResponse,
        drafts::DraftResponse,
        drafts::PeriodRequest,
        drafts::DiscountRequest,
        drafts::NotesRequest,
        drafts::AddItemRequest,
        drafts::UpdateItemRequest,
        drafts::SubmitRequest,
        drafts::SubmitResponse,
        drafts::ProductResponse,
        orders::OrderResponse,
        orders::PaymentResponse,
        orders::ReconciliationResponse,
        orders::ItemBalanceResponse,
        orders::DispatchRecordResponse,
        orders::MovementRequest,
        orders::MovementItemRequest,
        orders::PaymentRequest,
        reports::ReportResponse,
    )),
    tags(
        (name = "drafts", description = "Compose, edit and submit pre-bookings"),
        (name = "catalog", description = "Inventory and outsourced product search"),
        (name = "orders", description = "Order details, dispatch, returns and payments"),
        (name = "reports", description = "Filtered backend reports"),
    )
)]
pub struct ApiDoc;

/// Registers every route plus extractor configs that answer malformed input
/// with the standard error envelope.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/drafts")
            .route("", web::post().to(drafts::start_booking))
            .route("/{id}", web::get().to(drafts::get_draft))
            .route("/{id}", web::delete().to(drafts::discard_draft))
            .route("/{id}/customer", web::put().to(drafts::update_customer))
            .route("/{id}/period", web::put().to(drafts::update_period))
            .route("/{id}/discount", web::put().to(drafts::update_discount))
            .route("/{id}/notes", web::put().to(drafts::update_notes))
            .route("/{id}/items", web::post().to(drafts::add_item))
            .route(
                "/{id}/items/{kind}/{product_id}",
                web::patch().to(drafts::update_item),
            )
            .route(
                "/{id}/items/{kind}/{product_id}",
                web::delete().to(drafts::remove_item),
            )
            .route("/{id}/submit", web::post().to(drafts::submit_draft)),
    )
    .service(
        web::scope("/pre-bookings")
            .route("/{id}/edit", web::post().to(drafts::start_booking_edit))
            .route("/{id}/convert", web::post().to(drafts::start_conversion)),
    )
    .route("/catalog/{kind}", web::get().to(drafts::search_catalog))
    .service(
        web::scope("/orders")
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/dispatch", web::post().to(orders::dispatch))
            .route("/{id}/dispatch-all", web::post().to(orders::dispatch_all))
            .route("/{id}/return", web::post().to(orders::return_items))
            .route("/{id}/return-all", web::post().to(orders::return_all))
            .route("/{id}/payments", web::post().to(orders::record_payment)),
    )
    .route("/reports/{kind}", web::get().to(reports::get_report));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
