use axum::{Json, Router, routing::{get, post}};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{PaperType, PrintItem, PrintSize},
    pricing,
    promo::{self, Promo, PromoOutcome},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartLine {
    pub size: PrintSize,
    pub paper: PaperType,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromoRequest {
    pub code: String,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromoCatalog {
    pub percentage: Vec<Promo>,
    pub free_prints: Vec<Promo>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promos))
        .route("/validate", post(validate_promo))
}

#[utoipa::path(
    get,
    path = "/api/promo",
    responses(
        (status = 200, description = "Available promo codes grouped by kind", body = ApiResponse<PromoCatalog>),
    ),
    tag = "Promo"
)]
pub async fn list_promos() -> Json<ApiResponse<PromoCatalog>> {
    let (percentage, free_prints) = promo::grouped();
    let data = PromoCatalog {
        percentage: percentage.into_iter().copied().collect(),
        free_prints: free_prints.into_iter().copied().collect(),
    };
    Json(ApiResponse::success("OK", data))
}

/// Server-side mirror of the checkout promo check. An invalid code is a
/// valid response (`valid: false`), never an HTTP error; the cart is left
/// untouched either way.
#[utoipa::path(
    post,
    path = "/api/promo/validate",
    request_body = ValidatePromoRequest,
    responses(
        (status = 200, description = "Evaluation outcome", body = ApiResponse<PromoOutcome>),
    ),
    tag = "Promo"
)]
pub async fn validate_promo(
    Json(payload): Json<ValidatePromoRequest>,
) -> AppResult<Json<ApiResponse<PromoOutcome>>> {
    let items: Vec<PrintItem> = payload
        .items
        .iter()
        .map(|line| {
            let mut item = PrintItem::new(line.size, line.paper, "");
            item.set_quantity(line.quantity);
            item
        })
        .collect();

    let subtotal = pricing::subtotal(&items);
    let outcome = promo::evaluate(&payload.code, &items, subtotal);
    let message = outcome.message.clone();
    Ok(Json(ApiResponse::success(message, outcome)))
}
