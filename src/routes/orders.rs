use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::OrderWithImages,
    error::AppResult,
    response::ApiResponse,
    services::order_service::{self, OrderSubmission},
    state::AppState,
    submit::FormPart,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{id}", get(get_order))
}

/// Multipart order submission: repeated `images` file parts plus indexed
/// item metadata, the delivery address, client pricing, and payment fields.
#[utoipa::path(
    post,
    path = "/api/orders",
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithImages>),
        (status = 400, description = "Invalid payload, address, or pricing"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithImages>>)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await?;
            fields.push((
                name,
                FormPart::File {
                    file_name,
                    bytes: bytes.to_vec(),
                },
            ));
        } else {
            fields.push((name, FormPart::Text(field.text().await?)));
        }
    }

    let submission = OrderSubmission::from_fields(fields)?;
    let resp = order_service::submit_order(&state, submission).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its print lines", body = ApiResponse<OrderWithImages>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithImages>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}
