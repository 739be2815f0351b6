use std::io::{Cursor, Write};

use uuid::Uuid;
use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderWithImages},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderImage, OrderStatus},
    response::ApiResponse,
    routes::admin::UpdateOrderStatusRequest,
    routes::params::{OrderListQuery, SortOrder},
    services::order_service::{OrderRow, order_from_row, order_images},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?,
        ),
        None => None,
    };
    let status = status.map(|s| s.as_str());
    let search = query.q.as_deref().filter(|s| !s.is_empty());
    let sort = query.sort_order.unwrap_or(SortOrder::Desc);

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT * FROM orders
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL
               OR delivery_address->>'fullName' ILIKE '%' || $2 || '%'
               OR id::text ILIKE '%' || $2 || '%')
        ORDER BY created_at {}
        LIMIT $3 OFFSET $4
        "#,
        sort.as_sql()
    ))
    .bind(status)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM orders
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL
               OR delivery_address->>'fullName' ILIKE '%' || $2 || '%'
               OR id::text ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(status)
    .bind(search)
    .fetch_one(&state.pool)
    .await?;

    let items: Vec<Order> = rows.into_iter().map(order_from_row).collect();
    Ok(ApiResponse::paginated(
        "Orders",
        OrderList { items },
        page,
        limit,
        total.0,
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithImages>> {
    ensure_admin(user)?;
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let images = order_images(state, id).await?;
    Ok(ApiResponse::success(
        "Order found",
        OrderWithImages {
            order: order_from_row(row),
            images,
        },
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?;

    let row = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(&state.pool)
    .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Order updated", order_from_row(row)))
}

/// Bundle an order into a ZIP for the print lab: a plain-text summary plus
/// every uploaded image.
pub async fn build_archive(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<(String, Vec<u8>)> {
    ensure_admin(user)?;

    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    let order = order_from_row(row);
    let images = order_images(state, id).await?;

    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(images.len() + 1);
    entries.push((
        format!("order-{id}/order-details.txt"),
        render_order_details(&order, &images).into_bytes(),
    ));
    for (n, image) in images.iter().enumerate() {
        let ext = image
            .file_path
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("jpg");
        let name = format!(
            "order-{id}/image-{}-{}-Qty-{}-{}.{ext}",
            image.size,
            image.paper,
            image.quantity,
            n + 1
        );
        let bytes = state.images.load(&image.file_path).await?;
        entries.push((name, bytes));
    }

    let bytes = tokio::task::spawn_blocking(move || zip_entries(entries))
        .await
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err)))??;

    Ok((format!("order-{id}.zip"), bytes))
}

fn zip_entries(entries: Vec<(String, Vec<u8>)>) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn render_order_details(order: &Order, images: &[OrderImage]) -> String {
    let address = &order.delivery_address;
    let mut lines = Vec::new();

    lines.push(format!("ORDER ID: {}", order.id));
    lines.push(format!("STATUS: {}", order.status.as_str().to_uppercase()));
    lines.push(String::new());
    lines.push("CUSTOMER DETAILS".into());
    lines.push("----------------".into());
    lines.push(format!("Name: {}", address.full_name));
    lines.push(format!("Phone: {}", address.phone_number));
    lines.push(format!("Email: {}", address.email));
    lines.push(String::new());
    lines.push("ADDRESS".into());
    lines.push("-------".into());
    lines.push(address.address_line1.clone());
    if !address.address_line2.is_empty() {
        lines.push(address.address_line2.clone());
    }
    lines.push(format!("{}, {}", address.city, address.state));
    lines.push(format!("{} - {}", address.country, address.zip_code));
    lines.push(String::new());
    lines.push("PAYMENT".into());
    lines.push("-------".into());
    lines.push(format!(
        "Method: {}",
        order.payment_method.as_str().replace('_', " ")
    ));
    lines.push(String::new());
    lines.push("PRICING".into());
    lines.push("-------".into());
    lines.push(format!("Subtotal: {:.2}", order.pricing.subtotal));
    lines.push(format!("Discount: {:.2}", order.pricing.discount));
    lines.push(format!("Delivery Charge: {:.2}", order.pricing.delivery_charge));
    lines.push(format!("TOTAL: {:.2}", order.pricing.total));
    lines.push(String::new());
    lines.push("ORDER ITEMS".into());
    lines.push("-----------".into());
    for (n, image) in images.iter().enumerate() {
        lines.push(format!(
            "{}. Size: {}, Paper: {}, Quantity: {}",
            n + 1,
            image.size,
            image.paper,
            image.quantity
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryAddress, PaymentMethod};
    use crate::pricing::Totals;
    use chrono::Utc;

    fn sample_order() -> Order {
        Order {
            id: Uuid::nil(),
            delivery_address: DeliveryAddress {
                full_name: "Amira Haddad".into(),
                phone_number: "+971 50 123 4567".into(),
                email: "amira@example.com".into(),
                address_line1: "Villa 12, Palm Street".into(),
                address_line2: String::new(),
                city: "Dubai".into(),
                state: "Dubai".into(),
                zip_code: "00000".into(),
                country: "United Arab Emirates".into(),
            },
            pricing: Totals {
                subtotal: 100.0,
                delivery_charge: 29.0,
                discount: 10.0,
                total: 119.0,
            },
            payment_method: PaymentMethod::CashOnDelivery,
            promo_code: Some("SAVE10".into()),
            status: OrderStatus::Processing,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_image(size: &str, quantity: i32) -> OrderImage {
        OrderImage {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            size: size.into(),
            paper: "Luster".into(),
            quantity,
            cropped: false,
            crop_data: None,
            file_path: "deadbeef.jpg".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn order_details_cover_every_section() {
        let order = sample_order();
        let images = [sample_image("10x15", 40), sample_image("20x30", 2)];
        let text = render_order_details(&order, &images);

        assert!(text.contains("STATUS: PROCESSING"));
        assert!(text.contains("Name: Amira Haddad"));
        assert!(text.contains("Method: cash on delivery"));
        assert!(text.contains("Subtotal: 100.00"));
        assert!(text.contains("TOTAL: 119.00"));
        assert!(text.contains("1. Size: 10x15, Paper: Luster, Quantity: 40"));
        assert!(text.contains("2. Size: 20x30, Paper: Luster, Quantity: 2"));
    }

    #[test]
    fn zip_contains_one_entry_per_input() {
        let entries = vec![
            ("order-x/order-details.txt".to_string(), b"hello".to_vec()),
            ("order-x/image-1.jpg".to_string(), vec![0xFF, 0xD8]),
        ];
        let bytes = zip_entries(entries).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("order-x/order-details.txt").is_ok());
        assert!(archive.by_name("order-x/image-1.jpg").is_ok());
    }
}
