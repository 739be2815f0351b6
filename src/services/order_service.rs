use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::OrderWithImages,
    error::{AppError, AppResult},
    models::{
        DeliveryAddress, Order, OrderImage, OrderStatus, PaperType, PaymentMethod, PrintItem,
        PrintSize,
    },
    pricing::{DELIVERY_CHARGE, Totals, unit_price_for_label},
    promo,
    response::ApiResponse,
    state::AppState,
    submit::{FormPart, parse_address_field, parse_item_field, parse_pricing_field},
    validation::validate_delivery_address,
};

/// Client-computed amounts are re-derived server-side and must agree to
/// within half a fils.
const PRICE_TOLERANCE: f64 = 0.005;

/// One print line as it arrived on the wire. The size stays a raw label:
/// unrecognized sizes are priced at the smallest tier, not rejected.
#[derive(Debug, Clone)]
pub struct SubmittedItem {
    pub size: String,
    pub paper: String,
    pub quantity: u32,
    pub cropped: bool,
    pub crop_data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct SubmittedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A fully parsed order submission, ready for validation and persistence.
#[derive(Debug)]
pub struct OrderSubmission {
    pub images: Vec<SubmittedImage>,
    pub items: Vec<SubmittedItem>,
    pub address: DeliveryAddress,
    pub client_pricing: Totals,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
}

#[derive(Debug, Default)]
struct RawItem {
    size: Option<String>,
    paper: Option<String>,
    quantity: Option<u32>,
    cropped: bool,
    crop_data: Option<Value>,
}

#[derive(Debug, Default)]
struct RawPricing {
    subtotal: Option<f64>,
    discount: Option<f64>,
    delivery_charge: Option<f64>,
    total: Option<f64>,
}

impl OrderSubmission {
    /// Assemble a submission from the collected multipart fields. The shape
    /// mirrors the checkout form: repeated `images` file parts, indexed
    /// `items[i][...]` metadata, one address block, one pricing block.
    pub fn from_fields(fields: Vec<(String, FormPart)>) -> AppResult<Self> {
        let mut images = Vec::new();
        let mut raw_items: BTreeMap<usize, RawItem> = BTreeMap::new();
        let mut address = DeliveryAddress::default();
        let mut pricing = RawPricing::default();
        let mut payment_method = None;
        let mut promo_code = None;

        for (key, part) in fields {
            match part {
                FormPart::File { file_name, bytes } => {
                    if key != "images" {
                        return Err(AppError::BadRequest(format!(
                            "unexpected file field '{key}'"
                        )));
                    }
                    images.push(SubmittedImage { file_name, bytes });
                }
                FormPart::Text(value) => {
                    if let Some((index, name)) = parse_item_field(&key) {
                        let item = raw_items.entry(index).or_default();
                        match name {
                            "size" => item.size = Some(value),
                            "paper" => item.paper = Some(value),
                            "quantity" => {
                                let quantity = value.parse::<u32>().map_err(|_| {
                                    AppError::BadRequest(format!(
                                        "invalid quantity for item {index}"
                                    ))
                                })?;
                                item.quantity = Some(quantity);
                            }
                            "cropped" => item.cropped = value == "true",
                            "cropData" => {
                                let data = serde_json::from_str(&value).map_err(|_| {
                                    AppError::BadRequest(format!(
                                        "invalid crop data for item {index}"
                                    ))
                                })?;
                                item.crop_data = Some(data);
                            }
                            _ => {}
                        }
                    } else if let Some(name) = parse_address_field(&key) {
                        match name {
                            "fullName" => address.full_name = value,
                            "phoneNumber" => address.phone_number = value,
                            "email" => address.email = value,
                            "addressLine1" => address.address_line1 = value,
                            "addressLine2" => address.address_line2 = value,
                            "city" => address.city = value,
                            "state" => address.state = value,
                            "zipCode" => address.zip_code = value,
                            "country" => address.country = value,
                            _ => {}
                        }
                    } else if let Some(name) = parse_pricing_field(&key) {
                        let amount = value.parse::<f64>().map_err(|_| {
                            AppError::BadRequest(format!("invalid pricing field '{name}'"))
                        })?;
                        match name {
                            "subtotal" => pricing.subtotal = Some(amount),
                            "discount" => pricing.discount = Some(amount),
                            "deliveryCharge" => pricing.delivery_charge = Some(amount),
                            "total" => pricing.total = Some(amount),
                            _ => {}
                        }
                    } else if key == "paymentMethod" {
                        payment_method = Some(PaymentMethod::parse(&value).ok_or_else(|| {
                            AppError::BadRequest("Unknown payment method".into())
                        })?);
                    } else if key == "promoCode" {
                        let trimmed = value.trim();
                        if !trimmed.is_empty() {
                            promo_code = Some(trimmed.to_string());
                        }
                    }
                }
            }
        }

        if images.is_empty() {
            return Err(AppError::BadRequest("Order has no images".into()));
        }

        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items {
            let quantity = raw
                .quantity
                .ok_or_else(|| AppError::BadRequest(format!("item {index} has no quantity")))?;
            if quantity == 0 {
                return Err(AppError::BadRequest(
                    "quantity must be greater than 0".into(),
                ));
            }
            items.push(SubmittedItem {
                size: raw
                    .size
                    .ok_or_else(|| AppError::BadRequest(format!("item {index} has no size")))?,
                paper: raw
                    .paper
                    .ok_or_else(|| AppError::BadRequest(format!("item {index} has no paper")))?,
                quantity,
                cropped: raw.cropped,
                crop_data: raw.crop_data,
            });
        }

        if items.len() != images.len() {
            return Err(AppError::BadRequest(
                "item metadata does not match the uploaded images".into(),
            ));
        }

        let client_pricing = Totals {
            subtotal: pricing
                .subtotal
                .ok_or_else(|| AppError::BadRequest("pricing[subtotal] is required".into()))?,
            discount: pricing
                .discount
                .ok_or_else(|| AppError::BadRequest("pricing[discount] is required".into()))?,
            delivery_charge: pricing.delivery_charge.ok_or_else(|| {
                AppError::BadRequest("pricing[deliveryCharge] is required".into())
            })?,
            total: pricing
                .total
                .ok_or_else(|| AppError::BadRequest("pricing[total] is required".into()))?,
        };

        Ok(Self {
            images,
            items,
            address,
            client_pricing,
            payment_method: payment_method
                .ok_or_else(|| AppError::BadRequest("paymentMethod is required".into()))?,
            promo_code,
        })
    }
}

/// Items with recognizable sizes, for promo threshold matching. Unknown
/// labels never satisfy a size-targeted promo.
fn promo_items(items: &[SubmittedItem]) -> Vec<PrintItem> {
    items
        .iter()
        .filter_map(|item| {
            PrintSize::from_label(&item.size).map(|size| {
                let mut print = PrintItem::new(size, PaperType::from_label(&item.paper), "");
                print.set_quantity(item.quantity);
                print
            })
        })
        .collect()
}

/// Re-derive the order pricing from the submitted items and promo code.
/// The client's numbers are never trusted.
pub fn recompute_pricing(
    items: &[SubmittedItem],
    promo_code: Option<&str>,
) -> AppResult<Totals> {
    let subtotal: f64 = items
        .iter()
        .map(|item| {
            unit_price_for_label(&item.size, PaperType::from_label(&item.paper))
                * f64::from(item.quantity)
        })
        .sum();

    let discount = match promo_code {
        Some(code) => {
            let outcome = promo::evaluate(code, &promo_items(items), subtotal);
            if !outcome.valid {
                return Err(AppError::BadRequest(outcome.message));
            }
            outcome.discount
        }
        None => 0.0,
    };

    let discount = discount.clamp(0.0, subtotal);
    Ok(Totals {
        subtotal,
        delivery_charge: DELIVERY_CHARGE,
        discount,
        total: subtotal + DELIVERY_CHARGE - discount,
    })
}

fn totals_agree(a: &Totals, b: &Totals) -> bool {
    (a.subtotal - b.subtotal).abs() < PRICE_TOLERANCE
        && (a.discount - b.discount).abs() < PRICE_TOLERANCE
        && (a.delivery_charge - b.delivery_charge).abs() < PRICE_TOLERANCE
        && (a.total - b.total).abs() < PRICE_TOLERANCE
}

pub async fn submit_order(
    state: &AppState,
    submission: OrderSubmission,
) -> AppResult<ApiResponse<OrderWithImages>> {
    let errors = validate_delivery_address(&submission.address);
    if !errors.is_empty() {
        return Err(AppError::InvalidForm(errors));
    }

    let pricing = recompute_pricing(&submission.items, submission.promo_code.as_deref())?;
    if !totals_agree(&pricing, &submission.client_pricing) {
        return Err(AppError::BadRequest(
            "Submitted pricing does not match the order contents".into(),
        ));
    }

    // Blobs land on disk before the transaction; an orphaned file is
    // recoverable, a dangling database row is not.
    let mut stored_paths = Vec::with_capacity(submission.images.len());
    for image in &submission.images {
        stored_paths.push(state.images.save(&image.file_name, &image.bytes).await?);
    }

    let order_id = Uuid::new_v4();
    let mut txn = state.pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        INSERT INTO orders
            (id, delivery_address, subtotal, discount, delivery_charge, total,
             payment_method, promo_code, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(Json(&submission.address))
    .bind(pricing.subtotal)
    .bind(pricing.discount)
    .bind(pricing.delivery_charge)
    .bind(pricing.total)
    .bind(submission.payment_method.as_str())
    .bind(submission.promo_code.as_deref())
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&mut *txn)
    .await?;

    let mut images = Vec::with_capacity(submission.items.len());
    for (item, stored) in submission.items.iter().zip(&stored_paths) {
        let image = sqlx::query_as::<_, OrderImage>(
            r#"
            INSERT INTO order_images
                (id, order_id, size, paper, quantity, cropped, crop_data, file_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(&item.size)
        .bind(&item.paper)
        .bind(item.quantity as i32)
        .bind(item.cropped)
        .bind(item.crop_data.as_ref().map(Json))
        .bind(stored)
        .fetch_one(&mut *txn)
        .await?;
        images.push(image);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "order_created",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id, "total": pricing.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = order_from_row(row);
    tracing::info!(order_id = %order.id, total = order.pricing.total, "order placed");

    Ok(ApiResponse::success(
        "Order Placed Successfully!",
        OrderWithImages { order, images },
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithImages>> {
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
        "OK",
        OrderWithImages {
            order: order_from_row(row),
            images,
        },
    ))
}

pub(crate) async fn order_images(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderImage>> {
    let images = sqlx::query_as::<_, OrderImage>(
        "SELECT * FROM order_images WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(images)
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub delivery_address: Json<DeliveryAddress>,
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charge: f64,
    pub total: f64,
    pub payment_method: String,
    pub promo_code: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn order_from_row(row: OrderRow) -> Order {
    Order {
        id: row.id,
        delivery_address: row.delivery_address.0,
        pricing: Totals {
            subtotal: row.subtotal,
            delivery_charge: row.delivery_charge,
            discount: row.discount,
            total: row.total,
        },
        payment_method: PaymentMethod::parse(&row.payment_method)
            .unwrap_or(PaymentMethod::CashOnDelivery),
        promo_code: row.promo_code,
        status: OrderStatus::parse(&row.status).unwrap_or(OrderStatus::Pending),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrintSize;
    use crate::submit::{SubmissionForm, UploadedPhoto};

    fn photo(size: PrintSize, paper: PaperType, quantity: u32, name: &str) -> UploadedPhoto {
        let mut item = PrintItem::new(size, paper, name);
        item.set_quantity(quantity);
        UploadedPhoto {
            item,
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
            crop_data: None,
        }
    }

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            full_name: "Amira Haddad".into(),
            phone_number: "+971 50 123 4567".into(),
            email: "amira@example.com".into(),
            address_line1: "Villa 12, Palm Street".into(),
            address_line2: String::new(),
            city: "Dubai".into(),
            state: "Dubai".into(),
            zip_code: "00000".into(),
            country: "United Arab Emirates".into(),
        }
    }

    #[test]
    fn an_assembled_form_parses_back_into_the_same_order() {
        let photos = [
            photo(PrintSize::P10x15, PaperType::Luster, 2, "a.jpg"),
            photo(PrintSize::P20x25, PaperType::Glossy, 1, "b.jpg"),
        ];
        let items: Vec<PrintItem> = photos.iter().map(|p| p.item.clone()).collect();
        let totals = crate::pricing::compute_totals(&items, 0.0);
        let form = SubmissionForm::from_cart(
            &photos,
            &address(),
            &totals,
            PaymentMethod::CardPayment,
            "",
        );

        let submission = OrderSubmission::from_fields(form.fields().to_vec()).unwrap();
        assert_eq!(submission.images.len(), 2);
        assert_eq!(submission.items.len(), 2);
        assert_eq!(submission.items[0].size, "10x15");
        assert_eq!(submission.items[1].paper, "Glossy");
        assert_eq!(submission.payment_method, PaymentMethod::CardPayment);
        assert_eq!(submission.promo_code, None);
        assert_eq!(submission.address.full_name, "Amira Haddad");
        assert_eq!(submission.client_pricing, totals);

        // The server arrives at the same numbers independently.
        let recomputed = recompute_pricing(&submission.items, None).unwrap();
        assert!(totals_agree(&recomputed, &submission.client_pricing));
    }

    #[test]
    fn image_and_item_counts_must_match() {
        let photos = [photo(PrintSize::P10x15, PaperType::Luster, 1, "a.jpg")];
        let items: Vec<PrintItem> = photos.iter().map(|p| p.item.clone()).collect();
        let totals = crate::pricing::compute_totals(&items, 0.0);
        let form = SubmissionForm::from_cart(
            &photos,
            &address(),
            &totals,
            PaymentMethod::CashOnDelivery,
            "",
        );

        let mut fields = form.fields().to_vec();
        fields.push((
            "items[1][size]".into(),
            FormPart::Text("13x18".into()),
        ));
        fields.push((
            "items[1][paper]".into(),
            FormPart::Text("Luster".into()),
        ));
        fields.push(("items[1][quantity]".into(), FormPart::Text("1".into())));

        let err = OrderSubmission::from_fields(fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let photos = [photo(PrintSize::P10x15, PaperType::Luster, 1, "a.jpg")];
        let items: Vec<PrintItem> = photos.iter().map(|p| p.item.clone()).collect();
        let totals = crate::pricing::compute_totals(&items, 0.0);
        let form = SubmissionForm::from_cart(
            &photos,
            &address(),
            &totals,
            PaymentMethod::CashOnDelivery,
            "",
        );

        let fields: Vec<_> = form
            .fields()
            .iter()
            .cloned()
            .map(|(key, part)| {
                if key == "items[0][quantity]" {
                    (key, FormPart::Text("0".into()))
                } else {
                    (key, part)
                }
            })
            .collect();

        let err = OrderSubmission::from_fields(fields).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn tampered_client_totals_fail_the_agreement_check() {
        let photos = [photo(PrintSize::P10x15, PaperType::Luster, 2, "a.jpg")];
        let items: Vec<PrintItem> = photos.iter().map(|p| p.item.clone()).collect();
        let totals = crate::pricing::compute_totals(&items, 0.0);
        let form = SubmissionForm::from_cart(
            &photos,
            &address(),
            &totals,
            PaymentMethod::CashOnDelivery,
            "",
        );

        // The client understates its total by a dirham.
        let fields: Vec<_> = form
            .fields()
            .iter()
            .cloned()
            .map(|(key, part)| {
                if key == "pricing[total]" {
                    (key, FormPart::Text((totals.total - 1.0).to_string()))
                } else {
                    (key, part)
                }
            })
            .collect();

        let submission = OrderSubmission::from_fields(fields).unwrap();
        let recomputed = recompute_pricing(&submission.items, None).unwrap();
        assert!(!totals_agree(&recomputed, &submission.client_pricing));

        // Drift inside the tolerance still passes.
        let mut nudged = submission.client_pricing.clone();
        nudged.total = recomputed.total + 0.004;
        nudged.subtotal = recomputed.subtotal;
        nudged.discount = recomputed.discount;
        nudged.delivery_charge = recomputed.delivery_charge;
        assert!(totals_agree(&recomputed, &nudged));
    }

    #[test]
    fn recompute_applies_a_valid_promo_and_rejects_a_short_one() {
        let items = vec![SubmittedItem {
            size: "10x15".into(),
            paper: "Luster".into(),
            quantity: 80,
            cropped: false,
            crop_data: None,
        }];

        let totals = recompute_pricing(&items, Some("SAVE10")).unwrap();
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.discount, 10.0);
        assert_eq!(totals.total, 119.0);

        let err = recompute_pricing(&items, Some("PRINT100")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_sizes_price_at_the_smallest_tier_but_never_match_promos() {
        let items = vec![SubmittedItem {
            size: "11x17".into(),
            paper: "Luster".into(),
            quantity: 100,
            cropped: false,
            crop_data: None,
        }];

        let totals = recompute_pricing(&items, None).unwrap();
        assert_eq!(totals.subtotal, 125.0);

        // 100 unknown-size prints do not unlock the 10x15 tier promo.
        assert!(recompute_pricing(&items, Some("PRINT100")).is_err());
    }
}
