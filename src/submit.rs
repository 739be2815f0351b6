//! Order submission assembly: the multipart field grammar shared by the
//! client builder and the server-side parser, response triage, and the
//! client-side submission state machine.

use serde::Serialize;
use thiserror::Error;

use crate::models::{DeliveryAddress, PaymentMethod, PrintItem};
use crate::pricing::Totals;

/// Wire names of the address block, in submission order.
pub const ADDRESS_FIELDS: [&str; 9] = [
    "fullName",
    "phoneNumber",
    "email",
    "addressLine1",
    "addressLine2",
    "city",
    "state",
    "zipCode",
    "country",
];

/// Wire names of the pricing block, in submission order.
pub const PRICING_FIELDS: [&str; 4] = ["subtotal", "discount", "deliveryCharge", "total"];

pub fn item_field(index: usize, name: &str) -> String {
    format!("items[{index}][{name}]")
}

/// Parse `items[3][size]` into `(3, "size")`.
pub fn parse_item_field(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("items[")?;
    let (index, rest) = rest.split_once(']')?;
    let name = rest.strip_prefix('[')?.strip_suffix(']')?;
    index.parse().ok().map(|index| (index, name))
}

pub fn address_field(name: &str) -> String {
    format!("deliveryAddress[{name}]")
}

pub fn parse_address_field(key: &str) -> Option<&str> {
    key.strip_prefix("deliveryAddress[")?.strip_suffix(']')
}

pub fn pricing_field(name: &str) -> String {
    format!("pricing[{name}]")
}

pub fn parse_pricing_field(key: &str) -> Option<&str> {
    key.strip_prefix("pricing[")?.strip_suffix(']')
}

/// A photo ready for submission: the configured cart line plus the bytes
/// that will be uploaded (the cropped rendition when one exists).
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub item: PrintItem,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Opaque crop metadata; forwarded verbatim when present.
    pub crop_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

/// The assembled multipart payload, as an ordered field list.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    fields: Vec<(String, FormPart)>,
}

/// Numbers cross the wire the way a float prints: no forced decimals.
fn amount(value: f64) -> String {
    value.to_string()
}

impl SubmissionForm {
    /// Build the transmittable payload: one `images` file part per photo,
    /// the indexed item metadata, one address block, one pricing block,
    /// payment method and promo code.
    pub fn from_cart(
        photos: &[UploadedPhoto],
        address: &DeliveryAddress,
        totals: &Totals,
        payment_method: PaymentMethod,
        promo_code: &str,
    ) -> Self {
        let mut form = Self::default();

        for (index, photo) in photos.iter().enumerate() {
            form.push_file("images", &photo.file_name, photo.bytes.clone());
            form.push_text(item_field(index, "size"), photo.item.size.label());
            form.push_text(item_field(index, "paper"), photo.item.paper.label());
            form.push_text(item_field(index, "quantity"), photo.item.quantity.to_string());
            form.push_text(
                item_field(index, "cropped"),
                photo.item.cropped_asset.is_some().to_string(),
            );
            if let Some(crop_data) = &photo.crop_data {
                form.push_text(item_field(index, "cropData"), crop_data.to_string());
            }
        }

        form.push_text(address_field("fullName"), &address.full_name);
        form.push_text(address_field("phoneNumber"), &address.phone_number);
        form.push_text(address_field("email"), &address.email);
        form.push_text(address_field("addressLine1"), &address.address_line1);
        form.push_text(address_field("addressLine2"), &address.address_line2);
        form.push_text(address_field("city"), &address.city);
        form.push_text(address_field("state"), &address.state);
        form.push_text(address_field("zipCode"), &address.zip_code);
        form.push_text(address_field("country"), &address.country);

        form.push_text(pricing_field("subtotal"), amount(totals.subtotal));
        form.push_text(pricing_field("discount"), amount(totals.discount));
        form.push_text(pricing_field("deliveryCharge"), amount(totals.delivery_charge));
        form.push_text(pricing_field("total"), amount(totals.total));

        form.push_text("paymentMethod", payment_method.as_str());
        form.push_text("promoCode", promo_code);

        form
    }

    fn push_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), FormPart::Text(value.into())));
    }

    fn push_file(&mut self, key: impl Into<String>, file_name: &str, bytes: Vec<u8>) {
        self.fields.push((
            key.into(),
            FormPart::File {
                file_name: file_name.to_string(),
                bytes,
            },
        ));
    }

    pub fn fields(&self) -> &[(String, FormPart)] {
        &self.fields
    }

    pub fn file_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, part)| matches!(part, FormPart::File { .. }))
            .count()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.iter().find_map(|(k, part)| match part {
            FormPart::Text(value) if k == key => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Outcome categories surfaced to the customer after a submission attempt.
/// None of these trigger a retry; the user re-initiates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// 200/201: the order was created.
    Confirmed,
    /// Timeout-class failure: the backend is cold-starting.
    WarmingUp,
    /// 429: too many submissions.
    RateLimited,
    /// Other 4xx: the payload was rejected.
    InvalidInput(String),
    /// Everything else.
    Failed(String),
}

pub fn classify_status(status: u16, message: Option<&str>) -> SubmissionOutcome {
    match status {
        200 | 201 => SubmissionOutcome::Confirmed,
        408 => SubmissionOutcome::WarmingUp,
        429 => SubmissionOutcome::RateLimited,
        400..=499 => SubmissionOutcome::InvalidInput(
            message
                .unwrap_or("Please check your information and try again.")
                .to_string(),
        ),
        _ => SubmissionOutcome::Failed(
            message
                .unwrap_or("Something went wrong. Please try again.")
                .to_string(),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitBlocked {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("the server has not reported ready yet")]
    ServerNotReady,
}

/// Client-side submission gate: one submission in flight at a time, and
/// none before the wake probe has reported the backend ready.
#[derive(Debug)]
pub struct SubmissionGuard {
    phase: SubmissionPhase,
    server_ready: bool,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            server_ready: false,
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn mark_server_ready(&mut self) {
        self.server_ready = true;
    }

    pub fn begin(&mut self) -> Result<(), SubmitBlocked> {
        if self.phase == SubmissionPhase::Submitting {
            return Err(SubmitBlocked::InFlight);
        }
        if !self.server_ready {
            return Err(SubmitBlocked::ServerNotReady);
        }
        self.phase = SubmissionPhase::Submitting;
        Ok(())
    }

    /// Record the terminal phase for this attempt; the guard is reusable
    /// afterwards since every failure requires the user to re-initiate.
    pub fn complete(&mut self, outcome: &SubmissionOutcome) {
        self.phase = match outcome {
            SubmissionOutcome::Confirmed => SubmissionPhase::Succeeded,
            _ => SubmissionPhase::Failed,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperType, PrintSize};
    use crate::pricing::compute_totals;

    fn photo(size: PrintSize, paper: PaperType, quantity: u32, name: &str) -> UploadedPhoto {
        let mut item = PrintItem::new(size, paper, name);
        item.set_quantity(quantity);
        UploadedPhoto {
            item,
            file_name: name.to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
            crop_data: None,
        }
    }

    fn build(photos: &[UploadedPhoto]) -> SubmissionForm {
        let items: Vec<PrintItem> = photos.iter().map(|p| p.item.clone()).collect();
        let totals = compute_totals(&items, 0.0);
        SubmissionForm::from_cart(
            photos,
            &DeliveryAddress {
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
            &totals,
            PaymentMethod::CashOnDelivery,
            "",
        )
    }

    #[test]
    fn n_items_produce_n_files_and_n_indexed_groups() {
        let photos = [
            photo(PrintSize::P10x15, PaperType::Luster, 2, "a.jpg"),
            photo(PrintSize::P13x18, PaperType::Glossy, 1, "b.jpg"),
            photo(PrintSize::P20x30, PaperType::Luster, 5, "c.jpg"),
        ];
        let form = build(&photos);

        assert_eq!(form.file_count(), 3);
        for index in 0..photos.len() {
            for name in ["size", "paper", "quantity", "cropped"] {
                assert!(
                    form.text(&item_field(index, name)).is_some(),
                    "missing items[{index}][{name}]"
                );
            }
        }
        assert!(form.text(&item_field(3, "size")).is_none());

        // Exactly one address block and one pricing block.
        for name in ADDRESS_FIELDS {
            let count = form
                .fields()
                .iter()
                .filter(|(k, _)| k == &address_field(name))
                .count();
            assert_eq!(count, 1, "deliveryAddress[{name}]");
        }
        for name in PRICING_FIELDS {
            let count = form
                .fields()
                .iter()
                .filter(|(k, _)| k == &pricing_field(name))
                .count();
            assert_eq!(count, 1, "pricing[{name}]");
        }

        assert_eq!(form.text("paymentMethod"), Some("cash_on_delivery"));
    }

    #[test]
    fn item_metadata_carries_the_cart_configuration() {
        let photos = [photo(PrintSize::P13x18, PaperType::Glossy, 7, "b.jpg")];
        let form = build(&photos);
        assert_eq!(form.text("items[0][size]"), Some("13x18"));
        assert_eq!(form.text("items[0][paper]"), Some("Glossy"));
        assert_eq!(form.text("items[0][quantity]"), Some("7"));
        assert_eq!(form.text("items[0][cropped]"), Some("false"));
        assert_eq!(form.text("pricing[deliveryCharge]"), Some("29"));
    }

    #[test]
    fn field_grammar_round_trips() {
        assert_eq!(parse_item_field("items[0][size]"), Some((0, "size")));
        assert_eq!(parse_item_field("items[12][cropData]"), Some((12, "cropData")));
        assert_eq!(parse_item_field("items[x][size]"), None);
        assert_eq!(parse_item_field("deliveryAddress[city]"), None);

        assert_eq!(parse_address_field("deliveryAddress[fullName]"), Some("fullName"));
        assert_eq!(parse_pricing_field("pricing[total]"), Some("total"));
        assert_eq!(parse_pricing_field("items[0][size]"), None);
    }

    #[test]
    fn status_triage_matches_the_checkout_categories() {
        assert_eq!(classify_status(200, None), SubmissionOutcome::Confirmed);
        assert_eq!(classify_status(201, None), SubmissionOutcome::Confirmed);
        assert_eq!(classify_status(408, None), SubmissionOutcome::WarmingUp);
        assert_eq!(classify_status(429, None), SubmissionOutcome::RateLimited);
        assert_eq!(
            classify_status(400, Some("bad address")),
            SubmissionOutcome::InvalidInput("bad address".into())
        );
        assert!(matches!(
            classify_status(500, None),
            SubmissionOutcome::Failed(_)
        ));
    }

    #[test]
    fn guard_blocks_until_ready_and_while_in_flight() {
        let mut guard = SubmissionGuard::new();
        assert_eq!(guard.begin(), Err(SubmitBlocked::ServerNotReady));

        guard.mark_server_ready();
        assert!(guard.begin().is_ok());
        assert_eq!(guard.begin(), Err(SubmitBlocked::InFlight));

        guard.complete(&SubmissionOutcome::WarmingUp);
        assert_eq!(guard.phase(), SubmissionPhase::Failed);
        // A failed attempt is terminal for that action; re-initiating is fine.
        assert!(guard.begin().is_ok());
        guard.complete(&SubmissionOutcome::Confirmed);
        assert_eq!(guard.phase(), SubmissionPhase::Succeeded);
    }
}
