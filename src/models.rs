use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pricing::Totals;

/// The five print formats the studio offers, in ascending price order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PrintSize {
    #[serde(rename = "10x15")]
    P10x15,
    #[serde(rename = "13x18")]
    P13x18,
    #[serde(rename = "16x21")]
    P16x21,
    #[serde(rename = "20x25")]
    P20x25,
    #[serde(rename = "20x30")]
    P20x30,
}

impl PrintSize {
    pub const ALL: [PrintSize; 5] = [
        PrintSize::P10x15,
        PrintSize::P13x18,
        PrintSize::P16x21,
        PrintSize::P20x25,
        PrintSize::P20x30,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PrintSize::P10x15 => "10x15",
            PrintSize::P13x18 => "13x18",
            PrintSize::P16x21 => "16x21",
            PrintSize::P20x25 => "20x25",
            PrintSize::P20x30 => "20x30",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl std::fmt::Display for PrintSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaperType {
    Luster,
    Glossy,
}

impl PaperType {
    pub fn label(&self) -> &'static str {
        match self {
            PaperType::Luster => "Luster",
            PaperType::Glossy => "Glossy",
        }
    }

    /// Anything that is not recognisably glossy is priced as luster.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("glossy") {
            PaperType::Glossy
        } else {
            PaperType::Luster
        }
    }
}

impl std::fmt::Display for PaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One configured upload in the customer's cart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrintItem {
    pub size: PrintSize,
    pub paper: PaperType,
    pub quantity: u32,
    /// Reference to the cropped rendition, when the customer cropped.
    pub cropped_asset: Option<String>,
    pub original_asset: String,
}

impl PrintItem {
    pub fn new(size: PrintSize, paper: PaperType, original_asset: impl Into<String>) -> Self {
        Self {
            size,
            paper,
            quantity: 1,
            cropped_asset: None,
            original_asset: original_asset.into(),
        }
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    pub fn increment_quantity(&mut self) {
        self.quantity += 1;
    }

    /// Decrementing a quantity of 1 leaves it at 1.
    pub fn decrement_quantity(&mut self) {
        if self.quantity > 1 {
            self.quantity -= 1;
        }
    }
}

/// Checkout contact and shipping details. Field names follow the wire
/// form (`deliveryAddress[fullName]` etc).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    CardPayment,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::CardPayment => "card_payment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash_on_delivery" => Some(PaymentMethod::CashOnDelivery),
            "card_payment" => Some(PaymentMethod::CardPayment),
            _ => None,
        }
    }
}

/// Order lifecycle. Created as `Pending`; advanced only by admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub delivery_address: DeliveryAddress,
    pub pricing: Totals,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored print line of an order, pointing at the uploaded blob.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct OrderImage {
    pub id: Uuid,
    pub order_id: Uuid,
    pub size: String,
    pub paper: String,
    pub quantity: i32,
    pub cropped: bool,
    #[schema(value_type = Option<Object>)]
    pub crop_data: Option<serde_json::Value>,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_never_drops_below_one() {
        let mut item = PrintItem::new(PrintSize::P10x15, PaperType::Luster, "a.jpg");
        assert_eq!(item.quantity, 1);
        item.decrement_quantity();
        assert_eq!(item.quantity, 1);

        item.set_quantity(3);
        item.decrement_quantity();
        assert_eq!(item.quantity, 2);

        item.set_quantity(0);
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn size_labels_round_trip() {
        for size in PrintSize::ALL {
            assert_eq!(PrintSize::from_label(size.label()), Some(size));
        }
        assert_eq!(PrintSize::from_label("9x13"), None);
    }

    #[test]
    fn unknown_paper_falls_back_to_luster() {
        assert_eq!(PaperType::from_label("Glossy"), PaperType::Glossy);
        assert_eq!(PaperType::from_label("glossy"), PaperType::Glossy);
        assert_eq!(PaperType::from_label("Matte"), PaperType::Luster);
    }

    #[test]
    fn status_parses_only_the_four_values() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }
}
