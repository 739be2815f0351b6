//! Promo code registry and rule evaluation.
//!
//! Two promotion mechanics exist: percentage discounts off the subtotal,
//! and free prints granted once a minimum quantity of a specific size has
//! been ordered.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{PrintItem, PrintSize};
use crate::pricing::unit_price;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromoKind {
    Percentage {
        rate: f64,
    },
    FreePrints {
        size: PrintSize,
        min_quantity: u32,
        free_quantity: u32,
    },
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Promo {
    pub code: &'static str,
    pub description: &'static str,
    #[serde(flatten)]
    pub kind: PromoKind,
}

/// Static promotion configuration; codes are keyed uppercase.
pub const REGISTRY: &[Promo] = &[
    Promo {
        code: "SAVE10",
        description: "Get 10% off your order",
        kind: PromoKind::Percentage { rate: 0.10 },
    },
    Promo {
        code: "SAVE15",
        description: "Get 15% off your order",
        kind: PromoKind::Percentage { rate: 0.15 },
    },
    Promo {
        code: "SAVE20",
        description: "Get 20% off your order",
        kind: PromoKind::Percentage { rate: 0.20 },
    },
    Promo {
        code: "FIRSTORDER",
        description: "Get 25% off your first order",
        kind: PromoKind::Percentage { rate: 0.25 },
    },
    Promo {
        code: "PRINT50",
        description: "Upload 50+ photos in 10x15, get 25 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P10x15,
            min_quantity: 50,
            free_quantity: 25,
        },
    },
    Promo {
        code: "PRINT100",
        description: "Upload 100+ photos in 10x15, get 50 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P10x15,
            min_quantity: 100,
            free_quantity: 50,
        },
    },
    Promo {
        code: "PRINT30_13X18",
        description: "Upload 30+ photos in 13x18, get 15 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P13x18,
            min_quantity: 30,
            free_quantity: 15,
        },
    },
    Promo {
        code: "PRINT60_13X18",
        description: "Upload 60+ photos in 13x18, get 30 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P13x18,
            min_quantity: 60,
            free_quantity: 30,
        },
    },
    Promo {
        code: "PRINT25_16X21",
        description: "Upload 25+ photos in 16x21, get 10 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P16x21,
            min_quantity: 25,
            free_quantity: 10,
        },
    },
    Promo {
        code: "PRINT50_16X21",
        description: "Upload 50+ photos in 16x21, get 25 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P16x21,
            min_quantity: 50,
            free_quantity: 25,
        },
    },
    Promo {
        code: "PRINT20_20X25",
        description: "Upload 20+ photos in 20x25, get 10 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P20x25,
            min_quantity: 20,
            free_quantity: 10,
        },
    },
    Promo {
        code: "PRINT40_20X25",
        description: "Upload 40+ photos in 20x25, get 20 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P20x25,
            min_quantity: 40,
            free_quantity: 20,
        },
    },
    Promo {
        code: "PRINT15_20X30",
        description: "Upload 15+ photos in 20x30, get 5 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P20x30,
            min_quantity: 15,
            free_quantity: 5,
        },
    },
    Promo {
        code: "PRINT30_20X30",
        description: "Upload 30+ photos in 20x30, get 15 free prints",
        kind: PromoKind::FreePrints {
            size: PrintSize::P20x30,
            min_quantity: 30,
            free_quantity: 15,
        },
    },
];

/// Look up a code after normalization (trimmed, uppercased).
pub fn lookup(code: &str) -> Option<&'static Promo> {
    let normalized = code.trim().to_uppercase();
    REGISTRY.iter().find(|p| p.code == normalized)
}

/// Registry split into percentage codes and free-print codes.
pub fn grouped() -> (Vec<&'static Promo>, Vec<&'static Promo>) {
    REGISTRY
        .iter()
        .partition(|p| matches!(p.kind, PromoKind::Percentage { .. }))
}

/// Result of validating a code against the current cart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoOutcome {
    pub valid: bool,
    pub discount: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_quantity: Option<u32>,
}

impl PromoOutcome {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount: 0.0,
            message: message.into(),
            discount_type: None,
            free_quantity: None,
        }
    }
}

/// Validate a promo code against the cart and compute its discount.
///
/// An invalid outcome never mutates anything; the cart and totals are left
/// untouched by the caller.
pub fn evaluate(code: &str, items: &[PrintItem], subtotal: f64) -> PromoOutcome {
    let Some(promo) = lookup(code) else {
        return PromoOutcome::invalid("Invalid promo code");
    };

    match promo.kind {
        PromoKind::Percentage { rate } => PromoOutcome {
            valid: true,
            discount: subtotal * rate,
            message: format!("{} applied!", promo.description),
            discount_type: Some("percentage".into()),
            free_quantity: None,
        },
        PromoKind::FreePrints {
            size,
            min_quantity,
            free_quantity,
        } => {
            let quantity_for_size: u32 = items
                .iter()
                .filter(|item| item.size == size)
                .map(|item| item.quantity)
                .sum();

            if quantity_for_size < min_quantity {
                return PromoOutcome::invalid(format!(
                    "You need {min_quantity} photos in {size} size to use this promo code (currently {quantity_for_size})"
                ));
            }

            // Free prints are priced at the paper of the first cart item in
            // the target size; deterministic in cart order.
            let Some(sample) = items.iter().find(|item| item.size == size) else {
                return PromoOutcome::invalid(format!("No images found with size {size}"));
            };

            let price_per_print = unit_price(size, sample.paper);
            PromoOutcome {
                valid: true,
                discount: price_per_print * f64::from(free_quantity),
                message: format!(
                    "{} - You saved {free_quantity} prints!",
                    promo.description
                ),
                discount_type: Some("free_prints".into()),
                free_quantity: Some(free_quantity),
            }
        }
    }
}
