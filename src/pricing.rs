//! Print pricing: the fixed (size, paper) price table and cart totals.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{PaperType, PrintItem, PrintSize};

/// Flat delivery charge applied to every order, in AED.
pub const DELIVERY_CHARGE: f64 = 29.0;

/// Glossy paper costs a flat surcharge on top of the luster price.
pub const GLOSSY_SURCHARGE: f64 = 2.0;

pub fn base_price(size: PrintSize) -> f64 {
    match size {
        PrintSize::P10x15 => 1.25,
        PrintSize::P13x18 => 2.50,
        PrintSize::P16x21 => 3.25,
        PrintSize::P20x25 => 5.0,
        PrintSize::P20x30 => 7.0,
    }
}

pub fn unit_price(size: PrintSize, paper: PaperType) -> f64 {
    let mut price = base_price(size);
    if paper == PaperType::Glossy {
        price += GLOSSY_SURCHARGE;
    }
    price
}

/// Price a raw size label. Labels that do not match a known format are
/// charged at the smallest tier rather than rejected.
pub fn unit_price_for_label(label: &str, paper: PaperType) -> f64 {
    let size = PrintSize::from_label(label).unwrap_or(PrintSize::P10x15);
    unit_price(size, paper)
}

pub fn subtotal(items: &[PrintItem]) -> f64 {
    items
        .iter()
        .map(|item| unit_price(item.size, item.paper) * f64::from(item.quantity))
        .sum()
}

/// Order pricing summary. Serialized field names match the checkout wire
/// form (`pricing[deliveryCharge]` etc).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
}

/// Recomputed on every cart mutation: item add/remove, quantity change,
/// promo apply/clear. The discount is clamped into `[0, subtotal]` so the
/// total can never go below the delivery charge.
pub fn compute_totals(items: &[PrintItem], discount: f64) -> Totals {
    let subtotal = subtotal(items);
    let discount = discount.clamp(0.0, subtotal);
    Totals {
        subtotal,
        delivery_charge: DELIVERY_CHARGE,
        discount,
        total: subtotal + DELIVERY_CHARGE - discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(size: PrintSize, paper: PaperType, quantity: u32) -> PrintItem {
        let mut item = PrintItem::new(size, paper, "upload.jpg");
        item.set_quantity(quantity);
        item
    }

    #[test]
    fn glossy_is_exactly_two_over_luster_at_every_size() {
        for size in PrintSize::ALL {
            let luster = unit_price(size, PaperType::Luster);
            let glossy = unit_price(size, PaperType::Glossy);
            assert_eq!(glossy, luster + GLOSSY_SURCHARGE);
            assert!(luster >= base_price(size));
        }
    }

    #[test]
    fn price_table_matches_the_published_rates() {
        assert_eq!(unit_price(PrintSize::P10x15, PaperType::Luster), 1.25);
        assert_eq!(unit_price(PrintSize::P13x18, PaperType::Luster), 2.50);
        assert_eq!(unit_price(PrintSize::P16x21, PaperType::Luster), 3.25);
        assert_eq!(unit_price(PrintSize::P20x25, PaperType::Luster), 5.0);
        assert_eq!(unit_price(PrintSize::P20x30, PaperType::Glossy), 9.0);
    }

    #[test]
    fn unknown_size_label_prices_at_the_smallest_tier() {
        assert_eq!(unit_price_for_label("9x13", PaperType::Luster), 1.25);
        assert_eq!(unit_price_for_label("9x13", PaperType::Glossy), 3.25);
        assert_eq!(unit_price_for_label("20x30", PaperType::Luster), 7.0);
    }

    #[test]
    fn subtotal_sums_unit_price_times_quantity() {
        let items = [
            item(PrintSize::P10x15, PaperType::Luster, 4),
            item(PrintSize::P20x25, PaperType::Glossy, 2),
        ];
        assert_eq!(subtotal(&items), 4.0 * 1.25 + 2.0 * 7.0);
    }

    #[test]
    fn empty_cart_has_zero_subtotal() {
        assert_eq!(subtotal(&[]), 0.0);
        let totals = compute_totals(&[], 0.0);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, DELIVERY_CHARGE);
    }

    #[test]
    fn totals_uphold_the_pricing_invariant() {
        let items = [item(PrintSize::P13x18, PaperType::Luster, 10)];
        let totals = compute_totals(&items, 5.0);
        assert_eq!(totals.subtotal, 25.0);
        assert_eq!(totals.discount, 5.0);
        assert_eq!(
            totals.total,
            totals.subtotal + totals.delivery_charge - totals.discount
        );
    }

    #[test]
    fn discount_is_clamped_to_the_subtotal() {
        let items = [item(PrintSize::P10x15, PaperType::Luster, 2)];
        let totals = compute_totals(&items, 100.0);
        assert_eq!(totals.discount, totals.subtotal);
        assert_eq!(totals.total, DELIVERY_CHARGE);

        let totals = compute_totals(&items, -3.0);
        assert_eq!(totals.discount, 0.0);
    }
}
