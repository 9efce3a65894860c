//! Checkout arithmetic: subtotals, coupon discounts and the payable amount.
//!
//! All amounts are whole rupees or rupee fractions held as [`Decimal`]; the
//! coupon discount is rounded to a whole rupee.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::catalog::Coupon;

pub const INVALID_COUPON_MESSAGE: &str = "Invalid or expired coupon code";

/// A coupon accepted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percent: u8,
}

impl AppliedCoupon {
    /// Discount this coupon grants on `subtotal`.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        coupon_discount(subtotal, self.discount_percent)
    }
}

/// Sum of effective unit price times quantity over every line.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// `round(subtotal * percent / 100)`, halves rounded away from zero.
#[must_use]
pub fn coupon_discount(subtotal: Decimal, percent: u8) -> Decimal {
    (subtotal * Decimal::from(percent) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Amount payable after the discount; never negative.
#[must_use]
pub fn final_amount(total: Decimal, discount: Decimal) -> Decimal {
    (total - discount).max(Decimal::ZERO)
}

/// Look up an active coupon by code.
///
/// The code is trimmed and uppercased before an exact match; blank input and
/// inactive coupons never match.
#[must_use]
pub fn find_active_coupon<'a>(coupons: &'a [Coupon], code: &str) -> Option<&'a Coupon> {
    let code = normalize_coupon_code(code);
    if code.is_empty() {
        return None;
    }
    coupons.iter().find(|c| c.is_active && c.code == code)
}

/// Resolve `code` into an [`AppliedCoupon`], if it names an active coupon.
#[must_use]
pub fn apply_coupon(coupons: &[Coupon], code: &str) -> Option<AppliedCoupon> {
    find_active_coupon(coupons, code).map(|c| AppliedCoupon {
        code: c.code.clone(),
        discount_percent: c.discount_percent,
    })
}

#[must_use]
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;

    fn coupon(code: &str, percent: u8, active: bool) -> Coupon {
        Coupon {
            id: code.to_lowercase(),
            code: code.to_string(),
            discount_percent: percent,
            description: String::new(),
            is_active: active,
        }
    }

    fn item(price: i64, offer: Option<i64>, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: format!("p-{price}"),
                name: "Pickle".to_string(),
                description: String::new(),
                price: Decimal::from(price),
                offer_price: offer.map(Decimal::from),
                image: String::new(),
                category: "pickles".to_string(),
                weight: None,
                in_stock: true,
                stock_quantity: 100,
                is_featured: false,
            },
            quantity,
        }
    }

    #[test]
    fn newpick20_on_one_thousand() {
        let coupons = vec![coupon("NEWPICK20", 20, true)];
        let applied = apply_coupon(&coupons, "NEWPICK20").expect("coupon applies");
        let subtotal = Decimal::from(1000);
        let discount = applied.discount_for(subtotal);
        assert_eq!(discount, Decimal::from(200));
        assert_eq!(final_amount(subtotal, discount), Decimal::from(800));
    }

    #[test]
    fn coupon_code_is_trimmed_and_uppercased() {
        let coupons = vec![coupon("FESTIVE10", 10, true)];
        assert!(apply_coupon(&coupons, "  festive10 ").is_some());
    }

    #[test]
    fn inactive_or_unknown_coupons_do_not_apply() {
        let coupons = vec![coupon("OLD5", 5, false)];
        assert!(apply_coupon(&coupons, "OLD5").is_none());
        assert!(apply_coupon(&coupons, "NOPE").is_none());
        assert!(apply_coupon(&coupons, "   ").is_none());
    }

    #[test]
    fn discount_rounds_half_away_from_zero() {
        // 299 * 10% = 29.9 -> 30; 245 * 10% = 24.5 -> 25; 244 * 10% = 24.4 -> 24
        assert_eq!(coupon_discount(Decimal::from(299), 10), Decimal::from(30));
        assert_eq!(coupon_discount(Decimal::from(245), 10), Decimal::from(25));
        assert_eq!(coupon_discount(Decimal::from(244), 10), Decimal::from(24));
    }

    #[test]
    fn final_amount_never_negative() {
        assert_eq!(
            final_amount(Decimal::from(100), Decimal::from(250)),
            Decimal::ZERO
        );
    }

    #[test]
    fn subtotal_uses_offer_price() {
        let items = vec![item(350, Some(299), 2), item(250, None, 1)];
        assert_eq!(subtotal(&items), Decimal::from(848));
    }
}
