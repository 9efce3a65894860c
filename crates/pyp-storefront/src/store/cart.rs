use pyp_core::pricing::{self, INVALID_COUPON_MESSAGE};
use pyp_core::{AppliedCoupon, CartOutcome};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::shipping::ShipmentProvider;

use super::Storefront;

impl<S: ShipmentProvider> Storefront<S> {
    /// Add one unit of a listed product, checked against its live stock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the product is not in the
    /// catalog.
    pub fn add_to_cart(&mut self, product_id: &str) -> Result<CartOutcome, StoreError> {
        let Some(product) = self.product(product_id).cloned() else {
            return Err(self.report(StoreError::Validation(format!(
                "Product {product_id} not found"
            ))));
        };

        let outcome = self.cart.add(&product);
        self.after_cart_change(&outcome);
        Ok(outcome)
    }

    /// Set a line's quantity. Below one removes the line; above the stock
    /// clamps to it.
    pub fn update_cart_quantity(&mut self, product_id: &str, quantity: i64) -> CartOutcome {
        let live_stock = self.product(product_id).map(|p| p.stock_quantity);
        let outcome = self.cart.update_quantity(product_id, quantity, live_stock);
        self.after_cart_change(&outcome);
        outcome
    }

    pub fn remove_from_cart(&mut self, product_id: &str) -> CartOutcome {
        let outcome = self.cart.remove(product_id);
        self.after_cart_change(&outcome);
        outcome
    }

    pub fn clear_cart(&mut self) -> CartOutcome {
        let outcome = self.cart.clear();
        self.applied_coupon = None;
        self.after_cart_change(&outcome);
        outcome
    }

    fn after_cart_change(&mut self, outcome: &CartOutcome) {
        self.persist_cart();
        if outcome.is_warning() {
            self.notifier.error(outcome.message());
        } else {
            self.notifier.success(outcome.message());
        }
    }

    // -----------------------------------------------------------------------
    // Coupons
    // -----------------------------------------------------------------------

    /// Accept a coupon code for this checkout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] with "Invalid or expired coupon
    /// code" when no active coupon matches. Any coupon already applied stays.
    pub fn apply_coupon(&mut self, code: &str) -> Result<AppliedCoupon, StoreError> {
        let Some(applied) = pricing::apply_coupon(&self.coupons, code) else {
            return Err(self.report(StoreError::Validation(
                INVALID_COUPON_MESSAGE.to_string(),
            )));
        };

        let saved = applied.discount_for(self.cart.subtotal());
        self.notifier.success(format!(
            "Coupon {} applied! You saved ₹{saved}",
            applied.code
        ));
        self.applied_coupon = Some(applied.clone());
        Ok(applied)
    }

    pub fn remove_coupon(&mut self) {
        self.applied_coupon = None;
    }

    #[must_use]
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.applied_coupon.as_ref()
    }

    /// Discount of the applied coupon on the current subtotal.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.applied_coupon
            .as_ref()
            .map_or(Decimal::ZERO, |c| c.discount_for(self.cart.subtotal()))
    }

    /// What checkout would charge right now.
    #[must_use]
    pub fn payable(&self) -> Decimal {
        pricing::final_amount(self.cart.subtotal(), self.discount())
    }
}
