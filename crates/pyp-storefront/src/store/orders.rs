//! Checkout and the order lifecycle.
//!
//! Lifecycle writes are optimistic: the local copy changes first, then the
//! partial update is sent. A failed write is reported but not rolled back.

use chrono::{DateTime, Utc};
use pyp_core::{Collection, NewOrder, Order, OrderStatus, ReturnAction, StatusUpdate};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::shipping::{Serviceability, ShipmentProvider, TrackingEvent};

use super::Storefront;

/// Delivery and payment details collected at checkout.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub shipping_address: String,
    pub city: String,
    pub pincode: String,
    pub payment_method: String,
    pub discount: Decimal,
    pub coupon_code: Option<String>,
}

impl Checkout {
    fn validate(&self) -> Result<(), StoreError> {
        for (field, value) in [
            ("shipping address", &self.shipping_address),
            ("city", &self.city),
            ("pincode", &self.pincode),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Validation(format!("{field} is required")));
            }
        }
        if self.discount < Decimal::ZERO {
            return Err(StoreError::Validation(
                "discount cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl<S: ShipmentProvider> Storefront<S> {
    /// The checkout details with the applied coupon's discount filled in.
    #[must_use]
    pub fn checkout(
        &self,
        shipping_address: &str,
        city: &str,
        pincode: &str,
        payment_method: &str,
    ) -> Checkout {
        Checkout {
            shipping_address: shipping_address.trim().to_string(),
            city: city.trim().to_string(),
            pincode: pincode.trim().to_string(),
            payment_method: payment_method.trim().to_string(),
            discount: self.discount(),
            coupon_code: self.applied_coupon.as_ref().map(|c| c.code.clone()),
        }
    }

    /// Place an order for the whole cart.
    ///
    /// Does nothing and returns `Ok(None)` when no one is signed in. On
    /// success the order is prepended locally, the cart is emptied and
    /// products are re-fetched to pick up the new stock counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty cart, missing address
    /// fields or a disabled payment method; any shipping or API failure is
    /// returned as is and leaves the cart untouched.
    pub async fn place_order(&mut self, checkout: Checkout) -> Result<Option<Order>, StoreError> {
        let Some(user_id) = self.user().map(|u| u.id.clone()) else {
            tracing::debug!("place_order without a session ignored");
            return Ok(None);
        };
        self.place_order_for(user_id, checkout, Utc::now())
            .await
            .map(Some)
            .map_err(|e| self.report(e))
    }

    async fn place_order_for(
        &mut self,
        user_id: String,
        checkout: Checkout,
        placed_at: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        if self.cart.is_empty() {
            return Err(StoreError::Validation("Your cart is empty".to_string()));
        }
        checkout.validate()?;
        if !self.config.payment_methods.allows(&checkout.payment_method) {
            return Err(StoreError::Validation(format!(
                "Payment method {} is not available",
                checkout.payment_method
            )));
        }

        let shipment = self.shipping.create_shipment(&checkout.pincode).await?;
        let order = Order::place(
            NewOrder {
                user_id,
                items: self.cart.items().to_vec(),
                discount: checkout.discount,
                coupon_code: checkout.coupon_code,
                payment_method: checkout.payment_method,
                shipping_address: checkout.shipping_address,
                city: checkout.city,
                pincode: checkout.pincode,
            },
            shipment,
            placed_at,
        );

        self.api.create(Collection::Orders, &order).await?;
        tracing::info!(
            order_id = %order.id,
            final_amount = %order.final_amount,
            units = order.unit_count(),
            "order placed"
        );

        self.orders.insert(0, order.clone());
        self.cart.clear();
        self.applied_coupon = None;
        self.persist_cart();

        if let Err(e) = self.refresh_products().await {
            tracing::warn!(error = %e, "could not refresh stock after order");
        }

        self.notifier.success("Order placed & shipment created!");
        Ok(order)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StoreError`] if the update could not be sent.
    pub async fn cancel_order(&mut self, order_id: &str) -> Result<(), StoreError> {
        self.write_order(order_id, StatusUpdate::cancel(), "Order Cancelled".to_string())
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank reason, or the send
    /// failure.
    pub async fn request_return(&mut self, order_id: &str, reason: &str) -> Result<(), StoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(self.report(StoreError::Validation(
                "Please tell us why you are returning this order".to_string(),
            )));
        }
        self.write_order(
            order_id,
            StatusUpdate::request_return(reason),
            "Return requested successfully".to_string(),
        )
        .await
    }

    /// Approve, reject or refund a return.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update could not be sent.
    pub async fn process_return_action(
        &mut self,
        order_id: &str,
        action: ReturnAction,
    ) -> Result<(), StoreError> {
        let status = action.target_status();
        self.write_order(
            order_id,
            StatusUpdate::return_action(action),
            format!("Order marked as {status}"),
        )
        .await
    }

    /// Overwrite the status, optionally recording a tracking id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update could not be sent.
    pub async fn update_order_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
        tracking_id: Option<String>,
    ) -> Result<(), StoreError> {
        self.write_order(
            order_id,
            StatusUpdate::status(status, tracking_id),
            format!("Order status updated to {status}"),
        )
        .await
    }

    /// Book a fresh shipment for an order and move it to `processing`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if booking or the update fails.
    pub async fn generate_label(&mut self, order_id: &str) -> Result<(), StoreError> {
        let pincode = self
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.pincode.clone())
            .unwrap_or_default();

        let shipment = match self.shipping.create_shipment(&pincode).await {
            Ok(s) => s,
            Err(e) => return Err(self.report(e)),
        };
        self.write_order(
            order_id,
            StatusUpdate::label(&shipment),
            "AWB Generated & Label Created".to_string(),
        )
        .await
    }

    async fn write_order(
        &mut self,
        order_id: &str,
        update: StatusUpdate,
        success: String,
    ) -> Result<(), StoreError> {
        match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => update.apply_to(order),
            None => tracing::debug!(order_id, "order not loaded locally; sending update only"),
        }

        match self.api.update(Collection::Orders, order_id, &update).await {
            Ok(_) => {
                tracing::info!(order_id, status = ?update.status, "order updated");
                self.notifier.success(success);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Logistics
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StoreError`] if the provider call fails.
    pub async fn check_serviceability(
        &mut self,
        pincode: &str,
    ) -> Result<Serviceability, StoreError> {
        let today = Utc::now().date_naive();
        match self.shipping.check_serviceability(pincode, today).await {
            Ok(s) => Ok(s),
            Err(e) => Err(self.report(e)),
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the provider call fails.
    pub async fn track_shipment(&mut self, awb: &str) -> Result<Vec<TrackingEvent>, StoreError> {
        match self.shipping.tracking_timeline(awb, Utc::now()).await {
            Ok(events) => Ok(events),
            Err(e) => Err(self.report(e)),
        }
    }
}
