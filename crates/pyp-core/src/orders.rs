//! Orders and their lifecycle.
//!
//! The nominal lifecycle is
//!
//! ```text
//! pending -> processing -> shipped -> delivered
//! pending | processing -> cancelled
//! delivered -> return_requested -> returned | return_rejected
//! returned -> refunded
//! ```
//!
//! [`OrderStatus::can_transition_to`] describes that graph so front ends can
//! decide which actions to offer. Writes do not consult it: a [`StatusUpdate`]
//! overwrites the status unconditionally.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::pricing;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    ReturnRequested,
    Returned,
    Refunded,
    ReturnRejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::ReturnRequested,
        Self::Returned,
        Self::Refunded,
        Self::ReturnRejected,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "return_requested",
            Self::Returned => "returned",
            Self::Refunded => "refunded",
            Self::ReturnRejected => "return_rejected",
        }
    }

    /// Whether `next` follows `self` in the nominal lifecycle.
    #[must_use]
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::{
            Cancelled, Delivered, Pending, Processing, Refunded, ReturnRejected,
            ReturnRequested, Returned, Shipped,
        };
        matches!(
            (self, next),
            (Pending, Processing | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, Delivered)
                | (Delivered, ReturnRequested)
                | (ReturnRequested, Returned | ReturnRejected)
                | (Returned, Refunded)
        )
    }

    /// Customers may cancel before the parcel leaves the warehouse.
    #[must_use]
    pub fn customer_can_cancel(self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }

    #[must_use]
    pub fn customer_can_request_return(self) -> bool {
        self.can_transition_to(Self::ReturnRequested)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Refunded | Self::ReturnRejected
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

/// Admin decision on a return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnAction {
    Approve,
    Reject,
    Refund,
}

impl ReturnAction {
    #[must_use]
    pub fn target_status(self) -> OrderStatus {
        match self {
            Self::Approve => OrderStatus::Returned,
            Self::Reject => OrderStatus::ReturnRejected,
            Self::Refund => OrderStatus::Refunded,
        }
    }
}

impl FromStr for ReturnAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "refund" => Ok(Self::Refund),
            other => Err(CoreError::InvalidReturnAction(other.to_string())),
        }
    }
}

/// Fields returned by the logistics provider when a shipment is booked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiprocket_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    /// Airway bill (tracking) code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awb_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    /// Cart lines as they were at purchase time.
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
    pub payment_method: String,
    pub shipping_address: String,
    pub city: String,
    pub pincode: String,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub shipment: Shipment,
}

/// Checkout input, before the order id and amounts are fixed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub discount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub shipping_address: String,
    pub city: String,
    pub pincode: String,
}

impl Order {
    /// Build an order from checkout input and a booked shipment.
    ///
    /// The id is derived from `placed_at` (`ORD-<unix millis>`). Orders that
    /// already have a shipment start in `processing`.
    #[must_use]
    pub fn place(new: NewOrder, shipment: Shipment, placed_at: DateTime<Utc>) -> Self {
        let total_amount = pricing::subtotal(&new.items);
        let final_amount = pricing::final_amount(total_amount, new.discount);
        let status = if shipment.awb_code.is_some() {
            OrderStatus::Processing
        } else {
            OrderStatus::Pending
        };

        Self {
            id: format!("ORD-{}", placed_at.timestamp_millis()),
            user_id: new.user_id,
            items: new.items,
            total_amount,
            discount_amount: new.discount,
            coupon_code: new.coupon_code,
            final_amount,
            status,
            return_reason: None,
            payment_method: new.payment_method,
            shipping_address: new.shipping_address,
            city: new.city,
            pincode: new.pincode,
            date: placed_at,
            shipment,
        }
    }

    /// Item summary such as `"2x Spicy Mango Pickle, 1x Banana Chips"`.
    #[must_use]
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{}x {}", i.quantity, i.product.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Partial order document written by lifecycle actions.
///
/// Only the fields that are set are sent; the store merges them into the
/// existing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiprocket_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awb_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
}

impl StatusUpdate {
    #[must_use]
    pub fn status(status: OrderStatus, tracking_id: Option<String>) -> Self {
        Self {
            status: Some(status),
            tracking_id: tracking_id.filter(|t| !t.trim().is_empty()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cancel() -> Self {
        Self::status(OrderStatus::Cancelled, None)
    }

    #[must_use]
    pub fn request_return(reason: impl Into<String>) -> Self {
        Self {
            status: Some(OrderStatus::ReturnRequested),
            return_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn return_action(action: ReturnAction) -> Self {
        Self::status(action.target_status(), None)
    }

    /// A freshly generated shipping label; moves the order to `processing`.
    #[must_use]
    pub fn label(shipment: &Shipment) -> Self {
        Self {
            status: Some(OrderStatus::Processing),
            shiprocket_order_id: shipment.shiprocket_order_id.clone(),
            shipment_id: shipment.shipment_id.clone(),
            awb_code: shipment.awb_code.clone(),
            courier_name: shipment.courier_name.clone(),
            ..Self::default()
        }
    }

    /// Overwrite the matching fields of `order`. No transition check is made.
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(reason) = &self.return_reason {
            order.return_reason = Some(reason.clone());
        }
        if let Some(tracking) = &self.tracking_id {
            order.shipment.tracking_id = Some(tracking.clone());
        }
        if let Some(v) = &self.shiprocket_order_id {
            order.shipment.shiprocket_order_id = Some(v.clone());
        }
        if let Some(v) = &self.shipment_id {
            order.shipment.shipment_id = Some(v.clone());
        }
        if let Some(v) = &self.awb_code {
            order.shipment.awb_code = Some(v.clone());
        }
        if let Some(v) = &self.courier_name {
            order.shipment.courier_name = Some(v.clone());
        }
    }
}

/// Admin dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_revenue: Decimal,
    pub order_count: usize,
    pub pending: usize,
    pub processing: usize,
    pub return_requests: usize,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        Self {
            total_revenue: orders.iter().map(|o| o.final_amount).sum(),
            order_count: orders.len(),
            pending: count(OrderStatus::Pending),
            processing: count(OrderStatus::Processing),
            return_requests: count(OrderStatus::ReturnRequested),
        }
    }
}

/// Orders belonging to `user_id`, newest first.
#[must_use]
pub fn orders_for_user<'a>(orders: &'a [Order], user_id: &str) -> Vec<&'a Order> {
    let mut mine: Vec<&Order> = orders.iter().filter(|o| o.user_id == user_id).collect();
    mine.sort_by(|a, b| b.date.cmp(&a.date));
    mine
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::Product;

    fn line(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: id.to_string(),
                name: format!("Item {id}"),
                description: String::new(),
                price: Decimal::from(price),
                offer_price: None,
                image: String::new(),
                category: "pickles".to_string(),
                weight: None,
                in_stock: true,
                stock_quantity: 10,
                is_featured: false,
            },
            quantity,
        }
    }

    fn new_order(discount: i64) -> NewOrder {
        NewOrder {
            user_id: "u-1".to_string(),
            items: vec![line("1", 300, 2), line("2", 150, 1)],
            discount: Decimal::from(discount),
            coupon_code: None,
            payment_method: "upi".to_string(),
            shipping_address: "12 MG Road".to_string(),
            city: "Guntur".to_string(),
            pincode: "522001".to_string(),
        }
    }

    fn booked() -> Shipment {
        Shipment {
            shiprocket_order_id: Some("SR-1".to_string()),
            shipment_id: Some("SHP-1".to_string()),
            awb_code: Some("AWB1".to_string()),
            courier_name: Some("BlueDart Surface".to_string()),
            ..Shipment::default()
        }
    }

    #[test]
    fn place_computes_amounts_and_id() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let order = Order::place(new_order(150), booked(), at);
        assert_eq!(order.id, format!("ORD-{}", at.timestamp_millis()));
        assert_eq!(order.total_amount, Decimal::from(750));
        assert_eq!(order.final_amount, Decimal::from(600));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.item_summary(), "2x Item 1, 1x Item 2");
    }

    #[test]
    fn final_amount_floors_at_zero() {
        let order = Order::place(new_order(5_000), booked(), Utc::now());
        assert_eq!(order.final_amount, Decimal::ZERO);
        assert_eq!(
            order.final_amount,
            (order.total_amount - order.discount_amount).max(Decimal::ZERO)
        );
    }

    #[test]
    fn order_without_shipment_starts_pending() {
        let order = Order::place(new_order(0), Shipment::default(), Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn nominal_lifecycle_graph() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(ReturnRequested));
        assert!(ReturnRequested.can_transition_to(Returned));
        assert!(ReturnRequested.can_transition_to(ReturnRejected));
        assert!(Returned.can_transition_to(Refunded));
        assert!(Pending.customer_can_cancel());
        assert!(Processing.customer_can_cancel());
        assert!(!Shipped.customer_can_cancel());
        assert!(!Delivered.customer_can_cancel());
        assert!(Delivered.customer_can_request_return());
        assert!(!Refunded.can_transition_to(Pending));
    }

    #[test]
    fn status_update_overwrites_without_guard() {
        let mut order = Order::place(new_order(0), booked(), Utc::now());
        order.status = OrderStatus::Delivered;
        StatusUpdate::cancel().apply_to(&mut order);
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn return_actions_map_to_statuses() {
        assert_eq!(
            ReturnAction::Approve.target_status(),
            OrderStatus::Returned
        );
        assert_eq!(
            ReturnAction::Reject.target_status(),
            OrderStatus::ReturnRejected
        );
        assert_eq!(ReturnAction::Refund.target_status(), OrderStatus::Refunded);
        assert!("destroy".parse::<ReturnAction>().is_err());
    }

    #[test]
    fn request_return_records_reason() {
        let mut order = Order::place(new_order(0), booked(), Utc::now());
        StatusUpdate::request_return("jar arrived cracked").apply_to(&mut order);
        assert_eq!(order.status, OrderStatus::ReturnRequested);
        assert_eq!(order.return_reason.as_deref(), Some("jar arrived cracked"));
    }

    #[test]
    fn status_update_serializes_only_set_fields() {
        let json =
            serde_json::to_value(StatusUpdate::status(OrderStatus::Shipped, Some("TRK9".into())))
                .expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "status": "shipped", "trackingId": "TRK9" })
        );
        let blank = serde_json::to_value(StatusUpdate::status(
            OrderStatus::Shipped,
            Some("  ".into()),
        ))
        .expect("json");
        assert_eq!(blank, serde_json::json!({ "status": "shipped" }));
    }

    #[test]
    fn order_round_trips_with_flat_shipment_fields() {
        let order = Order::place(new_order(0), booked(), Utc::now());
        let json = serde_json::to_value(&order).expect("json");
        assert_eq!(json["awbCode"], "AWB1");
        assert_eq!(json["status"], "processing");
        let back: Order = serde_json::from_value(json).expect("order");
        assert_eq!(back.shipment.awb_code.as_deref(), Some("AWB1"));
    }

    #[test]
    fn status_parses_from_wire_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn stats_sum_final_amounts_and_count_states() {
        let mut a = Order::place(new_order(0), booked(), Utc::now());
        let mut b = Order::place(new_order(100), Shipment::default(), Utc::now());
        a.status = OrderStatus::Processing;
        b.status = OrderStatus::Pending;
        let stats = OrderStats::from_orders(&[a, b]);
        assert_eq!(stats.total_revenue, Decimal::from(750 + 650));
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.processing, 1);
        assert_eq!(stats.order_count, 2);
    }

    #[test]
    fn orders_for_user_filters_and_sorts_newest_first() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let a = Order::place(new_order(0), booked(), early);
        let b = Order::place(new_order(0), booked(), late);
        let mut other = Order::place(new_order(0), booked(), late);
        other.user_id = "u-2".to_string();
        let all = vec![a, b, other];
        let mine = orders_for_user(&all, "u-1");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].date, late);
    }
}
