//! Logistics provider seam. Only a mock exists: it books shipments with
//! random ids, answers serviceability from the pincode and replays a fixed
//! tracking timeline.

use std::future::Future;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use pyp_core::Shipment;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::StoreError;

const MOCK_COURIER: &str = "BlueDart Surface";
const MOCK_RATE: i64 = 65;
const MOCK_TRANSIT_DAYS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Serviceability {
    pub available: bool,
    pub courier_name: String,
    pub rate: Decimal,
    pub estimated_delivery: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStepStatus {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
    /// `None` for steps that have not happened yet.
    pub at: Option<DateTime<Utc>>,
    pub activity: &'static str,
    pub location: &'static str,
    pub status: TrackingStepStatus,
}

pub trait ShipmentProvider {
    /// Book a shipment for an order going to `pincode`.
    fn create_shipment(
        &self,
        pincode: &str,
    ) -> impl Future<Output = Result<Shipment, StoreError>> + Send;

    fn check_serviceability(
        &self,
        pincode: &str,
        today: NaiveDate,
    ) -> impl Future<Output = Result<Serviceability, StoreError>> + Send;

    fn tracking_timeline(
        &self,
        awb: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TrackingEvent>, StoreError>> + Send;
}

/// Always-successful stand-in for the Shiprocket API.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockShiprocket;

impl ShipmentProvider for MockShiprocket {
    async fn create_shipment(&self, pincode: &str) -> Result<Shipment, StoreError> {
        let (order_no, shipment_no, awb_no) = {
            let mut rng = rand::rng();
            (
                rng.random_range(0..1_000_000u32),
                rng.random_range(0..1_000_000u32),
                rng.random_range(0..1_000_000_000u32),
            )
        };

        let shipment = Shipment {
            shiprocket_order_id: Some(format!("SR-{order_no}")),
            shipment_id: Some(format!("SHP-{shipment_no}")),
            awb_code: Some(format!("AWB{awb_no}")),
            courier_name: Some(MOCK_COURIER.to_string()),
            estimated_delivery: None,
            tracking_id: None,
        };
        tracing::debug!(pincode, awb = ?shipment.awb_code, "mock shipment booked");
        Ok(shipment)
    }

    async fn check_serviceability(
        &self,
        pincode: &str,
        today: NaiveDate,
    ) -> Result<Serviceability, StoreError> {
        Ok(mock_serviceability(pincode, today))
    }

    async fn tracking_timeline(
        &self,
        _awb: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrackingEvent>, StoreError> {
        Ok(mock_timeline(now))
    }
}

/// Six-digit pincodes not starting with `9` are serviceable.
fn mock_serviceability(pincode: &str, today: NaiveDate) -> Serviceability {
    let pincode = pincode.trim();
    let serviceable = pincode.len() == 6
        && pincode.chars().all(|c| c.is_ascii_digit())
        && !pincode.starts_with('9');

    if serviceable {
        Serviceability {
            available: true,
            courier_name: MOCK_COURIER.to_string(),
            rate: Decimal::from(MOCK_RATE),
            estimated_delivery: Some(today + Duration::days(MOCK_TRANSIT_DAYS)),
        }
    } else {
        Serviceability {
            available: false,
            courier_name: String::new(),
            rate: Decimal::ZERO,
            estimated_delivery: None,
        }
    }
}

fn mock_timeline(now: DateTime<Utc>) -> Vec<TrackingEvent> {
    let done = |hours_ago: i64, activity: &'static str, location: &'static str| TrackingEvent {
        at: Some(now - Duration::hours(hours_ago)),
        activity,
        location,
        status: TrackingStepStatus::Done,
    };
    let pending = |activity: &'static str, location: &'static str| TrackingEvent {
        at: None,
        activity,
        location,
        status: TrackingStepStatus::Pending,
    };

    vec![
        done(72, "Order Placed", "Website"),
        done(48, "Pick Up Scheduled", "Guntur Warehouse"),
        done(44, "Order Picked Up", "Guntur Warehouse"),
        done(24, "Arrived at Origin Hub", "Vijayawada Hub"),
        TrackingEvent {
            at: Some(now - Duration::hours(12)),
            activity: "In Transit",
            location: "Hyderabad Apex",
            status: TrackingStepStatus::Current,
        },
        pending("Out for Delivery", "Destination City"),
        pending("Delivered", "Customer Address"),
    ]
}
