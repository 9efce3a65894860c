//! Knowledge context handed to the support bot with every message.

use pyp_core::orders::orders_for_user;
use pyp_core::{Order, Product, SiteConfig, User};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
    System,
}

/// One earlier message in a support conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

pub const GREETING: &str = "Namaste! I'm PickleBot. 🙏\nHow can I help you today?";

/// Build the plain-text context block: who is asking, their orders (newest
/// first), the product inventory and the store settings.
#[must_use]
pub fn build_support_context(
    user: Option<&User>,
    orders: &[Order],
    products: &[Product],
    config: &SiteConfig,
) -> String {
    let user_orders: Vec<_> = user
        .map(|u| orders_for_user(orders, &u.id))
        .unwrap_or_default()
        .into_iter()
        .map(|o| {
            json!({
                "id": o.id,
                "date": o.date.format("%Y-%m-%d").to_string(),
                "total": o.final_amount,
                "status": o.status,
                "items": o.item_summary(),
                "tracking": o.shipment.awb_code.as_deref().unwrap_or("Pending"),
            })
        })
        .collect();

    let inventory: Vec<_> = products
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "price": p.unit_price(),
                "inStock": p.is_available(),
                "category": p.category,
            })
        })
        .collect();

    let pretty = |v: &serde_json::Value| serde_json::to_string_pretty(v).unwrap_or_default();

    format!(
        "CURRENT USER:\n\
         Name: {name}\n\
         Email: {email}\n\
         ID: {id}\n\n\
         USER ORDERS (Most Recent First):\n{orders}\n\n\
         PRODUCT INVENTORY:\n{inventory}\n\n\
         STORE CONFIG:\n\
         Payment Methods: {methods}\n\
         Announcement: {announcement}\n",
        name = user.map_or("Guest", |u| u.name.as_str()),
        email = user.map_or("Not Logged In", |u| u.email.as_str()),
        id = user.map_or("N/A", |u| u.id.as_str()),
        orders = pretty(&serde_json::Value::Array(user_orders)),
        inventory = pretty(&serde_json::Value::Array(inventory)),
        methods = config.payment_methods.enabled().join(", "),
        announcement = config.announcement_text,
    )
}

/// System instruction for the support bot, wrapping `context`.
#[must_use]
pub fn support_instruction(context: &str) -> String {
    format!(
        "You are 'PickleBot', the friendly and helpful customer support AI for 'Pick Your Pickle'.\n\n\
         YOUR KNOWLEDGE BASE (CURRENT CONTEXT):\n{context}\n\
         GUIDELINES:\n\
         1. You have full access to the User's Orders, Product List, and Store Policies provided in the context above.\n\
         2. If a user asks about an order status, check the 'User Orders' section and give the status, tracking ID and items.\n\
         3. If a user asks about products, recommend items from the 'Product Inventory'.\n\
         4. If a user asks about payments, refer to the 'Store Config'.\n\
         5. Keep responses concise, warm, and professional. Use Indian English nuances (like 'Namaste', 'No worries') occasionally.\n\
         6. If the user is not logged in (User Name is Guest), politely ask them to login to track specific orders.\n\
         7. Do not invent order IDs. Only use the data provided."
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pyp_core::{CartItem, NewOrder, Role, Shipment};
    use rust_decimal::Decimal;

    use super::*;

    fn product(name: &str, stock: u32) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from(300),
            offer_price: None,
            image: String::new(),
            category: "pickles".to_string(),
            weight: None,
            in_stock: true,
            stock_quantity: stock,
            is_featured: false,
        }
    }

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Customer,
            phone: None,
        }
    }

    fn order_for(user_id: &str, awb: Option<&str>) -> Order {
        Order::place(
            NewOrder {
                user_id: user_id.to_string(),
                items: vec![CartItem {
                    product: product("Mango", 5),
                    quantity: 2,
                }],
                discount: Decimal::ZERO,
                coupon_code: None,
                payment_method: "upi".to_string(),
                shipping_address: "addr".to_string(),
                city: "Guntur".to_string(),
                pincode: "522001".to_string(),
            },
            Shipment {
                awb_code: awb.map(str::to_string),
                ..Shipment::default()
            },
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn guest_context_has_no_orders() {
        let ctx = build_support_context(
            None,
            &[order_for("u-1", Some("AWB1"))],
            &[product("Mango", 5)],
            &SiteConfig::default(),
        );
        assert!(ctx.contains("Name: Guest"));
        assert!(ctx.contains("Email: Not Logged In"));
        assert!(!ctx.contains("AWB1"));
        assert!(ctx.contains("\"Mango\""));
    }

    #[test]
    fn user_context_lists_only_their_orders() {
        let u = user();
        let ctx = build_support_context(
            Some(&u),
            &[order_for("u-1", None), order_for("u-2", Some("AWB-OTHER"))],
            &[],
            &SiteConfig::default(),
        );
        assert!(ctx.contains("Name: Asha"));
        assert!(ctx.contains("2x Mango"));
        assert!(ctx.contains("\"tracking\": \"Pending\""));
        assert!(!ctx.contains("AWB-OTHER"));
        assert!(ctx.contains("Payment Methods: upi, card, cod, bankTransfer"));
    }

    #[test]
    fn instruction_embeds_context() {
        let text = support_instruction("CTX-MARKER");
        assert!(text.contains("PickleBot"));
        assert!(text.contains("CTX-MARKER"));
    }
}
