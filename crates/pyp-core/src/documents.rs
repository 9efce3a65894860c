//! Schema-less document collections and the light validation applied to them
//! at the API boundary.
//!
//! Documents are arbitrary JSON objects. Only a handful of well-known fields
//! are checked; everything else is stored as sent.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::orders::OrderStatus;
use crate::pricing::normalize_coupon_code;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Reviews,
    Coupons,
    Banners,
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Products,
        Self::Categories,
        Self::Reviews,
        Self::Coupons,
        Self::Banners,
        Self::Orders,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Reviews => "reviews",
            Self::Coupons => "coupons",
            Self::Banners => "banners",
            Self::Orders => "orders",
        }
    }

    /// Orders are kept forever.
    #[must_use]
    pub fn allows_delete(self) -> bool {
        self != Self::Orders
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCollection(s.to_string()))
    }
}

/// The `id` of a document as a string. Numeric ids are accepted.
#[must_use]
pub fn document_id(doc: &Value) -> Option<String> {
    match doc.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Check and normalise a document body before it is stored.
///
/// `partial` is true for updates, where absent fields are left alone.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when the body is not an object or a
/// known field is out of range.
pub fn validate_document(
    collection: Collection,
    body: Value,
    partial: bool,
) -> Result<Map<String, Value>, CoreError> {
    let Value::Object(mut doc) = body else {
        return Err(CoreError::field("body", "must be a JSON object"));
    };

    match collection {
        Collection::Coupons => {
            match doc.get("code") {
                Some(Value::String(code)) => {
                    let code = normalize_coupon_code(code);
                    if code.is_empty() {
                        return Err(CoreError::field("code", "must not be empty"));
                    }
                    doc.insert("code".to_string(), Value::String(code));
                }
                Some(_) => return Err(CoreError::field("code", "must be a string")),
                None if !partial => return Err(CoreError::field("code", "is required")),
                None => {}
            }
            check_integer_range(&doc, "discountPercent", 1, 100, partial)?;
        }
        Collection::Reviews => {
            check_integer_range(&doc, "rating", 1, 5, partial)?;
        }
        Collection::Products => {
            if let Some(price) = doc.get("price") {
                match numeric(price) {
                    Some(p) if p >= 0.0 => {}
                    _ => return Err(CoreError::field("price", "must be a number >= 0")),
                }
            } else if !partial {
                return Err(CoreError::field("price", "is required"));
            }
            if let Some(offer) = doc.get("offerPrice").filter(|v| !v.is_null()) {
                match numeric(offer) {
                    Some(p) if p >= 0.0 => {}
                    _ => return Err(CoreError::field("offerPrice", "must be a number >= 0")),
                }
            }
            check_integer_range(&doc, "stockQuantity", 0, i64::from(u32::MAX), true)?;
        }
        Collection::Orders => {
            if let Some(status) = doc.get("status") {
                let status = status
                    .as_str()
                    .ok_or_else(|| CoreError::field("status", "must be a string"))?;
                OrderStatus::from_str(status)?;
            }
        }
        Collection::Categories | Collection::Banners => {}
    }

    Ok(doc)
}

/// Numbers, or strings holding a number (decimals serialize as strings).
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_integer_range(
    doc: &Map<String, Value>,
    field: &str,
    min: i64,
    max: i64,
    optional: bool,
) -> Result<(), CoreError> {
    let Some(value) = doc.get(field) else {
        return if optional {
            Ok(())
        } else {
            Err(CoreError::field(field, "is required"))
        };
    };
    match value.as_i64() {
        Some(n) if (min..=max).contains(&n) => Ok(()),
        _ => Err(CoreError::field(
            field,
            format!("must be an integer between {min} and {max}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().unwrap(), c);
        }
        assert!("users".parse::<Collection>().is_err());
        assert!(!Collection::Orders.allows_delete());
        assert!(Collection::Products.allows_delete());
    }

    #[test]
    fn document_id_accepts_strings_and_numbers() {
        assert_eq!(document_id(&json!({"id": "p-1"})).as_deref(), Some("p-1"));
        assert_eq!(document_id(&json!({"id": 42})).as_deref(), Some("42"));
        assert_eq!(document_id(&json!({"id": ""})), None);
        assert_eq!(document_id(&json!({"name": "x"})), None);
    }

    #[test]
    fn coupon_code_is_uppercased() {
        let doc = validate_document(
            Collection::Coupons,
            json!({"code": " monsoon15 ", "discountPercent": 15}),
            false,
        )
        .unwrap();
        assert_eq!(doc["code"], "MONSOON15");
    }

    #[test]
    fn coupon_discount_must_be_in_range() {
        let err = validate_document(
            Collection::Coupons,
            json!({"code": "BIG", "discountPercent": 0}),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("discountPercent"));
        assert!(validate_document(
            Collection::Coupons,
            json!({"code": "BIG", "discountPercent": 101}),
            false
        )
        .is_err());
    }

    #[test]
    fn partial_coupon_update_may_omit_code() {
        let doc =
            validate_document(Collection::Coupons, json!({"isActive": false}), true).unwrap();
        assert_eq!(doc["isActive"], false);
    }

    #[test]
    fn review_rating_bounds() {
        assert!(validate_document(Collection::Reviews, json!({"rating": 6}), false).is_err());
        assert!(validate_document(Collection::Reviews, json!({"rating": 5}), false).is_ok());
        assert!(validate_document(Collection::Reviews, json!({"comment": "x"}), true).is_ok());
    }

    #[test]
    fn product_price_accepts_decimal_strings() {
        assert!(validate_document(
            Collection::Products,
            json!({"name": "X", "price": "299.50", "stockQuantity": 3}),
            false
        )
        .is_ok());
        assert!(validate_document(Collection::Products, json!({"price": -1}), false).is_err());
        assert!(
            validate_document(Collection::Products, json!({"stockQuantity": -2}), true).is_err()
        );
    }

    #[test]
    fn order_status_must_be_known() {
        assert!(validate_document(Collection::Orders, json!({"status": "shipped"}), true).is_ok());
        assert!(validate_document(Collection::Orders, json!({"status": "lost"}), true).is_err());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(validate_document(Collection::Banners, json!([1, 2]), false).is_err());
    }
}
