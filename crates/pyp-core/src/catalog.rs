//! Catalog records: products, categories, coupons, banners and site settings.
//!
//! These are the typed views of documents kept in the schema-less store. Field
//! names serialize in camelCase so the stored JSON matches what the storefront
//! sends and reads back.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reviews::Review;
use crate::ConfigError;

/// Catalog bundled with the binary; used when the API has nothing to offer.
const EMBEDDED_CATALOG: &str = include_str!("../../../config/catalog.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Decimal>,
    #[serde(default)]
    pub image: String,
    /// Category slug, e.g. `"pickles"`.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// General availability toggle, independent of the exact count.
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub is_featured: bool,
}

impl Product {
    /// The price a customer pays per unit: the offer price when one is set.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.offer_price.unwrap_or(self.price)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.in_stock && self.stock_quantity > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    pub id: String,
    pub name: String,
    /// Used for filtering products, e.g. `"pickles"`.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    /// Always stored uppercase.
    pub code: String,
    pub discount_percent: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub image_url: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Storefront path to open, e.g. `"/shop?cat=pickles"`.
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethods {
    pub upi: bool,
    pub card: bool,
    pub cod: bool,
    pub bank_transfer: bool,
}

impl PaymentMethods {
    /// Names of the enabled methods, in display order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            ("upi", self.upi),
            ("card", self.card),
            ("cod", self.cod),
            ("bankTransfer", self.bank_transfer),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }

    #[must_use]
    pub fn allows(&self, method: &str) -> bool {
        self.enabled().iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub announcement_text: String,
    pub announcement_active: bool,
    pub marquee_text: String,
    pub marquee_active: bool,
    /// Seconds per marquee cycle.
    pub marquee_speed: u32,
    pub hero_banner_url: String,
    pub payment_methods: PaymentMethods,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            announcement_text: "Big Billion Days Sale is Live! Flat 20% OFF.".to_string(),
            announcement_active: true,
            marquee_text: "Fresh Stock Arrived! • Free Shipping on orders above ₹500 • \
                           Authentic Homemade Taste • 100% Natural Ingredients •"
                .to_string(),
            marquee_active: true,
            marquee_speed: 20,
            hero_banner_url: String::new(),
            payment_methods: PaymentMethods {
                upi: true,
                card: true,
                cod: true,
                bank_transfer: true,
            },
        }
    }
}

/// The full seed catalog: what `pyp-cli db seed` loads and what the storefront
/// falls back to when the API returns empty collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<CategoryItem>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub banners: Vec<Banner>,
    #[serde(default)]
    pub config: Option<SiteConfig>,
}

/// Load and validate a catalog seed from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogSeed, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalog(&content)
}

/// The catalog compiled into the binary.
///
/// # Errors
///
/// Returns `ConfigError` if the embedded YAML fails to parse or validate.
pub fn fallback_catalog() -> Result<CatalogSeed, ConfigError> {
    parse_catalog(EMBEDDED_CATALOG)
}

fn parse_catalog(content: &str) -> Result<CatalogSeed, ConfigError> {
    let seed: CatalogSeed = serde_yaml::from_str(content)?;
    validate_catalog(&seed)?;
    Ok(seed)
}

fn validate_catalog(seed: &CatalogSeed) -> Result<(), ConfigError> {
    let mut product_ids = HashSet::new();
    for product in &seed.products {
        if product.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "product '{}' has an empty name",
                product.id
            )));
        }
        if product.price.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "product '{}' has a negative price",
                product.id
            )));
        }
        if !product_ids.insert(product.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product id: '{}'",
                product.id
            )));
        }
    }

    let mut codes = HashSet::new();
    for coupon in &seed.coupons {
        if coupon.code != coupon.code.to_uppercase() {
            return Err(ConfigError::Validation(format!(
                "coupon code '{}' must be uppercase",
                coupon.code
            )));
        }
        if !(1..=100).contains(&coupon.discount_percent) {
            return Err(ConfigError::Validation(format!(
                "coupon '{}' has invalid discount {}; must be 1-100",
                coupon.code, coupon.discount_percent
            )));
        }
        if !codes.insert(coupon.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate coupon code: '{}'",
                coupon.code
            )));
        }
    }

    for review in &seed.reviews {
        if !(1..=5).contains(&review.rating) {
            return Err(ConfigError::Validation(format!(
                "review '{}' has invalid rating {}; must be 1-5",
                review.id, review.rating
            )));
        }
        if !product_ids.contains(review.product_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "review '{}' references unknown product '{}'",
                review.id, review.product_id
            )));
        }
    }

    Ok(())
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, offer: Option<i64>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::from(price),
            offer_price: offer.map(Decimal::from),
            image: String::new(),
            category: "pickles".to_string(),
            weight: None,
            in_stock: true,
            stock_quantity: 10,
            is_featured: false,
        }
    }

    #[test]
    fn unit_price_prefers_offer_price() {
        assert_eq!(product("1", 350, Some(299)).unit_price(), Decimal::from(299));
        assert_eq!(product("2", 250, None).unit_price(), Decimal::from(250));
    }

    #[test]
    fn fallback_catalog_parses_and_validates() {
        let seed = fallback_catalog().expect("embedded catalog");
        assert_eq!(seed.products.len(), 6);
        assert_eq!(seed.categories.len(), 3);
        assert!(seed.coupons.iter().any(|c| c.code == "NEWPICK20"));
        assert_eq!(seed.reviews.len(), 4);
        let turmeric = seed
            .products
            .iter()
            .find(|p| p.name == "Turmeric Powder")
            .expect("turmeric");
        assert_eq!(turmeric.stock_quantity, 0);
        assert!(!turmeric.is_available());
    }

    #[test]
    fn product_deserializes_from_sparse_document() {
        let doc = serde_json::json!({
            "id": "p-9",
            "name": "Garlic Pickle",
            "price": 180,
            "category": "pickles"
        });
        let p: Product = serde_json::from_value(doc).expect("product");
        assert!(p.in_stock);
        assert_eq!(p.stock_quantity, 0);
        assert!(p.offer_price.is_none());
        assert_eq!(p.description, "");
    }

    #[test]
    fn product_serializes_camel_case() {
        let json = serde_json::to_value(product("1", 350, Some(299))).expect("json");
        assert!(json.get("offerPrice").is_some());
        assert!(json.get("stockQuantity").is_some());
        assert!(json.get("isFeatured").is_some());
        assert!(json.get("weight").is_none());
    }

    #[test]
    fn validate_rejects_lowercase_coupon() {
        let seed = CatalogSeed {
            coupons: vec![Coupon {
                id: "1".to_string(),
                code: "newpick20".to_string(),
                discount_percent: 20,
                description: String::new(),
                is_active: true,
            }],
            ..CatalogSeed::default()
        };
        let err = validate_catalog(&seed).unwrap_err();
        assert!(err.to_string().contains("uppercase"));
    }

    #[test]
    fn validate_rejects_out_of_range_discount() {
        let seed = CatalogSeed {
            coupons: vec![Coupon {
                id: "1".to_string(),
                code: "HUGE".to_string(),
                discount_percent: 150,
                description: String::new(),
                is_active: true,
            }],
            ..CatalogSeed::default()
        };
        let err = validate_catalog(&seed).unwrap_err();
        assert!(err.to_string().contains("1-100"));
    }

    #[test]
    fn validate_rejects_duplicate_product_ids() {
        let seed = CatalogSeed {
            products: vec![product("1", 100, None), product("1", 200, None)],
            ..CatalogSeed::default()
        };
        let err = validate_catalog(&seed).unwrap_err();
        assert!(err.to_string().contains("duplicate product id"));
    }

    #[test]
    fn payment_methods_lists_enabled_only() {
        let methods = PaymentMethods {
            upi: true,
            card: false,
            cod: true,
            bank_transfer: false,
        };
        assert_eq!(methods.enabled(), vec!["upi", "cod"]);
        assert!(methods.allows("COD"));
        assert!(!methods.allows("card"));
    }

    #[test]
    fn load_catalog_reports_missing_file() {
        let err = load_catalog(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CatalogFileIo { .. }));
    }
}
