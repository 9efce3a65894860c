//! Cart engine: a list of (product, quantity) lines bounded by live stock.
//!
//! The cart never holds a line whose quantity exceeds the product's
//! `stock_quantity`, and never holds a line with quantity zero. Every mutating
//! call reports a [`CartOutcome`] the caller turns into a notification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// A cart line: the product as it looked when added, plus a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.unit_price() * Decimal::from(self.quantity)
    }
}

/// Result of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    Added { name: String },
    Incremented { name: String, quantity: u32 },
    OutOfStock { name: String },
    StockLimit { available: u32 },
    Updated { quantity: u32 },
    Clamped { requested: u32, available: u32 },
    Removed,
    NotInCart,
    Cleared,
}

impl CartOutcome {
    /// `true` when the request was refused or cut short by stock.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::OutOfStock { .. }
                | Self::StockLimit { .. }
                | Self::Clamped { .. }
                | Self::NotInCart
        )
    }

    /// User-facing text for the notification this outcome raises.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Added { name } | Self::Incremented { name, .. } => {
                format!("{name} added to cart!")
            }
            Self::OutOfStock { .. } => "Sorry, this item is out of stock!".to_string(),
            Self::StockLimit { available } => {
                format!("Only {available} items available in stock!")
            }
            Self::Updated { .. } => "Cart updated".to_string(),
            Self::Clamped { available, .. } => format!("Only {available} items available!"),
            Self::Removed => "Item removed from cart".to_string(),
            Self::NotInCart => "That item is not in your cart".to_string(),
            Self::Cleared => "Cart cleared".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted lines, dropping any that violate the
    /// cart invariants (zero quantity, or more than the snapshot's stock).
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let items = items
            .into_iter()
            .filter(|i| i.quantity >= 1)
            .map(|mut i| {
                i.quantity = i.quantity.min(i.product.stock_quantity);
                i
            })
            .filter(|i| i.quantity >= 1)
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        crate::pricing::subtotal(&self.items)
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .find(|i| i.product.id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Add one unit of `product`.
    ///
    /// Refused when the product has no stock, or when one more unit would
    /// exceed its stock. The stock checked is the one on `product`, which the
    /// caller passes from the live catalog.
    pub fn add(&mut self, product: &Product) -> CartOutcome {
        if product.stock_quantity == 0 {
            return CartOutcome::OutOfStock {
                name: product.name.clone(),
            };
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            if line.quantity + 1 > product.stock_quantity {
                return CartOutcome::StockLimit {
                    available: product.stock_quantity,
                };
            }
            line.quantity += 1;
            line.product.stock_quantity = product.stock_quantity;
            return CartOutcome::Incremented {
                name: product.name.clone(),
                quantity: line.quantity,
            };
        }

        self.items.push(CartItem {
            product: product.clone(),
            quantity: 1,
        });
        CartOutcome::Added {
            name: product.name.clone(),
        }
    }

    /// Set the quantity of a line.
    ///
    /// `quantity < 1` removes the line. A quantity above the available stock is
    /// clamped to it; `live_stock` is the catalog's current count, and the
    /// line's own snapshot is used when the product is no longer listed. A
    /// clamp to zero removes the line. Unknown product ids leave the cart as is.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
        live_stock: Option<u32>,
    ) -> CartOutcome {
        if quantity < 1 {
            return self.remove(product_id);
        }

        let Some(index) = self.items.iter().position(|i| i.product.id == product_id) else {
            return CartOutcome::NotInCart;
        };

        let available = live_stock.unwrap_or(self.items[index].product.stock_quantity);
        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);

        if requested > available {
            if available == 0 {
                self.items.remove(index);
            } else {
                let line = &mut self.items[index];
                line.quantity = available;
                line.product.stock_quantity = available;
            }
            return CartOutcome::Clamped {
                requested,
                available,
            };
        }

        let line = &mut self.items[index];
        line.quantity = requested;
        if let Some(stock) = live_stock {
            line.product.stock_quantity = stock;
        }
        CartOutcome::Updated {
            quantity: requested,
        }
    }

    pub fn remove(&mut self, product_id: &str) -> CartOutcome {
        self.items.retain(|i| i.product.id != product_id);
        CartOutcome::Removed
    }

    pub fn clear(&mut self) -> CartOutcome {
        self.items.clear();
        CartOutcome::Cleared
    }

    /// Bring every line back within the catalog's current stock.
    ///
    /// `stock_of` returns the live count for a product id, or `None` when the
    /// product is no longer listed (the line is then left alone). Returns the
    /// number of lines that were clamped or dropped.
    pub fn reconcile_stock<F>(&mut self, stock_of: F) -> usize
    where
        F: Fn(&str) -> Option<u32>,
    {
        let mut adjusted = 0;
        for line in &mut self.items {
            if let Some(stock) = stock_of(&line.product.id) {
                line.product.stock_quantity = stock;
                if line.quantity > stock {
                    line.quantity = stock;
                    adjusted += 1;
                }
            }
        }
        self.items.retain(|i| i.quantity >= 1);
        adjusted
    }

    /// Take the lines out, leaving the cart empty.
    pub fn drain(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }
}
