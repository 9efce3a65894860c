//! The storefront: refreshable copies of the catalog and orders, plus the
//! client-owned session and cart.
//!
//! Actions are split by concern across the submodules; each one raises a
//! notification describing its outcome.

mod admin;
mod assistant;
mod auth;
mod cart;
mod orders;
mod reviews;

use pyp_assistant::{ChatRole, ChatTurn, GREETING};
use pyp_core::orders::orders_for_user;
use pyp_core::{
    fallback_catalog, AppliedCoupon, Banner, Cart, CatalogSeed, CategoryItem, Collection, Coupon,
    Order, OrderStats, Product, Review, SiteConfig, StorefrontConfig, User,
};

use crate::client::{ApiClient, AuthSession};
use crate::error::StoreError;
use crate::local::LocalStore;
use crate::notify::{Notification, Notifier};
use crate::shipping::{MockShiprocket, ShipmentProvider};

pub use assistant::CHAT_APOLOGY;
pub use orders::Checkout;
pub use reviews::ReviewDraft;

pub struct Storefront<S = MockShiprocket> {
    api: ApiClient,
    local: LocalStore,
    shipping: S,
    session: Option<AuthSession>,
    cart: Cart,
    applied_coupon: Option<AppliedCoupon>,
    products: Vec<Product>,
    categories: Vec<CategoryItem>,
    coupons: Vec<Coupon>,
    reviews: Vec<Review>,
    banners: Vec<Banner>,
    config: SiteConfig,
    orders: Vec<Order>,
    chat_history: Vec<ChatTurn>,
    notifier: Notifier,
}

impl Storefront<MockShiprocket> {
    /// Open the storefront described by `config`, restoring any saved session
    /// and cart. Call [`Storefront::refresh`] to load the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the API client cannot be built.
    pub fn open(config: &StorefrontConfig) -> Result<Self, StoreError> {
        Ok(Self::new(
            ApiClient::new(config)?,
            LocalStore::new(config.state_dir.clone()),
            MockShiprocket,
        ))
    }
}

impl<S: ShipmentProvider> Storefront<S> {
    #[must_use]
    pub fn new(mut api: ApiClient, local: LocalStore, shipping: S) -> Self {
        let session = local.load_session();
        api.set_token(session.as_ref().map(|s| s.token.clone()));
        let cart = local.load_cart();

        Self {
            api,
            local,
            shipping,
            session,
            cart,
            applied_coupon: None,
            products: Vec::new(),
            categories: Vec::new(),
            coupons: Vec::new(),
            reviews: Vec::new(),
            banners: Vec::new(),
            config: SiteConfig::default(),
            orders: Vec::new(),
            chat_history: vec![ChatTurn {
                role: ChatRole::Model,
                text: GREETING.to_string(),
            }],
            notifier: Notifier::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryItem] {
        &self.categories
    }

    #[must_use]
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    #[must_use]
    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Every order the store knows about, newest placed first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The signed-in customer's orders, newest first. Empty when signed out.
    #[must_use]
    pub fn my_orders(&self) -> Vec<&Order> {
        self.user()
            .map(|u| orders_for_user(&self.orders, &u.id))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn dashboard_stats(&self) -> OrderStats {
        OrderStats::from_orders(&self.orders)
    }

    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn dismiss_notification(&mut self) {
        self.notifier.dismiss();
    }

    // -----------------------------------------------------------------------
    // Synchronisation
    // -----------------------------------------------------------------------

    /// Reload every collection and the site settings.
    ///
    /// Empty catalog collections fall back to the built-in seed, and so does
    /// the whole catalog when the API cannot be reached. Cart lines are
    /// clamped to the fetched stock counts, and left alone when the products
    /// came from the seed.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] hit; the fallback catalog is already
    /// in place when it is returned.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let (products, categories, reviews, coupons, banners, orders, config) = futures::join!(
            self.api.list::<Product>(Collection::Products),
            self.api.list::<CategoryItem>(Collection::Categories),
            self.api.list::<Review>(Collection::Reviews),
            self.api.list::<Coupon>(Collection::Coupons),
            self.api.list::<Banner>(Collection::Banners),
            self.api.list::<Order>(Collection::Orders),
            self.api.get_config(),
        );

        let fetched = products.and_then(|products| {
            Ok((
                products,
                categories?,
                reviews?,
                coupons?,
                banners?,
                orders?,
                config?,
            ))
        });

        match fetched {
            Ok((products, categories, reviews, coupons, banners, mut orders, config)) => {
                let seed = seed_catalog();
                let live_products = !products.is_empty();
                self.products = or_seed(products, seed.products);
                self.categories = or_seed(categories, seed.categories);
                self.reviews = or_seed(reviews, seed.reviews);
                self.coupons = or_seed(coupons, seed.coupons);
                self.banners = banners;
                orders.sort_by(|a, b| b.date.cmp(&a.date));
                self.orders = orders;
                self.config = config;
                if live_products {
                    self.reconcile_cart();
                }
                tracing::debug!(
                    products = self.products.len(),
                    orders = self.orders.len(),
                    "storefront refreshed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed; using the built-in catalog");
                let seed = seed_catalog();
                self.products = seed.products;
                self.categories = seed.categories;
                self.reviews = seed.reviews;
                self.coupons = seed.coupons;
                self.banners = seed.banners;
                Err(self.report(e))
            }
        }
    }

    /// Reload products only, e.g. after an order consumed stock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails; the old list is kept.
    pub async fn refresh_products(&mut self) -> Result<(), StoreError> {
        let products = self.api.list::<Product>(Collection::Products).await?;
        let live_products = !products.is_empty();
        self.products = or_seed(products, seed_catalog().products);
        if live_products {
            self.reconcile_cart();
        }
        Ok(())
    }

    /// Clamp cart lines to live stock. Never run against the built-in
    /// catalog, whose stock figures say nothing about the real inventory.
    fn reconcile_cart(&mut self) {
        let products = &self.products;
        let adjusted = self.cart.reconcile_stock(|id| {
            products
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.stock_quantity)
        });
        if adjusted > 0 {
            tracing::info!(adjusted, "cart lines clamped to current stock");
            self.persist_cart();
        }
    }

    // -----------------------------------------------------------------------
    // Shared plumbing
    // -----------------------------------------------------------------------

    /// Log a failure, raise its notification and hand it back.
    fn report(&mut self, error: StoreError) -> StoreError {
        if error.is_user_facing() {
            tracing::debug!(error = %error, "action refused");
        } else {
            tracing::warn!(error = %error, "action failed");
        }
        self.notifier.error(error.user_message());
        error
    }

    /// Persist the cart. Failures are logged; the in-memory cart stays
    /// authoritative.
    fn persist_cart(&self) {
        if let Err(e) = self.local.save_cart(&self.cart) {
            tracing::warn!(error = %e, "could not persist cart");
        }
    }

    fn persist_session(&self) {
        if let Err(e) = self.local.save_session(self.session.as_ref()) {
            tracing::warn!(error = %e, "could not persist session");
        }
    }

    fn require_user(&self) -> Result<&User, StoreError> {
        self.user().ok_or(StoreError::NotSignedIn)
    }
}

fn seed_catalog() -> CatalogSeed {
    fallback_catalog().unwrap_or_else(|e| {
        tracing::error!(error = %e, "built-in catalog is invalid");
        CatalogSeed::default()
    })
}

fn or_seed<T>(fetched: Vec<T>, seed: Vec<T>) -> Vec<T> {
    if fetched.is_empty() {
        seed
    } else {
        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_fall_back_to_seed() {
        assert_eq!(or_seed(Vec::new(), vec![1, 2]), vec![1, 2]);
        assert_eq!(or_seed(vec![3], vec![1, 2]), vec![3]);
    }

    #[test]
    fn built_in_catalog_has_products() {
        assert!(!seed_catalog().products.is_empty());
    }
}
