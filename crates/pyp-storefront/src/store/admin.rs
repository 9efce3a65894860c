//! Back-office actions: catalog, coupons, banners and site settings.
//!
//! Like the order lifecycle these are optimistic; the local list changes
//! before the API call and is not restored if the call fails.

use pyp_core::pricing::normalize_coupon_code;
use pyp_core::{Banner, CategoryItem, Collection, Coupon, Product, SiteConfig};

use crate::error::StoreError;
use crate::shipping::ShipmentProvider;

use super::Storefront;

impl<S: ShipmentProvider> Storefront<S> {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn add_product(&mut self, product: Product) -> Result<(), StoreError> {
        self.products.push(product.clone());
        let result = self.api.create(Collection::Products, &product).await;
        self.finish(result, "Product added successfully".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn update_product(&mut self, product: Product) -> Result<(), StoreError> {
        if let Some(existing) = self.products.iter_mut().find(|p| p.id == product.id) {
            *existing = product.clone();
        }
        let result = self
            .api
            .update(Collection::Products, &product.id, &product)
            .await;
        self.finish(result, "Product updated successfully".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn delete_product(&mut self, product_id: &str) -> Result<(), StoreError> {
        self.products.retain(|p| p.id != product_id);
        let result = self.api.delete(Collection::Products, product_id).await;
        self.finish(result, "Product deleted".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn add_category(&mut self, category: CategoryItem) -> Result<(), StoreError> {
        self.categories.push(category.clone());
        let result = self.api.create(Collection::Categories, &category).await;
        self.finish(result, format!("Category {} added", category.name))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn delete_category(&mut self, category_id: &str) -> Result<(), StoreError> {
        self.categories.retain(|c| c.id != category_id);
        let result = self.api.delete(Collection::Categories, category_id).await;
        self.finish(result, "Category deleted".to_string())
    }

    /// Create a coupon. The code is stored trimmed and uppercased.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank code or a percentage
    /// outside 1-100, or the API failure (409 for a duplicate code).
    pub async fn add_coupon(&mut self, mut coupon: Coupon) -> Result<(), StoreError> {
        coupon.code = normalize_coupon_code(&coupon.code);
        if coupon.code.is_empty() {
            return Err(self.report(StoreError::Validation(
                "coupon code is required".to_string(),
            )));
        }
        if !(1..=100).contains(&coupon.discount_percent) {
            return Err(self.report(StoreError::Validation(
                "discount must be between 1 and 100 percent".to_string(),
            )));
        }

        self.coupons.push(coupon.clone());
        let result = self.api.create(Collection::Coupons, &coupon).await;
        self.finish(result, format!("Coupon {} created", coupon.code))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn delete_coupon(&mut self, coupon_id: &str) -> Result<(), StoreError> {
        self.coupons.retain(|c| c.id != coupon_id);
        let result = self.api.delete(Collection::Coupons, coupon_id).await;
        self.finish(result, "Coupon deleted".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn add_banner(&mut self, banner: Banner) -> Result<(), StoreError> {
        self.banners.push(banner.clone());
        let result = self.api.create(Collection::Banners, &banner).await;
        self.finish(result, "Banner added".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn delete_banner(&mut self, banner_id: &str) -> Result<(), StoreError> {
        self.banners.retain(|b| b.id != banner_id);
        let result = self.api.delete(Collection::Banners, banner_id).await;
        self.finish(result, "Banner deleted".to_string())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the API call fails.
    pub async fn update_config(&mut self, config: SiteConfig) -> Result<(), StoreError> {
        self.config = config.clone();
        let result = self.api.save_config(&config).await;
        self.finish(result, "Settings saved".to_string())
    }

    fn finish<T>(
        &mut self,
        result: Result<T, StoreError>,
        success: String,
    ) -> Result<(), StoreError> {
        match result {
            Ok(_) => {
                self.notifier.success(success);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }
}
