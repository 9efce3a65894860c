use chrono::{NaiveDate, Utc};
use pyp_core::reviews::{average_rating, product_reviews};
use pyp_core::{Collection, RatingSummary, Review};

use crate::error::StoreError;
use crate::shipping::ShipmentProvider;

use super::Storefront;

/// A review entered by an admin on a customer's behalf.
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
    pub rating: u8,
    pub comment: String,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

fn check_rating(rating: u8) -> Result<(), StoreError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "rating must be between 1 and 5, got {rating}"
        )))
    }
}

impl<S: ShipmentProvider> Storefront<S> {
    #[must_use]
    pub fn product_reviews(&self, product_id: &str) -> Vec<&Review> {
        product_reviews(&self.reviews, product_id)
    }

    #[must_use]
    pub fn average_rating(&self, product_id: &str) -> RatingSummary {
        average_rating(&self.reviews, product_id)
    }

    /// Review a product as the signed-in user. Returns `Ok(None)` when no one
    /// is signed in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a rating outside 1-5, or the
    /// send failure (the review stays in the local list).
    pub async fn add_review(
        &mut self,
        product_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<Option<Review>, StoreError> {
        let Some(user) = self.user().cloned() else {
            return Ok(None);
        };
        if let Err(e) = check_rating(rating) {
            return Err(self.report(e));
        }

        let review = Review::written_at(
            Utc::now(),
            product_id,
            user.id,
            user.name,
            rating,
            comment.trim(),
        );
        self.publish_review(review, "Thank you for your review!")
            .await
            .map(Some)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a bad rating or blank author, or
    /// the send failure.
    pub async fn admin_add_review(&mut self, draft: ReviewDraft) -> Result<Review, StoreError> {
        if let Err(e) = check_rating(draft.rating) {
            return Err(self.report(e));
        }
        if draft.user_name.trim().is_empty() {
            return Err(self.report(StoreError::Validation(
                "reviewer name is required".to_string(),
            )));
        }

        let now = Utc::now();
        let mut review = Review::written_at(
            now,
            draft.product_id,
            draft.user_id,
            draft.user_name.trim(),
            draft.rating,
            draft.comment.trim(),
        );
        review.user_image = draft.user_image;
        review.date = draft.date.unwrap_or(review.date);

        self.publish_review(review, "Review added successfully").await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete could not be sent.
    pub async fn delete_review(&mut self, review_id: &str) -> Result<(), StoreError> {
        self.reviews.retain(|r| r.id != review_id);
        match self.api.delete(Collection::Reviews, review_id).await {
            Ok(()) => {
                self.notifier.success("Review deleted");
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn publish_review(
        &mut self,
        review: Review,
        success: &str,
    ) -> Result<Review, StoreError> {
        self.reviews.insert(0, review.clone());
        match self.api.create(Collection::Reviews, &review).await {
            Ok(_) => {
                tracing::info!(review_id = %review.id, product_id = %review.product_id, "review added");
                self.notifier.success(success);
                Ok(review)
            }
            Err(e) => Err(self.report(e)),
        }
    }
}
