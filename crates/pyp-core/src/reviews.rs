use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A customer review of a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    /// 1 to 5 stars.
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    /// Calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

impl Review {
    /// A review written now. The id is the current unix time in milliseconds.
    #[must_use]
    pub fn written_at(
        at: DateTime<Utc>,
        product_id: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: at.timestamp_millis().to_string(),
            product_id: product_id.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_image: None,
            rating,
            comment: comment.into(),
            date: at.date_naive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

/// Mean rating of `product_id`, rounded to one decimal. Zero reviews give 0.
#[must_use]
pub fn average_rating(reviews: &[Review], product_id: &str) -> RatingSummary {
    let (sum, count) = reviews
        .iter()
        .filter(|r| r.product_id == product_id)
        .fold((0u32, 0u32), |(sum, count), r| {
            (sum + u32::from(r.rating), count + 1)
        });

    if count == 0 {
        return RatingSummary {
            average: 0.0,
            count: 0,
        };
    }

    let mean = f64::from(sum) / f64::from(count);
    RatingSummary {
        average: (mean * 10.0).round() / 10.0,
        count,
    }
}

/// Reviews of `product_id`, newest date first.
#[must_use]
pub fn product_reviews<'a>(reviews: &'a [Review], product_id: &str) -> Vec<&'a Review> {
    let mut matching: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.product_id == product_id)
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching
}
