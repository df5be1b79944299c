//! Review records and per-page rating statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's review of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub page_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_photo: Option<String>,
    /// Page title at the time of review, for "my reviews" listings.
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub page_logo: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub screenshot_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// User ids that liked this review.
    #[serde(default)]
    pub likes: Vec<String>,
}

/// Errors validating review input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("comment must not be empty")]
    EmptyComment,
    #[error("missing user id")]
    MissingUser,
}

fn check_rating(rating: u8) -> Result<(), ReviewError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ReviewError::RatingOutOfRange(rating))
    }
}

fn check_comment(comment: &str) -> Result<(), ReviewError> {
    if comment.trim().is_empty() {
        Err(ReviewError::EmptyComment)
    } else {
        Ok(())
    }
}

/// Input for a new review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_photo: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub screenshot_urls: Vec<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.user_id.trim().is_empty() {
            return Err(ReviewError::MissingUser);
        }
        check_rating(self.rating)?;
        check_comment(&self.comment)
    }

    /// Turn validated input into a review of `page_id`.
    pub fn into_review(
        self,
        page_id: &str,
        page_name: Option<String>,
        page_logo: Option<String>,
    ) -> Result<Review, ReviewError> {
        self.validate()?;
        Ok(Review {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page_id.to_string(),
            user_id: self.user_id,
            user_name: self.user_name,
            user_photo: self.user_photo,
            page_name,
            page_logo,
            rating: self.rating,
            comment: self.comment.trim().to_string(),
            screenshot_urls: self.screenshot_urls,
            created_at: Utc::now(),
            likes: Vec::new(),
        })
    }
}

/// An author's edit of their review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
}

impl ReviewUpdate {
    pub fn validate(&self) -> Result<(), ReviewError> {
        check_rating(self.rating)?;
        check_comment(&self.comment)
    }
}

impl Review {
    /// Apply an edit. The caller checks authorship.
    pub fn apply(&mut self, update: &ReviewUpdate) -> Result<(), ReviewError> {
        update.validate()?;
        self.rating = update.rating;
        self.comment = update.comment.trim().to_string();
        Ok(())
    }

    pub fn is_author(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Like or unlike on behalf of `user_id`. Returns whether it is now liked.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.likes.iter().position(|u| u == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }
}

/// Sort newest first.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Qualitative label for a page's average rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingBadge {
    NoReviews,
    Excellent,
    Good,
    Average,
    Poor,
    Bad,
}

impl RatingBadge {
    pub fn from_average(average: f64, total: usize) -> Self {
        if total == 0 {
            return RatingBadge::NoReviews;
        }
        match average {
            a if a >= 4.5 => RatingBadge::Excellent,
            a if a >= 3.5 => RatingBadge::Good,
            a if a >= 2.5 => RatingBadge::Average,
            a if a >= 1.5 => RatingBadge::Poor,
            _ => RatingBadge::Bad,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingBadge::NoReviews => "No reviews",
            RatingBadge::Excellent => "Excellent",
            RatingBadge::Good => "Good",
            RatingBadge::Average => "Average",
            RatingBadge::Poor => "Poor",
            RatingBadge::Bad => "Bad",
        }
    }

    pub fn label_fr(&self) -> &'static str {
        match self {
            RatingBadge::NoReviews => "Aucun avis",
            RatingBadge::Excellent => "Excellent",
            RatingBadge::Good => "Bien",
            RatingBadge::Average => "Moyen",
            RatingBadge::Poor => "Médiocre",
            RatingBadge::Bad => "Mauvais",
        }
    }
}

/// Aggregate rating figures for a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    /// Mean rating rounded to one decimal; 0 with no reviews.
    pub average: f64,
    /// Count per star; index 0 is one star.
    pub star_counts: [usize; 5],
    pub badge: RatingBadge,
    pub badge_label: &'static str,
    pub badge_label_fr: &'static str,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let total = reviews.len();
        let mut star_counts = [0usize; 5];
        let mut sum = 0u64;
        for r in reviews {
            sum += u64::from(r.rating);
            if (1..=5).contains(&r.rating) {
                star_counts[usize::from(r.rating - 1)] += 1;
            }
        }
        let average = if total == 0 {
            0.0
        } else {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };
        let badge = RatingBadge::from_average(average, total);
        Self {
            total,
            average,
            star_counts,
            badge,
            badge_label: badge.label(),
            badge_label_fr: badge.label_fr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(rating: u8) -> NewReview {
        NewReview {
            user_id: "u1".into(),
            user_name: "Alex".into(),
            user_photo: None,
            rating,
            comment: "Livraison rapide".into(),
            screenshot_urls: vec![],
        }
    }

    fn review(rating: u8) -> Review {
        new_review(rating).into_review("acme", None, None).unwrap()
    }

    #[test]
    fn test_validate() {
        assert!(new_review(5).validate().is_ok());
        assert_eq!(
            new_review(0).validate(),
            Err(ReviewError::RatingOutOfRange(0))
        );
        assert_eq!(
            new_review(6).validate(),
            Err(ReviewError::RatingOutOfRange(6))
        );

        let mut blank = new_review(3);
        blank.comment = "   ".into();
        assert_eq!(blank.validate(), Err(ReviewError::EmptyComment));

        let mut anon = new_review(3);
        anon.user_id = String::new();
        assert_eq!(anon.validate(), Err(ReviewError::MissingUser));
    }

    #[test]
    fn test_into_review() {
        let r = new_review(4)
            .into_review("acme", Some("Acme".into()), None)
            .unwrap();
        assert_eq!(r.page_id, "acme");
        assert_eq!(r.page_name.as_deref(), Some("Acme"));
        assert!(r.likes.is_empty());
        assert!(!r.id.is_empty());
    }

    #[test]
    fn test_toggle_like() {
        let mut r = review(4);
        assert!(r.toggle_like("u2"));
        assert_eq!(r.likes, vec!["u2".to_string()]);
        assert!(r.toggle_like("u3"));
        assert!(!r.toggle_like("u2"));
        assert_eq!(r.likes, vec!["u3".to_string()]);
    }

    #[test]
    fn test_apply_update() {
        let mut r = review(2);
        let update = ReviewUpdate {
            user_id: "u1".into(),
            rating: 5,
            comment: " Finalement très bien ".into(),
        };
        r.apply(&update).unwrap();
        assert_eq!(r.rating, 5);
        assert_eq!(r.comment, "Finalement très bien");

        let bad = ReviewUpdate {
            user_id: "u1".into(),
            rating: 9,
            comment: "x".into(),
        };
        assert!(r.apply(&bad).is_err());
        assert_eq!(r.rating, 5);
    }

    #[test]
    fn test_stats_empty() {
        let stats = ReviewStats::from_reviews(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.badge, RatingBadge::NoReviews);
        assert_eq!(stats.badge_label_fr, "Aucun avis");
    }

    #[test]
    fn test_stats_rounding_and_counts() {
        let reviews = vec![review(5), review(4), review(4)];
        let stats = ReviewStats::from_reviews(&reviews);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average, 4.3);
        assert_eq!(stats.star_counts, [0, 0, 0, 2, 1]);
        assert_eq!(stats.badge, RatingBadge::Good);
        assert_eq!(stats.badge_label_fr, "Bien");
    }

    #[test]
    fn test_badge_thresholds() {
        assert_eq!(RatingBadge::from_average(4.5, 1), RatingBadge::Excellent);
        assert_eq!(RatingBadge::from_average(3.5, 1), RatingBadge::Good);
        assert_eq!(RatingBadge::from_average(2.5, 1), RatingBadge::Average);
        assert_eq!(RatingBadge::from_average(1.5, 1), RatingBadge::Poor);
        assert_eq!(RatingBadge::from_average(1.4, 1), RatingBadge::Bad);
        assert_eq!(RatingBadge::Poor.label_fr(), "Médiocre");
    }

    #[test]
    fn test_sort_newest_first() {
        let mut older = review(3);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = review(5);
        let mut reviews = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut reviews);
        assert_eq!(reviews[0].id, newer.id);
        assert_eq!(reviews[1].id, older.id);
    }
}
