use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{Review, ReviewStatus};
use crate::services::object;
use crate::store::{DocumentStore, Order};

const COLLECTION: &str = "reviews";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    #[serde(default)]
    pub user_id: String,
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub service: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReview {
    #[serde(default)]
    pub status: String,
    pub is_published: Option<bool>,
}

/// One filter definition serves both query paths: `conditions` feeds the
/// store, `matches` re-applies the same predicate in-process. A listing
/// answered by the fallback scan is therefore identical to one answered by
/// the filtered query.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewFilter {
    All,
    ByUser(String),
    ByStatus(ReviewStatus),
    ByPublished(bool),
    ByUserAndStatus(String, ReviewStatus),
    ByUserAndPublished(String, bool),
    ByStatusAndPublished(ReviewStatus, bool),
    ByUserAndStatusAndPublished(String, ReviewStatus, bool),
}

impl ReviewFilter {
    pub fn from_params(
        user_id: Option<String>,
        status: Option<ReviewStatus>,
        published: Option<bool>,
    ) -> Self {
        use ReviewFilter::*;
        match (user_id, status, published) {
            (None, None, None) => All,
            (Some(u), None, None) => ByUser(u),
            (None, Some(s), None) => ByStatus(s),
            (None, None, Some(p)) => ByPublished(p),
            (Some(u), Some(s), None) => ByUserAndStatus(u, s),
            (Some(u), None, Some(p)) => ByUserAndPublished(u, p),
            (None, Some(s), Some(p)) => ByStatusAndPublished(s, p),
            (Some(u), Some(s), Some(p)) => ByUserAndStatusAndPublished(u, s, p),
        }
    }

    fn conditions(&self) -> Vec<(&'static str, Value)> {
        use ReviewFilter::*;
        match self {
            All => vec![],
            ByUser(u) => vec![("userId", json!(u))],
            ByStatus(s) => vec![("status", json!(s))],
            ByPublished(p) => vec![("isPublished", json!(p))],
            ByUserAndStatus(u, s) => vec![("userId", json!(u)), ("status", json!(s))],
            ByUserAndPublished(u, p) => vec![("userId", json!(u)), ("isPublished", json!(p))],
            ByStatusAndPublished(s, p) => vec![("status", json!(s)), ("isPublished", json!(p))],
            ByUserAndStatusAndPublished(u, s, p) => vec![
                ("userId", json!(u)),
                ("status", json!(s)),
                ("isPublished", json!(p)),
            ],
        }
    }

    fn matches(&self, review: &Review) -> bool {
        use ReviewFilter::*;
        match self {
            All => true,
            ByUser(u) => review.user_id == *u,
            ByStatus(s) => review.status == *s,
            ByPublished(p) => review.is_published == *p,
            ByUserAndStatus(u, s) => review.user_id == *u && review.status == *s,
            ByUserAndPublished(u, p) => review.user_id == *u && review.is_published == *p,
            ByStatusAndPublished(s, p) => review.status == *s && review.is_published == *p,
            ByUserAndStatusAndPublished(u, s, p) => {
                review.user_id == *u && review.status == *s && review.is_published == *p
            }
        }
    }
}

pub async fn create(store: &dyn DocumentStore, req: NewReview) -> Result<String, AppError> {
    let rating = match req.rating {
        Some(r) if !req.user_id.is_empty() && !req.comment.is_empty() => r,
        _ => {
            return Err(AppError::validation(
                "User ID, rating, and comment are required",
            ))
        }
    };
    if !(1..=5).contains(&rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }

    let author = store
        .get("users", &req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let user_name = match author.data.get("username").and_then(|v| v.as_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "Anonymous".to_string(),
    };
    let user_email = author
        .data
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let review_id = store
        .insert(
            COLLECTION,
            object(json!({
                "userId": req.user_id,
                "userName": user_name,
                "userEmail": user_email,
                "rating": rating,
                "comment": req.comment,
                "service": req.service,
                "status": ReviewStatus::Pending,
                "isPublished": false,
            })),
        )
        .await?;

    tracing::info!(review_id = %review_id, user_id = %req.user_id, rating = rating, "review submitted");
    Ok(review_id)
}

pub async fn moderate(
    store: &dyn DocumentStore,
    review_id: &str,
    req: ModerateReview,
) -> Result<(), AppError> {
    let target = ReviewStatus::parse(&req.status)
        .filter(|s| *s != ReviewStatus::Pending)
        .ok_or_else(|| AppError::validation("Status must be approved or rejected"))?;

    let stored = store
        .get(COLLECTION, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
    let current = stored
        .data
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(ReviewStatus::parse)
        .unwrap_or(ReviewStatus::Pending);

    if !current.can_moderate_to(target) {
        return Err(AppError::validation(format!(
            "Cannot change review status from {} to {}",
            current.as_str(),
            target.as_str()
        )));
    }

    // A rejected review is never published, whatever the caller says.
    let published = match target {
        ReviewStatus::Approved => req.is_published.unwrap_or(true),
        _ => false,
    };

    store
        .update(
            COLLECTION,
            review_id,
            object(json!({ "status": target, "isPublished": published })),
        )
        .await?;

    tracing::info!(
        review_id = %review_id,
        status = target.as_str(),
        published = published,
        "review moderated"
    );
    Ok(())
}

pub async fn delete(store: &dyn DocumentStore, review_id: &str) -> Result<(), AppError> {
    store
        .get(COLLECTION, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
    store.delete(COLLECTION, review_id).await?;
    tracing::info!(review_id = %review_id, "review deleted");
    Ok(())
}

pub async fn list(store: &dyn DocumentStore, filter: &ReviewFilter) -> Result<Vec<Review>, AppError> {
    let docs = match store
        .query(COLLECTION, &filter.conditions(), Some(Order::CreatedDesc))
        .await
    {
        Ok(docs) => docs,
        Err(err) => {
            tracing::warn!(error = %err, "filtered review query failed, falling back to full scan");
            store.query(COLLECTION, &[], None).await?
        }
    };

    let mut reviews: Vec<Review> = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value::<Review>(doc.into_value()) {
            Ok(r) => reviews.push(r),
            Err(e) => tracing::warn!(error = %e, "skipping malformed review document"),
        }
    }
    reviews.retain(|r| filter.matches(r));
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(reviews)
}
