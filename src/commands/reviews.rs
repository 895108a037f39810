use crate::api::ApiError;
use crate::db::AppState;
use crate::reviews::{
  self, average_rating, recent_reviews, NewReview, Review, ReviewTarget, TrainingItem,
};
use crate::session;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::info;

/// Aggregates rendered on an item card: mean rating plus the newest reviews
#[derive(Serialize)]
pub struct ReviewSummary {
  pub average: f64,
  pub count: usize,
  pub preview: Vec<Review>,
}

/// ---------------------------------------------------------------------------
/// Refresh
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn reviews_refresh(
  state: State<'_, Arc<AppState>>,
  target: ReviewTarget,
) -> Result<Vec<TrainingItem>, ApiError> {
  let session = session::require_session(&state.db).await?;
  let items = reviews::fetch_items(&state.api, &session.token, target).await?;

  let mut store = state.reviews.write().await;
  store.set_items(target, items);
  Ok(store.items.clone())
}

#[tauri::command]
pub async fn review_summary(
  state: State<'_, Arc<AppState>>,
  item_id: i64,
) -> Result<ReviewSummary, ApiError> {
  let store = state.reviews.read().await;
  let item = store
    .item_by_id(item_id)
    .ok_or_else(|| ApiError::Validation("Unknown item".into()))?;

  Ok(ReviewSummary {
    average: average_rating(&item.reviews),
    count: item.reviews.len(),
    preview: recent_reviews(&item.reviews),
  })
}

/// ---------------------------------------------------------------------------
/// Mutations
/// ---------------------------------------------------------------------------

/// Submit and attach the accepted review to the cached item
#[tauri::command]
pub async fn review_submit(
  state: State<'_, Arc<AppState>>,
  review: NewReview,
) -> Result<Review, ApiError> {
  let session = session::require_session(&state.db).await?;
  let saved = reviews::submit_review(&state.api, &session.token, &review).await?;

  info!("Review accepted for {} {}", review.reviewable_type, review.reviewable_id);
  state
    .reviews
    .write()
    .await
    .push_review(review.reviewable_id, saved.clone());
  Ok(saved)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
