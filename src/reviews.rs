//! Reviews and star ratings for classes and trainers
//!
//! Review payloads are the least consistent data the backend produces:
//! `ID`/`id`, `Rating`/`rating`, three spellings of the creation timestamp,
//! `User`/`user` nesting, and several image-URL field names (sometimes as a
//! relative path). Normalization therefore works on raw JSON values and
//! salvages what it can; records without a usable id are skipped.

use crate::api::{self, ApiConfig, ApiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// How many reviews the preview strip shows
pub const PREVIEW_REVIEW_COUNT: usize = 2;

/// ---------------------------------------------------------------------------
/// Review Targets
/// ---------------------------------------------------------------------------

/// What a review is attached to (the backend's polymorphic `reviewable_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTarget {
  Classes,
  Trainers,
}

impl ReviewTarget {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Classes => "classes",
      Self::Trainers => "trainers",
    }
  }

  pub fn list_path(self) -> &'static str {
    match self {
      Self::Classes => "/api/classes",
      Self::Trainers => "/api/trainers",
    }
  }
}

impl std::fmt::Display for ReviewTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for ReviewTarget {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "classes" => Ok(Self::Classes),
      "trainers" => Ok(Self::Trainers),
      _ => Err(format!("Unknown review target: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub id: i64,
  pub rating: i64,
  pub comment: String,
  pub created_at: Option<DateTime<Utc>>,
  pub reviewer: Reviewer,
}

/// A reviewable class or trainer with its attached reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingItem {
  pub id: i64,
  pub name: String,
  pub category: ReviewTarget,
  pub image_url: String,
  /// Class name for classes, the trainer's skill for trainers
  pub related: String,
  pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub rating: i64,
  pub comment: String,
  pub reviewable_id: i64,
  pub reviewable_type: ReviewTarget,
}

pub fn validate_new_review(review: &NewReview) -> Result<(), ApiError> {
  if !(1..=5).contains(&review.rating) {
    return Err(ApiError::Validation("Rating must be between 1 and 5".into()));
  }
  if review.reviewable_id <= 0 {
    return Err(ApiError::Validation("Nothing selected to review".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Aggregation
/// ---------------------------------------------------------------------------

/// Arithmetic mean; 0.0 for an empty list
pub fn average_rating(reviews: &[Review]) -> f64 {
  if reviews.is_empty() {
    return 0.0;
  }
  let total: i64 = reviews.iter().map(|r| r.rating).sum();
  total as f64 / reviews.len() as f64
}

/// The newest reviews for preview display, capped at `PREVIEW_REVIEW_COUNT`
pub fn recent_reviews(reviews: &[Review]) -> Vec<Review> {
  let mut sorted = reviews.to_vec();
  sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
  sorted.truncate(PREVIEW_REVIEW_COUNT);
  sorted
}

/// ---------------------------------------------------------------------------
/// Payload Normalization
/// ---------------------------------------------------------------------------

fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().find_map(|key| value.get(key))
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .filter_map(|key| value.get(key).and_then(Value::as_str))
    .find(|s| !s.is_empty())
    .map(str::to_string)
}

fn i64_field(value: &Value, keys: &[&str]) -> Option<i64> {
  keys.iter().find_map(|key| value.get(key).and_then(Value::as_i64))
}

fn datetime_field(value: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
  string_field(value, keys)
    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
    .map(|dt| dt.with_timezone(&Utc))
}

fn person_name(value: &Value) -> String {
  let first = string_field(value, &["FirstName", "first_name"]).unwrap_or_default();
  let last = string_field(value, &["LastName", "last_name"]).unwrap_or_default();
  format!("{} {}", first, last).trim().to_string()
}

pub fn normalize_review(value: &Value) -> Option<Review> {
  let id = i64_field(value, &["ID", "id"])?;
  let user = field(value, &["User", "user"]);

  let reviewer = match user {
    Some(user) => Reviewer {
      id: i64_field(user, &["ID", "id"]).unwrap_or(0),
      name: person_name(user),
    },
    None => Reviewer {
      id: 0,
      name: String::new(),
    },
  };

  Some(Review {
    id,
    rating: i64_field(value, &["Rating", "rating"]).unwrap_or(0),
    comment: string_field(value, &["Comment", "comment"]).unwrap_or_default(),
    created_at: datetime_field(value, &["CreatedAt", "createdAt", "created_at"]),
    reviewer,
  })
}

/// Relative image paths need the backend base prefixed
fn absolutize_image(config: &ApiConfig, path: &str) -> String {
  if path.is_empty() || path.starts_with("http") {
    path.to_string()
  } else {
    config.endpoint(path)
  }
}

pub fn normalize_item(
  config: &ApiConfig,
  value: &Value,
  target: ReviewTarget,
) -> Option<TrainingItem> {
  let id = i64_field(value, &["ID", "id"])?;

  let reviews = field(value, &["Reviews", "reviews"])
    .and_then(Value::as_array)
    .map(|raw| raw.iter().filter_map(normalize_review).collect())
    .unwrap_or_default();

  let (name, related) = match target {
    ReviewTarget::Classes => {
      let name = string_field(value, &["name", "Name"]).unwrap_or_else(|| "Class".to_string());
      (name.clone(), name)
    }
    ReviewTarget::Trainers => {
      let name = match person_name(value) {
        n if n.is_empty() => "Trainer".to_string(),
        n => n,
      };
      let skill =
        string_field(value, &["skill", "Skill"]).unwrap_or_else(|| "Unspecified".to_string());
      (name, skill)
    }
  };

  let image_url = string_field(
    value,
    &["ImageURL", "image_url", "ProfileImage", "profile_image", "imageUrl"],
  )
  .map(|path| absolutize_image(config, &path))
  .unwrap_or_default();

  Some(TrainingItem {
    id,
    name,
    category: target,
    image_url,
    related,
    reviews,
  })
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReviewStore {
  pub items: Vec<TrainingItem>,
  pub category: Option<ReviewTarget>,
}

impl ReviewStore {
  pub fn set_items(&mut self, target: ReviewTarget, items: Vec<TrainingItem>) {
    self.category = Some(target);
    self.items = items;
  }

  pub fn item_by_id(&self, id: i64) -> Option<&TrainingItem> {
    self.items.iter().find(|item| item.id == id)
  }

  /// Attach a freshly accepted review to its cached item
  pub fn push_review(&mut self, item_id: i64, review: Review) {
    if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
      item.reviews.push(review);
    }
  }
}

/// ---------------------------------------------------------------------------
/// API Operations
/// ---------------------------------------------------------------------------

pub async fn fetch_items(
  config: &ApiConfig,
  token: &str,
  target: ReviewTarget,
) -> Result<Vec<TrainingItem>, ApiError> {
  let payload = api::get_json(config, target.list_path(), Some(token)).await?;
  let raw = api::unwrap_data(payload);
  let records = raw.as_array().cloned().unwrap_or_default();

  let mut items = Vec::with_capacity(records.len());
  let mut skipped = 0usize;
  for record in &records {
    match normalize_item(config, record, target) {
      Some(item) => items.push(item),
      None => skipped += 1,
    }
  }

  if skipped > 0 {
    warn!("Skipped {} malformed {} records", skipped, target);
  }

  Ok(items)
}

/// Submit a review; the server's copy of the created review comes back
pub async fn submit_review(
  config: &ApiConfig,
  token: &str,
  review: &NewReview,
) -> Result<Review, ApiError> {
  validate_new_review(review)?;

  let body = json!({
    "rating": review.rating,
    "comment": review.comment,
    "reviewableID": review.reviewable_id,
    "reviewableType": review.reviewable_type.as_str(),
  });

  let payload = api::post_json(config, "/api/reviews", Some(token), &body).await?;
  let raw = api::unwrap_data(payload);
  normalize_review(&raw).ok_or_else(|| ApiError::Decode("unrecognized review response".into()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::test_utils::*;

  #[test]
  fn test_average_rating_empty_is_zero() {
    assert_eq!(average_rating(&[]), 0.0);
  }

  #[test]
  fn test_average_rating_is_arithmetic_mean() {
    let reviews = vec![
      mock_review(1, 5, "2025-06-01T10:00:00Z"),
      mock_review(2, 4, "2025-06-02T10:00:00Z"),
      mock_review(3, 2, "2025-06-03T10:00:00Z"),
    ];
    assert_approx_eq!(average_rating(&reviews), 11.0 / 3.0, 1e-9);
  }

  #[test]
  fn test_recent_reviews_sorted_desc_and_capped_at_two() {
    let reviews = vec![
      mock_review(1, 5, "2025-06-01T10:00:00Z"),
      mock_review(2, 4, "2025-06-03T10:00:00Z"),
      mock_review(3, 3, "2025-06-02T10:00:00Z"),
      mock_review(4, 1, "2025-05-20T10:00:00Z"),
    ];

    let preview = recent_reviews(&reviews);
    assert_eq!(preview.len(), PREVIEW_REVIEW_COUNT);
    assert_eq!(preview[0].id, 2);
    assert_eq!(preview[1].id, 3);
  }

  #[test]
  fn test_recent_reviews_tie_breaks_by_id() {
    let reviews = vec![
      mock_review(7, 5, "2025-06-01T10:00:00Z"),
      mock_review(9, 4, "2025-06-01T10:00:00Z"),
    ];
    let preview = recent_reviews(&reviews);
    assert_eq!(preview[0].id, 9);
  }

  #[test]
  fn test_normalize_review_resolves_casing_variants() {
    let upper = serde_json::json!({
      "ID": 3, "Rating": 4, "Comment": "Great class",
      "CreatedAt": "2025-06-01T10:00:00Z",
      "User": {"ID": 8, "FirstName": "Alex", "LastName": "Chen"}
    });
    let review = normalize_review(&upper).unwrap();
    assert_eq!(review.id, 3);
    assert_eq!(review.rating, 4);
    assert_eq!(review.reviewer.name, "Alex Chen");

    let lower = serde_json::json!({
      "id": 4, "rating": 5, "comment": "",
      "created_at": "2025-06-02T10:00:00Z",
      "user": {"id": 9, "first_name": "Sam", "last_name": "Park"}
    });
    let review = normalize_review(&lower).unwrap();
    assert_eq!(review.id, 4);
    assert_eq!(review.reviewer.id, 9);
    assert_eq!(review.reviewer.name, "Sam Park");

    // No usable id: skipped
    assert!(normalize_review(&serde_json::json!({"rating": 5})).is_none());
  }

  #[test]
  fn test_normalize_item_trainer_name_and_relative_image() {
    let config = ApiConfig::new("http://localhost:8000");
    let value = serde_json::json!({
      "ID": 6,
      "first_name": "Dana",
      "last_name": "Wu",
      "skill": "Strength",
      "profile_image": "/uploads/dana.png",
      "Reviews": [
        {"ID": 1, "Rating": 5, "CreatedAt": "2025-06-01T10:00:00Z"}
      ]
    });

    let item = normalize_item(&config, &value, ReviewTarget::Trainers).unwrap();
    assert_eq!(item.name, "Dana Wu");
    assert_eq!(item.related, "Strength");
    assert_eq!(item.image_url, "http://localhost:8000/uploads/dana.png");
    assert_eq!(item.reviews.len(), 1);

    // Absolute URLs pass through untouched
    let value = serde_json::json!({
      "id": 7, "name": "Spin", "imageUrl": "https://cdn.gym.test/spin.jpg"
    });
    let item = normalize_item(&config, &value, ReviewTarget::Classes).unwrap();
    assert_eq!(item.name, "Spin");
    assert_eq!(item.related, "Spin");
    assert_eq!(item.image_url, "https://cdn.gym.test/spin.jpg");
  }

  #[test]
  fn test_validate_new_review_bounds() {
    let mut review = mock_new_review();
    assert!(validate_new_review(&review).is_ok());

    review.rating = 0;
    assert!(validate_new_review(&review).is_err());

    review.rating = 6;
    assert!(validate_new_review(&review).is_err());

    let mut review = mock_new_review();
    review.reviewable_id = 0;
    assert!(validate_new_review(&review).is_err());
  }

  #[test]
  fn test_target_round_trips_wire_name() {
    assert_eq!(ReviewTarget::Classes.to_string(), "classes");
    assert_eq!("trainers".parse::<ReviewTarget>().unwrap(), ReviewTarget::Trainers);
    assert!("gyms".parse::<ReviewTarget>().is_err());
  }

  #[test]
  fn test_store_push_review_targets_item() {
    let config = ApiConfig::new("http://localhost:8000");
    let value = serde_json::json!({"id": 7, "name": "Spin"});
    let item = normalize_item(&config, &value, ReviewTarget::Classes).unwrap();

    let mut store = ReviewStore::default();
    store.set_items(ReviewTarget::Classes, vec![item]);

    store.push_review(7, mock_review(1, 5, "2025-06-01T10:00:00Z"));
    store.push_review(999, mock_review(2, 1, "2025-06-01T10:00:00Z"));

    assert_eq!(store.item_by_id(7).unwrap().reviews.len(), 1);
  }

  #[tokio::test]
  async fn test_fetch_items_skips_malformed_records() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/api/classes")
      .with_status(200)
      .with_body(
        r#"[{"ID": 1, "name": "Yoga", "Reviews": []},
            {"name": "missing id"},
            {"id": 2, "Name": "HIIT"}]"#,
      )
      .create_async()
      .await;

    let config = ApiConfig::new(server.url());
    let items = fetch_items(&config, "token", ReviewTarget::Classes).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Yoga");
    assert_eq!(items[1].name, "HIIT");
  }

  #[tokio::test]
  async fn test_submit_review_returns_server_copy() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/reviews")
      .with_status(201)
      .with_body(
        r#"{"data": {"ID": 55, "Rating": 5, "Comment": "Tough but fair",
            "CreatedAt": "2025-06-05T10:00:00Z",
            "User": {"ID": 4, "FirstName": "Alex", "LastName": "Chen"}}}"#,
      )
      .create_async()
      .await;

    let config = ApiConfig::new(server.url());
    let review = submit_review(&config, "token", &mock_new_review()).await.unwrap();
    assert_eq!(review.id, 55);
    assert_eq!(review.reviewer.name, "Alex Chen");
  }
}
