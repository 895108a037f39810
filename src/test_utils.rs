//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Managed-state construction
//! - Mock data factories
//! - Helper assertions

use crate::api::ApiConfig;
use crate::db::AppState;
use crate::groups::{GroupMember, NewGroup, WorkoutGroup};
use crate::health::{HealthRecord, NewHealthRecord};
use crate::nutrition::{Meal, NewNutritionPlan, NutritionPlan};
use crate::reviews::{NewReview, Review, ReviewTarget, Reviewer};
use crate::session::{self, Session, SignUpPayload, ACTOR_CUSTOMER};
use crate::trainers::{NewTrainer, TrainerSchedule};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Persist a signed-in customer session and return it
pub async fn seed_test_session(pool: &SqlitePool) -> Session {
  let session = mock_session();
  session::save_session(pool, &session)
    .await
    .expect("Failed to seed session");
  session
}

/// Managed state pointing at an arbitrary backend base URL
pub fn test_state(pool: &SqlitePool, base_url: &str) -> Arc<AppState> {
  Arc::new(AppState::new(pool.clone(), ApiConfig::new(base_url)))
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_session() -> Session {
  Session {
    user_id: 4,
    actor: ACTOR_CUSTOMER.to_string(),
    token: "test-token".to_string(),
    token_type: "Bearer".to_string(),
    is_login: true,
    page: "/".to_string(),
  }
}

pub fn mock_sign_up_payload() -> SignUpPayload {
  SignUpPayload {
    first_name: "Alex".to_string(),
    last_name: "Chen".to_string(),
    email: "alex@gym.test".to_string(),
    password: "hunter22".to_string(),
    age: 28,
    birthday: "1997-03-14".to_string(),
    gender_id: 1,
  }
}

pub fn mock_health_record(id: i64, date: &str) -> HealthRecord {
  HealthRecord {
    id,
    user_id: 4,
    date: date.parse().expect("Invalid test date"),
    weight: 70.0,
    height: 175.0,
    fat: 18.0,
    pressure: "120/80".to_string(),
    bmi: 22.86,
    status: "Normal".to_string(),
  }
}

pub fn mock_new_health_record() -> NewHealthRecord {
  NewHealthRecord {
    date: "2025-06-10".parse().expect("Invalid test date"),
    weight: 70.0,
    height: 175.0,
    fat: 18.0,
    pressure: "120/80".to_string(),
  }
}

pub fn mock_nutrition_plan(id: i64, date: &str) -> NutritionPlan {
  NutritionPlan {
    id,
    user_id: 4,
    date: date.parse().expect("Invalid test date"),
    goal: "Bulk".to_string(),
    total_calories_per_day: 2800.0,
    protein_g: 160.0,
    fat_g: 80.0,
    carb_g: 330.0,
    note: String::new(),
  }
}

pub fn mock_new_nutrition_plan() -> NewNutritionPlan {
  NewNutritionPlan {
    date: "2025-06-10".parse().expect("Invalid test date"),
    goal: "Bulk".to_string(),
    total_calories_per_day: 2800.0,
    protein_g: 160.0,
    fat_g: 80.0,
    carb_g: 330.0,
    note: "more rice".to_string(),
  }
}

pub fn mock_meal(id: i64, timestamp: &str) -> Meal {
  Meal {
    id,
    nutrition_id: 1,
    user_id: 4,
    name: "Chicken and rice".to_string(),
    calories: 650.0,
    protein: 45.0,
    carbs: 70.0,
    fat: 15.0,
    date: datetime(timestamp),
  }
}

pub fn mock_group(id: i64, max_members: i64) -> WorkoutGroup {
  WorkoutGroup {
    id,
    name: "Morning Runners".to_string(),
    goal: "Consistency".to_string(),
    max_members,
    status: "active".to_string(),
    start_date: Some(datetime("2025-07-01T00:00:00Z")),
    creator_id: 4,
    members: vec![],
  }
}

pub fn mock_group_member(id: i64) -> GroupMember {
  GroupMember {
    id,
    name: format!("Member {}", id),
    joined_at: Some(datetime("2025-06-01T08:00:00Z")),
  }
}

pub fn mock_new_group() -> NewGroup {
  NewGroup {
    name: "Morning Runners".to_string(),
    goal: "Consistency".to_string(),
    max_members: 10,
    status: "active".to_string(),
    start_date: "2025-07-01".parse().expect("Invalid test date"),
  }
}

pub fn mock_review(id: i64, rating: i64, created_at: &str) -> Review {
  Review {
    id,
    rating,
    comment: "Solid session".to_string(),
    created_at: Some(datetime(created_at)),
    reviewer: Reviewer {
      id: 4,
      name: "Alex Chen".to_string(),
    },
  }
}

pub fn mock_new_review() -> NewReview {
  NewReview {
    rating: 5,
    comment: "Tough but fair".to_string(),
    reviewable_id: 7,
    reviewable_type: ReviewTarget::Classes,
  }
}

pub fn mock_new_trainer() -> NewTrainer {
  NewTrainer {
    first_name: "Dana".to_string(),
    last_name: "Wu".to_string(),
    email: "dana@gym.test".to_string(),
    password: "hunter22".to_string(),
    skill: "Strength".to_string(),
    tel: "0800000000".to_string(),
    gender_id: 2,
    profile_image: "/uploads/dana.png".to_string(),
  }
}

pub fn mock_schedule(id: i64, status: &str) -> TrainerSchedule {
  TrainerSchedule {
    id,
    trainer_id: 7,
    available_date: datetime("2025-06-10T00:00:00Z"),
    start_time: datetime("2025-06-10T09:00:00Z"),
    end_time: datetime("2025-06-10T10:00:00Z"),
    status: status.to_string(),
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp for fixtures
pub fn datetime(value: &str) -> DateTime<Utc> {
  value.parse().expect("Invalid test timestamp")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[tokio::test]
  #[serial]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name = 'session'",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 1, "Expected the session table to exist");

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_seed_session_persists() {
    let pool = setup_test_db().await;

    let session = seed_test_session(&pool).await;
    let loaded = session::load_session(&pool)
      .await
      .expect("Failed to load session")
      .expect("Expected a seeded session");
    assert_eq!(loaded.user_id, session.user_id);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let record = mock_health_record(1, "2025-06-10");
    assert_eq!(record.id, 1);
    assert!(record.weight > 0.0);

    let plan = mock_nutrition_plan(2, "2025-06-10");
    assert_eq!(plan.goal, "Bulk");

    let group = mock_group(3, 10);
    assert!(group.members.is_empty());

    let review = mock_review(4, 5, "2025-06-01T10:00:00Z");
    assert_eq!(review.rating, 5);
  }
}
