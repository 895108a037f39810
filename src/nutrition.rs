//! Nutrition plans and meal entries
//!
//! Plans are keyed by day: the store maps ISO dates to the latest known
//! server record and derives the "current" plan as the maximum date. Field
//! spellings vary between backend revisions; serde aliases resolve them.

use crate::api::{self, ApiConfig, ApiError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionPlan {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "UserID")]
  pub user_id: i64,
  pub date: NaiveDate,
  #[serde(default)]
  pub goal: String,
  #[serde(
    default,
    alias = "TotalCaloriesPerDay",
    alias = "totalCaloriesPerDay"
  )]
  pub total_calories_per_day: f64,
  #[serde(default, alias = "ProteinG", alias = "proteinG")]
  pub protein_g: f64,
  #[serde(default, alias = "FatG", alias = "fatG")]
  pub fat_g: f64,
  #[serde(default, alias = "CarbG", alias = "carbG")]
  pub carb_g: f64,
  #[serde(default)]
  pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNutritionPlan {
  pub date: NaiveDate,
  pub goal: String,
  pub total_calories_per_day: f64,
  pub protein_g: f64,
  pub fat_g: f64,
  pub carb_g: f64,
  pub note: String,
}

/// A meal entry logged under a day's plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "NutritionID")]
  pub nutrition_id: i64,
  #[serde(default, alias = "UserID")]
  pub user_id: i64,
  pub name: String,
  #[serde(default)]
  pub calories: f64,
  #[serde(default)]
  pub protein: f64,
  #[serde(default)]
  pub carbs: f64,
  #[serde(default)]
  pub fat: f64,
  pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeal {
  pub name: String,
  pub calories: f64,
  pub protein: f64,
  pub carbs: f64,
  pub fat: f64,
  pub date: DateTime<Utc>,
}

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

pub fn validate_new_plan(plan: &NewNutritionPlan) -> Result<(), ApiError> {
  if plan.goal.trim().is_empty() {
    return Err(ApiError::Validation("A goal is required".into()));
  }
  if plan.total_calories_per_day <= 0.0 {
    return Err(ApiError::Validation("Daily calories must be greater than zero".into()));
  }
  if plan.protein_g < 0.0 || plan.fat_g < 0.0 || plan.carb_g < 0.0 {
    return Err(ApiError::Validation("Macros cannot be negative".into()));
  }
  Ok(())
}

pub fn validate_new_meal(meal: &NewMeal) -> Result<(), ApiError> {
  if meal.name.trim().is_empty() {
    return Err(ApiError::Validation("Meal name is required".into()));
  }
  if meal.calories < 0.0 {
    return Err(ApiError::Validation("Calories cannot be negative".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct NutritionStore {
  pub plans: BTreeMap<NaiveDate, NutritionPlan>,
  pub meals: Vec<Meal>,
}

impl NutritionStore {
  /// Rebuild the date mapping. When two records share a date, the higher id
  /// (newest server row) wins.
  pub fn set_plans(&mut self, plans: Vec<NutritionPlan>) {
    self.plans.clear();
    for plan in plans {
      self.upsert(plan);
    }
  }

  pub fn upsert(&mut self, plan: NutritionPlan) {
    match self.plans.get(&plan.date) {
      Some(existing) if existing.id > plan.id => {}
      _ => {
        self.plans.insert(plan.date, plan);
      }
    }
  }

  /// The plan with the maximum date across all cached entries
  pub fn latest(&self) -> Option<&NutritionPlan> {
    self.plans.last_key_value().map(|(_, plan)| plan)
  }

  pub fn plan_for(&self, date: NaiveDate) -> Option<&NutritionPlan> {
    self.plans.get(&date)
  }

  pub fn set_meals(&mut self, mut meals: Vec<Meal>) {
    meals.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    self.meals = meals;
  }

  pub fn add_meal(&mut self, meal: Meal) {
    self.meals.push(meal);
    self.meals.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
  }

  pub fn remove_meal(&mut self, id: i64) {
    self.meals.retain(|m| m.id != id);
  }

  pub fn meals_for(&self, date: NaiveDate) -> Vec<&Meal> {
    self
      .meals
      .iter()
      .filter(|m| m.date.date_naive() == date)
      .collect()
  }
}

/// ---------------------------------------------------------------------------
/// API Operations
/// ---------------------------------------------------------------------------

pub async fn fetch_plans(config: &ApiConfig, token: &str) -> Result<Vec<NutritionPlan>, ApiError> {
  let payload = api::get_json(config, "/api/nutrition", Some(token)).await?;
  api::decode(payload)
}

pub async fn fetch_meals(config: &ApiConfig, token: &str) -> Result<Vec<Meal>, ApiError> {
  let payload = api::get_json(config, "/api/meals", Some(token)).await?;
  api::decode(payload)
}

/// Fetch plans and meals concurrently
pub async fn refresh(
  config: &ApiConfig,
  token: &str,
) -> Result<(Vec<NutritionPlan>, Vec<Meal>), ApiError> {
  let (plans, meals) = tokio::join!(fetch_plans(config, token), fetch_meals(config, token));
  Ok((plans?, meals?))
}

/// Upsert the plan for a date. The backend creates or replaces by date and
/// returns its copy, which becomes the cached record.
pub async fn save_plan(
  config: &ApiConfig,
  token: &str,
  plan: &NewNutritionPlan,
) -> Result<NutritionPlan, ApiError> {
  validate_new_plan(plan)?;

  let body = json!({
    "date": plan.date,
    "goal": plan.goal,
    "total_calories_per_day": plan.total_calories_per_day,
    "protein_g": plan.protein_g,
    "fat_g": plan.fat_g,
    "carb_g": plan.carb_g,
    "note": plan.note,
  });

  let payload = api::post_json(config, "/api/nutrition", Some(token), &body).await?;
  api::decode(payload)
}

pub async fn create_meal(config: &ApiConfig, token: &str, meal: &NewMeal) -> Result<Meal, ApiError> {
  validate_new_meal(meal)?;

  let body = json!({
    "name": meal.name,
    "calories": meal.calories,
    "protein": meal.protein,
    "carbs": meal.carbs,
    "fat": meal.fat,
    "date": meal.date,
  });

  let payload = api::post_json(config, "/api/meals", Some(token), &body).await?;
  api::decode(payload)
}

pub async fn delete_meal(config: &ApiConfig, token: &str, id: i64) -> Result<(), ApiError> {
  api::delete_json(config, &format!("/api/meals/{}", id), Some(token)).await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;

  #[test]
  fn test_latest_is_max_date() {
    let mut store = NutritionStore::default();
    assert!(store.latest().is_none());

    store.set_plans(vec![
      mock_nutrition_plan(1, "2025-06-01"),
      mock_nutrition_plan(2, "2025-06-20"),
      mock_nutrition_plan(3, "2025-06-10"),
    ]);

    assert_eq!(store.latest().unwrap().id, 2);
    assert_eq!(
      store.latest().unwrap().date,
      "2025-06-20".parse::<NaiveDate>().unwrap()
    );
  }

  #[test]
  fn test_duplicate_date_keeps_higher_id() {
    let mut store = NutritionStore::default();
    store.set_plans(vec![
      mock_nutrition_plan(5, "2025-06-01"),
      mock_nutrition_plan(2, "2025-06-01"),
    ]);

    assert_eq!(store.plans.len(), 1);
    assert_eq!(store.plan_for("2025-06-01".parse().unwrap()).unwrap().id, 5);
  }

  #[test]
  fn test_upsert_updates_in_place() {
    let mut store = NutritionStore::default();
    store.set_plans(vec![mock_nutrition_plan(1, "2025-06-01")]);

    let mut saved = mock_nutrition_plan(4, "2025-06-01");
    saved.goal = "Cut".into();
    store.upsert(saved);

    let plan = store.plan_for("2025-06-01".parse().unwrap()).unwrap();
    assert_eq!(plan.id, 4);
    assert_eq!(plan.goal, "Cut");
  }

  #[test]
  fn test_deserialize_resolves_field_spellings() {
    let plan: NutritionPlan = serde_json::from_value(serde_json::json!({
      "ID": 8,
      "date": "2025-06-10",
      "goal": "Bulk",
      "TotalCaloriesPerDay": 2800.0,
      "ProteinG": 160.0,
      "fat_g": 80.0,
      "carbG": 330.0,
      "note": ""
    }))
    .unwrap();

    assert_eq!(plan.id, 8);
    assert_eq!(plan.total_calories_per_day, 2800.0);
    assert_eq!(plan.protein_g, 160.0);
    assert_eq!(plan.fat_g, 80.0);
    assert_eq!(plan.carb_g, 330.0);
  }

  #[test]
  fn test_validate_plan_rejects_missing_goal() {
    let mut plan = mock_new_nutrition_plan();
    assert!(validate_new_plan(&plan).is_ok());

    plan.goal = "".into();
    assert!(validate_new_plan(&plan).is_err());

    let mut plan = mock_new_nutrition_plan();
    plan.total_calories_per_day = 0.0;
    assert!(validate_new_plan(&plan).is_err());

    let mut plan = mock_new_nutrition_plan();
    plan.protein_g = -1.0;
    assert!(validate_new_plan(&plan).is_err());
  }

  #[test]
  fn test_meals_for_filters_by_day() {
    let mut store = NutritionStore::default();
    store.set_meals(vec![
      mock_meal(1, "2025-06-10T08:00:00Z"),
      mock_meal(2, "2025-06-10T19:30:00Z"),
      mock_meal(3, "2025-06-11T08:00:00Z"),
    ]);

    let day = "2025-06-10".parse().unwrap();
    let meals = store.meals_for(day);
    assert_eq!(meals.len(), 2);
    // Newest first within the store
    assert_eq!(meals[0].id, 2);

    store.remove_meal(2);
    assert_eq!(store.meals_for(day).len(), 1);
  }

  #[tokio::test]
  async fn test_save_plan_round_trips_server_copy() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/nutrition")
      .with_status(200)
      .with_body(
        r#"{"data": {"ID": 31, "user_id": 4, "date": "2025-06-10", "goal": "Bulk",
            "total_calories_per_day": 2800.0, "protein_g": 160.0,
            "fat_g": 80.0, "carb_g": 330.0, "note": "more rice"}}"#,
      )
      .create_async()
      .await;

    let config = ApiConfig::new(server.url());
    let saved = save_plan(&config, "token", &mock_new_nutrition_plan())
      .await
      .unwrap();
    assert_eq!(saved.id, 31);

    let mut store = NutritionStore::default();
    store.upsert(saved);
    assert_eq!(store.latest().unwrap().id, 31);
  }
}
