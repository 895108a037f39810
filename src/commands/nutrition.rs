use crate::api::ApiError;
use crate::db::AppState;
use crate::nutrition::{self, Meal, NewMeal, NewNutritionPlan, NutritionPlan};
use crate::session;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::info;

#[derive(Serialize)]
pub struct NutritionOverview {
  pub latest: Option<NutritionPlan>,
  pub plans: Vec<NutritionPlan>,
  pub meals: Vec<Meal>,
}

/// ---------------------------------------------------------------------------
/// Refresh
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn nutrition_refresh(
  state: State<'_, Arc<AppState>>,
) -> Result<NutritionOverview, ApiError> {
  let session = session::require_session(&state.db).await?;
  let (plans, meals) = nutrition::refresh(&state.api, &session.token).await?;

  let mut store = state.nutrition.write().await;
  store.set_plans(plans);
  store.set_meals(meals);

  info!("Nutrition refresh: {} plans, {} meals", store.plans.len(), store.meals.len());

  Ok(NutritionOverview {
    latest: store.latest().cloned(),
    plans: store.plans.values().cloned().collect(),
    meals: store.meals.clone(),
  })
}

/// The cached plan with the maximum date
#[tauri::command]
pub async fn nutrition_latest(
  state: State<'_, Arc<AppState>>,
) -> Result<Option<NutritionPlan>, ApiError> {
  Ok(state.nutrition.read().await.latest().cloned())
}

#[tauri::command]
pub async fn nutrition_for_date(
  state: State<'_, Arc<AppState>>,
  date: NaiveDate,
) -> Result<Option<NutritionPlan>, ApiError> {
  Ok(state.nutrition.read().await.plan_for(date).cloned())
}

/// ---------------------------------------------------------------------------
/// Mutations
/// ---------------------------------------------------------------------------

/// Upsert the plan for a date; the mapping is updated from the server's copy
#[tauri::command]
pub async fn nutrition_save(
  state: State<'_, Arc<AppState>>,
  plan: NewNutritionPlan,
) -> Result<NutritionPlan, ApiError> {
  let session = session::require_session(&state.db).await?;
  let saved = nutrition::save_plan(&state.api, &session.token, &plan).await?;

  state.nutrition.write().await.upsert(saved.clone());
  Ok(saved)
}

#[tauri::command]
pub async fn meal_add(state: State<'_, Arc<AppState>>, meal: NewMeal) -> Result<Meal, ApiError> {
  let session = session::require_session(&state.db).await?;
  let saved = nutrition::create_meal(&state.api, &session.token, &meal).await?;

  state.nutrition.write().await.add_meal(saved.clone());
  Ok(saved)
}

#[tauri::command]
pub async fn meal_delete(state: State<'_, Arc<AppState>>, id: i64) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  nutrition::delete_meal(&state.api, &session.token, id).await?;

  state.nutrition.write().await.remove_meal(id);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
