use crate::api::ApiError;
use crate::db::AppState;
use crate::health::{self, Activity, HealthRecord, NewActivity, NewHealthRecord};
use crate::session;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::info;

/// Everything the health dashboard renders in one payload
#[derive(Serialize)]
pub struct HealthOverview {
  pub current: Option<HealthRecord>,
  pub records: Vec<HealthRecord>,
  pub activities: Vec<Activity>,
}

/// ---------------------------------------------------------------------------
/// Refresh
/// ---------------------------------------------------------------------------

/// Fetch records and activities, rebuild the cache, and return the overview
#[tauri::command]
pub async fn health_refresh(state: State<'_, Arc<AppState>>) -> Result<HealthOverview, ApiError> {
  let session = session::require_session(&state.db).await?;
  let (records, activities) = health::refresh(&state.api, &session.token).await?;

  let mut store = state.health.write().await;
  store.set_records(records);
  store.set_activities(activities);

  info!(
    "Health refresh: {} records, {} activities",
    store.records.len(),
    store.activities.len()
  );

  Ok(HealthOverview {
    current: store.current().cloned(),
    records: store.records.clone(),
    activities: store.activities.clone(),
  })
}

/// The cached most-recent record, without a network round trip
#[tauri::command]
pub async fn health_current(
  state: State<'_, Arc<AppState>>,
) -> Result<Option<HealthRecord>, ApiError> {
  Ok(state.health.read().await.current().cloned())
}

/// ---------------------------------------------------------------------------
/// Mutations
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn health_submit(
  state: State<'_, Arc<AppState>>,
  record: NewHealthRecord,
) -> Result<HealthRecord, ApiError> {
  let session = session::require_session(&state.db).await?;
  let saved = health::submit_record(&state.api, &session.token, &record).await?;

  state.health.write().await.upsert_record(saved.clone());
  Ok(saved)
}

#[tauri::command]
pub async fn activity_add(
  state: State<'_, Arc<AppState>>,
  activity: NewActivity,
) -> Result<Activity, ApiError> {
  let session = session::require_session(&state.db).await?;
  let saved = health::create_activity(&state.api, &session.token, &activity).await?;

  state.health.write().await.add_activity(saved.clone());
  Ok(saved)
}

#[tauri::command]
pub async fn activity_delete(state: State<'_, Arc<AppState>>, id: i64) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  health::delete_activity(&state.api, &session.token, id).await?;

  state.health.write().await.remove_activity(id);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
