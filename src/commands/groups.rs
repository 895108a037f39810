use crate::api::ApiError;
use crate::db::AppState;
use crate::groups::{self, NewGroup, WorkoutGroup};
use crate::session;
use std::sync::Arc;
use tauri::State;
use tracing::info;

/// ---------------------------------------------------------------------------
/// Refresh
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn groups_refresh(
  state: State<'_, Arc<AppState>>,
) -> Result<Vec<WorkoutGroup>, ApiError> {
  let session = session::require_session(&state.db).await?;
  let groups = groups::fetch_groups(&state.api, &session.token).await?;

  let mut store = state.groups.write().await;
  store.set_groups(groups);
  Ok(store.groups.clone())
}

/// ---------------------------------------------------------------------------
/// Mutations
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn group_create(
  state: State<'_, Arc<AppState>>,
  group: NewGroup,
) -> Result<WorkoutGroup, ApiError> {
  let session = session::require_session(&state.db).await?;
  let created = groups::create_group(&state.api, &session.token, &group).await?;

  info!("Created group {} ({})", created.name, created.id);
  state.groups.write().await.upsert_group(created.clone());
  Ok(created)
}

/// Join against the cached group (capacity and duplicate guards), then
/// refetch the list so member rosters and join timestamps are current
#[tauri::command]
pub async fn group_join(
  state: State<'_, Arc<AppState>>,
  group_id: i64,
) -> Result<Vec<WorkoutGroup>, ApiError> {
  let session = session::require_session(&state.db).await?;

  let group = state
    .groups
    .read()
    .await
    .group_by_id(group_id)
    .cloned()
    .ok_or_else(|| ApiError::Validation("Unknown group".into()))?;

  groups::join_group(&state.api, &session.token, session.user_id, &group).await?;

  let refreshed = groups::fetch_groups(&state.api, &session.token).await?;
  let mut store = state.groups.write().await;
  store.set_groups(refreshed);
  Ok(store.groups.clone())
}

#[tauri::command]
pub async fn group_leave(
  state: State<'_, Arc<AppState>>,
  group_id: i64,
) -> Result<Vec<WorkoutGroup>, ApiError> {
  let session = session::require_session(&state.db).await?;

  let group = state
    .groups
    .read()
    .await
    .group_by_id(group_id)
    .cloned()
    .ok_or_else(|| ApiError::Validation("Unknown group".into()))?;

  groups::leave_group(&state.api, &session.token, session.user_id, &group).await?;

  let refreshed = groups::fetch_groups(&state.api, &session.token).await?;
  let mut store = state.groups.write().await;
  store.set_groups(refreshed);
  Ok(store.groups.clone())
}

#[tauri::command]
pub async fn group_delete(state: State<'_, Arc<AppState>>, group_id: i64) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  groups::delete_group(&state.api, &session.token, group_id).await?;

  state.groups.write().await.remove_group(group_id);
  info!("Deleted group {}", group_id);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use serial_test::serial;
  use tauri::Manager;

  #[tokio::test]
  #[serial]
  async fn test_group_join_unknown_group() {
    let pool = setup_test_db().await;
    seed_test_session(&pool).await;
    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, "http://localhost:8000"));

    let result = group_join(app.state(), 999).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_group_join_refetches_roster() {
    let pool = setup_test_db().await;
    seed_test_session(&pool).await;

    let mut server = mockito::Server::new_async().await;
    let joined_roster = r#"[{"id": 5, "name": "Morning Runners", "goal": "",
        "max_members": 10, "status": "active", "creator_id": 9,
        "start_date": "2025-07-01T00:00:00Z",
        "members": [{"id": 4, "name": "Alex Chen",
                     "joined_at": "2025-06-20T08:00:00Z"}]}]"#;

    let join = server
      .mock("POST", "/api/group/5/join")
      .with_status(200)
      .with_body(r#"{"message": "joined"}"#)
      .create_async()
      .await;
    let _refetch = server
      .mock("GET", "/api/groups")
      .with_status(200)
      .with_body(joined_roster)
      .create_async()
      .await;

    let app = tauri::test::mock_app();
    let state = test_state(&pool, &server.url());
    state.groups.write().await.set_groups(vec![mock_group(5, 10)]);
    app.manage(state);

    let groups = group_join(app.state(), 5).await.unwrap();
    assert!(groups[0].has_member(4));
    join.assert_async().await;

    teardown_test_db(pool).await;
  }
}
