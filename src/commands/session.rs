use crate::api::ApiError;
use crate::db::AppState;
use crate::session::{self, Credentials, Session, SignUpPayload};
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Sign-Up / Sign-In
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn sign_up(
  state: State<'_, Arc<AppState>>,
  payload: SignUpPayload,
) -> Result<(), ApiError> {
  session::sign_up(&state.api, &payload).await
}

/// Authenticate and persist the session. The returned session carries the
/// actor's landing page for the post-login redirect.
#[tauri::command]
pub async fn sign_in(
  state: State<'_, Arc<AppState>>,
  credentials: Credentials,
) -> Result<Session, ApiError> {
  session::sign_in(&state.api, &state.db, &credentials).await
}

/// ---------------------------------------------------------------------------
/// Session State
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_session(state: State<'_, Arc<AppState>>) -> Result<Option<Session>, ApiError> {
  session::load_session(&state.db).await
}

/// Sign out: drop the session row and every cached domain store
#[tauri::command]
pub async fn sign_out(state: State<'_, Arc<AppState>>) -> Result<(), ApiError> {
  session::clear_session(&state.db).await?;
  state.clear_caches().await;
  Ok(())
}

/// Remember the route to restore on next launch
#[tauri::command]
pub async fn remember_page(
  state: State<'_, Arc<AppState>>,
  page: String,
) -> Result<(), ApiError> {
  session::set_last_page(&state.db, &page).await
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
  async fn test_get_session_empty() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, "http://localhost:8000"));

    let result = get_session(app.state()).await.unwrap();
    assert!(result.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_sign_out_clears_session() {
    let pool = setup_test_db().await;
    seed_test_session(&pool).await;
    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, "http://localhost:8000"));

    sign_out(app.state()).await.unwrap();
    let result = get_session(app.state()).await.unwrap();
    assert!(result.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_remember_page_round_trips() {
    let pool = setup_test_db().await;
    seed_test_session(&pool).await;
    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, "http://localhost:8000"));

    remember_page(app.state(), "/groups".to_string()).await.unwrap();
    let session = get_session(app.state()).await.unwrap().unwrap();
    assert_eq!(session.page, "/groups");

    teardown_test_db(pool).await;
  }
}
