use crate::api::ApiError;
use crate::db::AppState;
use crate::session;
use crate::trainers::{self, NewTrainer, TrainBooking, Trainer, TrainerSchedule};
use std::sync::Arc;
use tauri::State;
use tracing::info;

/// ---------------------------------------------------------------------------
/// Directory
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn trainers_list(state: State<'_, Arc<AppState>>) -> Result<Vec<Trainer>, ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::fetch_trainers(&state.api, &session.token).await
}

#[tauri::command]
pub async fn trainer_get(state: State<'_, Arc<AppState>>, id: i64) -> Result<Trainer, ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::fetch_trainer(&state.api, &session.token, id).await
}

/// ---------------------------------------------------------------------------
/// Admin CRUD
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn trainer_create(
  state: State<'_, Arc<AppState>>,
  trainer: NewTrainer,
) -> Result<Trainer, ApiError> {
  let session = session::require_session(&state.db).await?;
  let created = trainers::create_trainer(&state.api, &session.token, &trainer).await?;
  info!("Trainer {} created", created.full_name());
  Ok(created)
}

#[tauri::command]
pub async fn trainer_update(
  state: State<'_, Arc<AppState>>,
  id: i64,
  trainer: NewTrainer,
) -> Result<Trainer, ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::update_trainer(&state.api, &session.token, id, &trainer).await
}

#[tauri::command]
pub async fn trainer_delete(state: State<'_, Arc<AppState>>, id: i64) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::delete_trainer(&state.api, &session.token, id).await?;
  info!("Trainer {} deleted", id);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Schedules and Bookings
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn trainer_schedules(
  state: State<'_, Arc<AppState>>,
  trainer_id: i64,
) -> Result<Vec<TrainerSchedule>, ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::fetch_schedules(&state.api, &session.token, trainer_id).await
}

/// Book a slot. The schedule list is refetched first so the availability
/// guard runs against fresh data rather than a stale page.
#[tauri::command]
pub async fn booking_create(
  state: State<'_, Arc<AppState>>,
  trainer_id: i64,
  schedule_id: i64,
) -> Result<TrainBooking, ApiError> {
  let session = session::require_session(&state.db).await?;

  let schedules = trainers::fetch_schedules(&state.api, &session.token, trainer_id).await?;
  let schedule = schedules
    .iter()
    .find(|s| s.id == schedule_id)
    .ok_or_else(|| ApiError::Validation("Unknown schedule".into()))?;

  let booking =
    trainers::create_booking(&state.api, &session.token, session.user_id, schedule).await?;
  info!("Booked schedule {} with trainer {}", schedule_id, trainer_id);
  Ok(booking)
}

#[tauri::command]
pub async fn bookings_list(
  state: State<'_, Arc<AppState>>,
) -> Result<Vec<TrainBooking>, ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::fetch_user_bookings(&state.api, &session.token, session.user_id).await
}

#[tauri::command]
pub async fn booking_cancel(state: State<'_, Arc<AppState>>, id: i64) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  trainers::cancel_booking(&state.api, &session.token, id).await?;
  info!("Booking {} cancelled", id);
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
  async fn test_trainers_list_requires_session() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, "http://localhost:8000"));

    let result = trainers_list(app.state()).await;
    assert!(matches!(result, Err(ApiError::NotAuthenticated)));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_booking_create_rejects_taken_slot() {
    let pool = setup_test_db().await;
    seed_test_session(&pool).await;

    let mut server = mockito::Server::new_async().await;
    let _schedules = server
      .mock("GET", "/api/trainer-schedules/allschedules/7")
      .with_status(200)
      .with_body(
        r#"[{"ID": 5, "TrainerID": 7,
             "available_date": "2025-06-10T00:00:00Z",
             "start_time": "2025-06-10T09:00:00Z",
             "end_time": "2025-06-10T10:00:00Z",
             "status": "Booked"}]"#,
      )
      .create_async()
      .await;
    let booking = server
      .mock("POST", "/api/train-bookings")
      .expect(0)
      .create_async()
      .await;

    let app = tauri::test::mock_app();
    app.manage(test_state(&pool, &server.url()));

    let result = booking_create(app.state(), 7, 5).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
    booking.assert_async().await;

    teardown_test_db(pool).await;
  }
}
