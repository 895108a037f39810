mod api;
mod commands;
mod db;
mod groups;
mod health;
mod nutrition;
mod packages;
mod reviews;
mod session;
mod trainers;

#[cfg(test)]
mod test_utils;

use api::ApiConfig;
use db::AppState;
use std::sync::Arc;
use tauri::Manager;
use tracing::{error, info};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .init();

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .setup(|app| {
      // Initialize database and managed state
      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        match db::initialize_db(&app_handle).await {
          Ok(pool) => {
            let state = Arc::new(AppState::new(pool, ApiConfig::from_env()));
            app_handle.manage(state);
            info!("Database ready");
          }
          Err(e) => {
            error!("Failed to initialize database: {}", e);
          }
        }
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      // Session commands
      commands::session::sign_up,
      commands::session::sign_in,
      commands::session::sign_out,
      commands::session::get_session,
      commands::session::remember_page,
      // Health commands
      commands::health::health_refresh,
      commands::health::health_current,
      commands::health::health_submit,
      commands::health::activity_add,
      commands::health::activity_delete,
      // Nutrition commands
      commands::nutrition::nutrition_refresh,
      commands::nutrition::nutrition_latest,
      commands::nutrition::nutrition_for_date,
      commands::nutrition::nutrition_save,
      commands::nutrition::meal_add,
      commands::nutrition::meal_delete,
      // Package commands
      commands::packages::packages_refresh,
      commands::packages::membership_status,
      commands::packages::package_signup,
      commands::packages::package_cancel,
      commands::packages::package_change,
      // Group commands
      commands::groups::groups_refresh,
      commands::groups::group_create,
      commands::groups::group_join,
      commands::groups::group_leave,
      commands::groups::group_delete,
      // Review commands
      commands::reviews::reviews_refresh,
      commands::reviews::review_summary,
      commands::reviews::review_submit,
      // Trainer commands
      commands::trainers::trainers_list,
      commands::trainers::trainer_get,
      commands::trainers::trainer_create,
      commands::trainers::trainer_update,
      commands::trainers::trainer_delete,
      commands::trainers::trainer_schedules,
      commands::trainers::booking_create,
      commands::trainers::bookings_list,
      commands::trainers::booking_cancel,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
