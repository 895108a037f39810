use crate::api::ApiConfig;
use crate::groups::GroupStore;
use crate::health::HealthStore;
use crate::nutrition::NutritionStore;
use crate::packages::PackageStore;
use crate::reviews::ReviewStore;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use tauri::Manager;
use tokio::sync::RwLock;
use tracing::info;

pub type DbPool = SqlitePool;

/// Application state: the session database, the backend endpoint, and the
/// per-domain caches the pages read from. Each store holds the latest known
/// server records and is only written after a successful API call.
pub struct AppState {
  pub db: DbPool,
  pub api: ApiConfig,
  pub health: RwLock<HealthStore>,
  pub nutrition: RwLock<NutritionStore>,
  pub packages: RwLock<PackageStore>,
  pub groups: RwLock<GroupStore>,
  pub reviews: RwLock<ReviewStore>,
}

impl AppState {
  pub fn new(db: DbPool, api: ApiConfig) -> Self {
    Self {
      db,
      api,
      health: RwLock::new(HealthStore::default()),
      nutrition: RwLock::new(NutritionStore::default()),
      packages: RwLock::new(PackageStore::default()),
      groups: RwLock::new(GroupStore::default()),
      reviews: RwLock::new(ReviewStore::default()),
    }
  }

  /// Drop all cached domain state (used on sign-out)
  pub async fn clear_caches(&self) {
    *self.health.write().await = HealthStore::default();
    *self.nutrition.write().await = NutritionStore::default();
    *self.packages.write().await = PackageStore::default();
    *self.groups.write().await = GroupStore::default();
    *self.reviews.write().await = ReviewStore::default();
  }
}

/// Get the path to the database file
fn get_db_path<R: tauri::Runtime>(
  app: &tauri::AppHandle<R>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| format!("Failed to get app data dir: {}", e))?;

  // Create directory if it doesn't exist
  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("gym-companion.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(
  app: &tauri::AppHandle<R>,
) -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  info!("Initializing database at: {}", db_path.display());

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
