use crate::api::ApiError;
use crate::db::AppState;
use crate::packages::{self, Package, PackageMembership, Service};
use crate::session;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::info;

#[derive(Serialize)]
pub struct PackageOverview {
  pub packages: Vec<Package>,
  pub services: Vec<Service>,
  pub membership: Option<PackageMembership>,
}

/// ---------------------------------------------------------------------------
/// Refresh
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn packages_refresh(
  state: State<'_, Arc<AppState>>,
) -> Result<PackageOverview, ApiError> {
  let session = session::require_session(&state.db).await?;
  let (catalog, services, membership) =
    packages::refresh(&state.api, &session.token, session.user_id).await?;

  let mut store = state.packages.write().await;
  store.packages = catalog;
  store.services = services;
  store.membership = membership;

  Ok(PackageOverview {
    packages: store.packages.clone(),
    services: store.services.clone(),
    membership: store.membership.clone(),
  })
}

#[tauri::command]
pub async fn membership_status(
  state: State<'_, Arc<AppState>>,
) -> Result<Option<PackageMembership>, ApiError> {
  Ok(state.packages.read().await.membership.clone())
}

/// ---------------------------------------------------------------------------
/// Membership Mutations
/// ---------------------------------------------------------------------------

/// After each successful mutation the membership is refetched and the cache
/// reconciled; the backend row (with its assigned id) is authoritative.
async fn reconcile_membership(
  state: &State<'_, Arc<AppState>>,
  token: &str,
  user_id: i64,
) -> Result<Option<PackageMembership>, ApiError> {
  let membership = packages::fetch_membership(&state.api, token, user_id).await?;
  state.packages.write().await.membership = membership.clone();
  Ok(membership)
}

#[tauri::command]
pub async fn package_signup(
  state: State<'_, Arc<AppState>>,
  package_id: i64,
) -> Result<Option<PackageMembership>, ApiError> {
  let session = session::require_session(&state.db).await?;
  packages::sign_up(&state.api, &session.token, session.user_id, package_id).await?;

  info!("Package signup accepted for package {}", package_id);
  reconcile_membership(&state, &session.token, session.user_id).await
}

#[tauri::command]
pub async fn package_cancel(state: State<'_, Arc<AppState>>) -> Result<(), ApiError> {
  let session = session::require_session(&state.db).await?;
  packages::cancel(&state.api, &session.token, session.user_id).await?;

  state.packages.write().await.membership = None;
  info!("Package membership cancelled");
  Ok(())
}

#[tauri::command]
pub async fn package_change(
  state: State<'_, Arc<AppState>>,
  package_id: i64,
) -> Result<Option<PackageMembership>, ApiError> {
  let session = session::require_session(&state.db).await?;
  packages::change(&state.api, &session.token, session.user_id, package_id).await?;

  info!("Package changed to {}", package_id);
  reconcile_membership(&state, &session.token, session.user_id).await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
