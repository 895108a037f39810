//! Package catalog and membership operations
//!
//! Membership writes are the one place the backend reports constraint
//! violations as HTTP 200 with an error body, so every 200 from a mutation
//! is re-checked with `api::backend_failure` before the cache is touched.
//! Instead of the old full-page reload, mutations refetch the membership
//! and reconcile the store in memory.

use crate::api::{self, ApiConfig, ApiError};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "Service")]
  pub service: String,
  #[serde(default, alias = "Detail")]
  pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
  #[serde(alias = "ID")]
  pub id: i64,
  /// The backend names this `p_name`
  #[serde(rename = "p_name", alias = "PackageName", alias = "name")]
  pub name: String,
  #[serde(rename = "type", alias = "Type", default)]
  pub package_type: String,
  #[serde(default)]
  pub detail: String,
  #[serde(default)]
  pub price: i64,
  #[serde(default)]
  pub service: Option<Service>,
  #[serde(default)]
  pub detail_service: Option<Service>,
}

/// Join row between a user and their package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMembership {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "UserID")]
  pub user_id: i64,
  #[serde(default, alias = "PackageID")]
  pub package_id: i64,
  #[serde(default)]
  pub package: Option<Package>,
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct PackageStore {
  pub packages: Vec<Package>,
  pub services: Vec<Service>,
  pub membership: Option<PackageMembership>,
}

impl PackageStore {
  pub fn has_membership(&self) -> bool {
    self.membership.is_some()
  }

  pub fn package_by_id(&self, id: i64) -> Option<&Package> {
    self.packages.iter().find(|p| p.id == id)
  }
}

/// ---------------------------------------------------------------------------
/// API Operations
/// ---------------------------------------------------------------------------

pub async fn fetch_packages(config: &ApiConfig, token: &str) -> Result<Vec<Package>, ApiError> {
  let payload = api::get_json(config, "/api/packages", Some(token)).await?;
  api::decode(payload)
}

pub async fn fetch_services(config: &ApiConfig, token: &str) -> Result<Vec<Service>, ApiError> {
  let payload = api::get_json(config, "/api/services", Some(token)).await?;
  api::decode(payload)
}

/// The membership endpoint returns a list; a member has at most one row
pub async fn fetch_membership(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
) -> Result<Option<PackageMembership>, ApiError> {
  let path = format!("/api/package-members/user/{}", user_id);
  let payload = api::get_json(config, &path, Some(token)).await?;
  let memberships: Vec<PackageMembership> = api::decode(payload)?;
  Ok(memberships.into_iter().next())
}

/// Catalog, services, and the user's membership are independent reads
pub async fn refresh(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
) -> Result<(Vec<Package>, Vec<Service>, Option<PackageMembership>), ApiError> {
  let (packages, services, membership) = tokio::join!(
    fetch_packages(config, token),
    fetch_services(config, token),
    fetch_membership(config, token, user_id)
  );
  Ok((packages?, services?, membership?))
}

/// ---------------------------------------------------------------------------
/// Membership Mutations
/// ---------------------------------------------------------------------------

pub async fn sign_up(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
  package_id: i64,
) -> Result<(), ApiError> {
  if package_id <= 0 {
    return Err(ApiError::Validation("Select a package first".into()));
  }

  let body = json!({
    "user_id": user_id,
    "package_id": package_id,
  });

  let payload = api::post_json(config, "/api/package-members", Some(token), &body).await?;
  if let Some(message) = api::backend_failure(&payload) {
    return Err(ApiError::Backend(message));
  }

  Ok(())
}

pub async fn cancel(config: &ApiConfig, token: &str, user_id: i64) -> Result<(), ApiError> {
  let path = format!("/api/package-members/user/{}", user_id);
  api::delete_json(config, &path, Some(token)).await?;
  Ok(())
}

pub async fn change(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
  package_id: i64,
) -> Result<(), ApiError> {
  if package_id <= 0 {
    return Err(ApiError::Validation("Select a package first".into()));
  }

  let body = json!({
    "package_id": package_id,
  });

  let path = format!("/api/package-members/user/{}", user_id);
  let payload = api::put_json(config, &path, Some(token), &body).await?;
  if let Some(message) = api::backend_failure(&payload) {
    return Err(ApiError::Backend(message));
  }

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
