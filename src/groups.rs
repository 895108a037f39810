//! Workout groups
//!
//! Groups carry their member lists (with join timestamps) in the list
//! response. Capacity and duplicate-membership checks run client-side before
//! the join call; the backend enforces them again and its answer wins.

use crate::api::{self, ApiConfig, ApiError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutGroup {
  #[serde(alias = "ID")]
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub goal: String,
  #[serde(default, alias = "MaxMembers")]
  pub max_members: i64,
  #[serde(default)]
  pub status: String,
  #[serde(default, alias = "StartDate")]
  pub start_date: Option<DateTime<Utc>>,
  #[serde(default, alias = "CreatorID")]
  pub creator_id: i64,
  #[serde(default, alias = "Members")]
  pub members: Vec<GroupMember>,
}

impl WorkoutGroup {
  /// max_members of zero means uncapped
  pub fn is_full(&self) -> bool {
    self.max_members > 0 && self.members.len() as i64 >= self.max_members
  }

  pub fn has_member(&self, user_id: i64) -> bool {
    self.members.iter().any(|m| m.id == user_id)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
  pub name: String,
  pub goal: String,
  pub max_members: i64,
  pub status: String,
  pub start_date: NaiveDate,
}

pub fn validate_new_group(group: &NewGroup) -> Result<(), ApiError> {
  if group.name.trim().is_empty() {
    return Err(ApiError::Validation("Group name is required".into()));
  }
  if group.max_members <= 0 {
    return Err(ApiError::Validation("Member limit must be greater than zero".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize)]
pub struct GroupStore {
  pub groups: Vec<WorkoutGroup>,
}

impl GroupStore {
  pub fn set_groups(&mut self, groups: Vec<WorkoutGroup>) {
    self.groups = groups;
  }

  pub fn group_by_id(&self, id: i64) -> Option<&WorkoutGroup> {
    self.groups.iter().find(|g| g.id == id)
  }

  pub fn upsert_group(&mut self, group: WorkoutGroup) {
    self.groups.retain(|g| g.id != group.id);
    self.groups.push(group);
  }

  pub fn remove_group(&mut self, id: i64) {
    self.groups.retain(|g| g.id != id);
  }
}

/// ---------------------------------------------------------------------------
/// API Operations
/// ---------------------------------------------------------------------------

pub async fn fetch_groups(config: &ApiConfig, token: &str) -> Result<Vec<WorkoutGroup>, ApiError> {
  let payload = api::get_json(config, "/api/groups", Some(token)).await?;
  api::decode(payload)
}

/// The create contract is camelCase with a plain `YYYY-MM-DD` start date
pub async fn create_group(
  config: &ApiConfig,
  token: &str,
  group: &NewGroup,
) -> Result<WorkoutGroup, ApiError> {
  validate_new_group(group)?;

  let body = json!({
    "name": group.name,
    "goal": group.goal,
    "maxMembers": group.max_members,
    "status": group.status,
    "startDate": group.start_date.format("%Y-%m-%d").to_string(),
  });

  let payload = api::post_json(config, "/api/groups", Some(token), &body).await?;
  api::decode(payload)
}

/// Join after the local capacity and duplicate guards pass
pub async fn join_group(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
  group: &WorkoutGroup,
) -> Result<(), ApiError> {
  if group.is_full() {
    return Err(ApiError::Validation("Group is already full".into()));
  }
  if group.has_member(user_id) {
    return Err(ApiError::Validation("Already a member of this group".into()));
  }

  let path = format!("/api/group/{}/join", group.id);
  api::post_json(config, &path, Some(token), &json!({})).await?;
  Ok(())
}

pub async fn leave_group(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
  group: &WorkoutGroup,
) -> Result<(), ApiError> {
  if !group.has_member(user_id) {
    return Err(ApiError::Validation("Not a member of this group".into()));
  }

  let path = format!("/api/group/{}/leave", group.id);
  api::delete_json(config, &path, Some(token)).await?;
  Ok(())
}

pub async fn delete_group(config: &ApiConfig, token: &str, id: i64) -> Result<(), ApiError> {
  api::delete_json(config, &format!("/api/group/{}", id), Some(token)).await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
