//! Trainer directory, schedules, and personal-training bookings

use crate::api::{self, ApiConfig, ApiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SCHEDULE_AVAILABLE: &str = "Available";
pub const BOOKING_STATUS_BOOKED: &str = "Booked";

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "FirstName")]
  pub first_name: String,
  #[serde(default, alias = "LastName")]
  pub last_name: String,
  #[serde(default, alias = "Email")]
  pub email: String,
  #[serde(default, alias = "Skill")]
  pub skill: String,
  #[serde(default, alias = "Tel")]
  pub tel: String,
  #[serde(default, alias = "GenderID")]
  pub gender_id: i64,
  #[serde(default, alias = "ProfileImage")]
  pub profile_image: String,
  #[serde(default, alias = "Schedules")]
  pub schedules: Vec<TrainerSchedule>,
}

impl Trainer {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_string()
  }
}

/// The schedule entity tags its foreign key `TrainerID` while everything
/// else is snake_case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSchedule {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, rename = "TrainerID", alias = "trainer_id")]
  pub trainer_id: i64,
  pub available_date: DateTime<Utc>,
  pub start_time: DateTime<Utc>,
  pub end_time: DateTime<Utc>,
  #[serde(default)]
  pub status: String,
}

impl TrainerSchedule {
  pub fn is_available(&self) -> bool {
    self.status == SCHEDULE_AVAILABLE
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainBooking {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "UsersID")]
  pub user_id: i64,
  #[serde(default, alias = "ScheduleID")]
  pub schedule_id: i64,
  #[serde(default)]
  pub booking_status: String,
  #[serde(default)]
  pub booking_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub schedule: Option<TrainerSchedule>,
}

/// Admin form input for trainer create/update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrainer {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password: String,
  pub skill: String,
  pub tel: String,
  pub gender_id: i64,
  pub profile_image: String,
}

pub fn validate_new_trainer(trainer: &NewTrainer) -> Result<(), ApiError> {
  if trainer.first_name.trim().is_empty() || trainer.last_name.trim().is_empty() {
    return Err(ApiError::Validation("First and last name are required".into()));
  }
  if trainer.email.trim().is_empty() || !trainer.email.contains('@') {
    return Err(ApiError::Validation("A valid email is required".into()));
  }
  if trainer.skill.trim().is_empty() {
    return Err(ApiError::Validation("Skill is required".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Trainer CRUD
/// ---------------------------------------------------------------------------

pub async fn fetch_trainers(config: &ApiConfig, token: &str) -> Result<Vec<Trainer>, ApiError> {
  let payload = api::get_json(config, "/api/trainers", Some(token)).await?;
  api::decode(payload)
}

pub async fn fetch_trainer(config: &ApiConfig, token: &str, id: i64) -> Result<Trainer, ApiError> {
  let payload = api::get_json(config, &format!("/api/trainers/{}", id), Some(token)).await?;
  api::decode(payload)
}

pub async fn create_trainer(
  config: &ApiConfig,
  token: &str,
  trainer: &NewTrainer,
) -> Result<Trainer, ApiError> {
  validate_new_trainer(trainer)?;

  let body = trainer_body(trainer);
  let payload = api::post_json(config, "/api/trainers", Some(token), &body).await?;
  api::decode(payload)
}

pub async fn update_trainer(
  config: &ApiConfig,
  token: &str,
  id: i64,
  trainer: &NewTrainer,
) -> Result<Trainer, ApiError> {
  validate_new_trainer(trainer)?;

  let body = trainer_body(trainer);
  let payload = api::put_json(config, &format!("/api/trainers/{}", id), Some(token), &body).await?;
  api::decode(payload)
}

pub async fn delete_trainer(config: &ApiConfig, token: &str, id: i64) -> Result<(), ApiError> {
  api::delete_json(config, &format!("/api/trainers/{}", id), Some(token)).await?;
  Ok(())
}

fn trainer_body(trainer: &NewTrainer) -> serde_json::Value {
  json!({
    "first_name": trainer.first_name,
    "last_name": trainer.last_name,
    "email": trainer.email,
    "password": trainer.password,
    "skill": trainer.skill,
    "tel": trainer.tel,
    "gender_id": trainer.gender_id,
    "profile_image": trainer.profile_image,
  })
}

/// ---------------------------------------------------------------------------
/// Schedules and Bookings
/// ---------------------------------------------------------------------------

pub async fn fetch_schedules(
  config: &ApiConfig,
  token: &str,
  trainer_id: i64,
) -> Result<Vec<TrainerSchedule>, ApiError> {
  let path = format!("/api/trainer-schedules/allschedules/{}", trainer_id);
  let payload = api::get_json(config, &path, Some(token)).await?;
  api::decode(payload)
}

/// Book a slot; the schedule must still be marked available
pub async fn create_booking(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
  schedule: &TrainerSchedule,
) -> Result<TrainBooking, ApiError> {
  if !schedule.is_available() {
    return Err(ApiError::Validation("This time slot is no longer available".into()));
  }

  let body = json!({
    "user_id": user_id,
    "schedule_id": schedule.id,
    "booking_status": BOOKING_STATUS_BOOKED,
  });

  let payload = api::post_json(config, "/api/train-bookings", Some(token), &body).await?;
  api::decode(payload)
}

pub async fn fetch_user_bookings(
  config: &ApiConfig,
  token: &str,
  user_id: i64,
) -> Result<Vec<TrainBooking>, ApiError> {
  let path = format!("/api/train-bookings/user/{}", user_id);
  let payload = api::get_json(config, &path, Some(token)).await?;
  api::decode(payload)
}

pub async fn cancel_booking(config: &ApiConfig, token: &str, id: i64) -> Result<(), ApiError> {
  api::delete_json(config, &format!("/api/train-bookings/{}", id), Some(token)).await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
