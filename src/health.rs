//! Health records and activity tracking
//!
//! The backend serializes embedded model fields as `ID`/`CreatedAt` while
//! tagged fields come back snake_case; serde aliases absorb both spellings.
//! The most-recent-by-date record (tie-broken by id) is the member's
//! "current" health state and the anchor for new activities.

use crate::api::{self, ApiConfig, ApiError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "UserID")]
  pub user_id: i64,
  pub date: NaiveDate,
  #[serde(default)]
  pub weight: f64,
  #[serde(default)]
  pub height: f64,
  #[serde(default)]
  pub fat: f64,
  #[serde(default)]
  pub pressure: String,
  #[serde(default)]
  pub bmi: f64,
  #[serde(default)]
  pub status: String,
}

/// Form input for a new record; BMI and status are derived before send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHealthRecord {
  pub date: NaiveDate,
  pub weight: f64,
  /// Centimeters
  pub height: f64,
  pub fat: f64,
  pub pressure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
  #[serde(alias = "ID")]
  pub id: i64,
  #[serde(default, alias = "UserID")]
  pub user_id: i64,
  #[serde(default, alias = "HealthID")]
  pub health_id: i64,
  #[serde(rename = "type", alias = "Type")]
  pub activity_type: String,
  #[serde(default)]
  pub distance: f64,
  #[serde(default)]
  pub duration: f64,
  #[serde(default)]
  pub calories: f64,
  #[serde(default, alias = "CreatedAt", alias = "date")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Form input for a new activity. Calories are computed server-side from the
/// activity's MET value and the member's current weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
  pub activity_type: String,
  pub distance: f64,
  pub duration: f64,
}

/// ---------------------------------------------------------------------------
/// Derived Values
/// ---------------------------------------------------------------------------

/// BMI from weight in kilograms and height in centimeters, rounded to 2 dp
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
  if weight_kg <= 0.0 || height_cm <= 0.0 {
    return 0.0;
  }
  let height_m = height_cm / 100.0;
  let bmi = weight_kg / (height_m * height_m);
  (bmi * 100.0).round() / 100.0
}

/// WHO classification cutoffs
pub fn bmi_status(bmi: f64) -> &'static str {
  match bmi {
    b if b < 18.5 => "Underweight",
    b if b < 25.0 => "Normal",
    b if b < 30.0 => "Overweight",
    _ => "Obese",
  }
}

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

pub fn validate_new_record(record: &NewHealthRecord) -> Result<(), ApiError> {
  if record.weight <= 0.0 {
    return Err(ApiError::Validation("Weight must be greater than zero".into()));
  }
  if record.height <= 0.0 {
    return Err(ApiError::Validation("Height must be greater than zero".into()));
  }
  if record.fat < 0.0 || record.fat >= 100.0 {
    return Err(ApiError::Validation("Body fat must be a percentage".into()));
  }
  if record.pressure.trim().is_empty() {
    return Err(ApiError::Validation("Blood pressure is required".into()));
  }
  Ok(())
}

pub fn validate_new_activity(activity: &NewActivity) -> Result<(), ApiError> {
  if activity.activity_type.trim().is_empty() {
    return Err(ApiError::Validation("Activity type is required".into()));
  }
  if activity.duration <= 0.0 {
    return Err(ApiError::Validation("Duration must be greater than zero".into()));
  }
  if activity.distance < 0.0 {
    return Err(ApiError::Validation("Distance cannot be negative".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Ordering
/// ---------------------------------------------------------------------------

/// Newest first: date descending, ties broken by numeric id descending
pub fn sort_records(records: &mut [HealthRecord]) {
  records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

fn sort_activities(activities: &mut [Activity]) {
  activities.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// ---------------------------------------------------------------------------
/// In-Memory Store
/// ---------------------------------------------------------------------------

/// Cached health state, updated only after a successful API call
#[derive(Debug, Default, Clone, Serialize)]
pub struct HealthStore {
  pub records: Vec<HealthRecord>,
  pub activities: Vec<Activity>,
}

impl HealthStore {
  pub fn set_records(&mut self, mut records: Vec<HealthRecord>) {
    sort_records(&mut records);
    self.records = records;
  }

  pub fn set_activities(&mut self, mut activities: Vec<Activity>) {
    sort_activities(&mut activities);
    self.activities = activities;
  }

  /// The most recent record is the member's current health state
  pub fn current(&self) -> Option<&HealthRecord> {
    self.records.first()
  }

  pub fn upsert_record(&mut self, record: HealthRecord) {
    self.records.retain(|r| r.id != record.id);
    self.records.push(record);
    sort_records(&mut self.records);
  }

  pub fn add_activity(&mut self, activity: Activity) {
    self.activities.push(activity);
    sort_activities(&mut self.activities);
  }

  pub fn remove_activity(&mut self, id: i64) {
    self.activities.retain(|a| a.id != id);
  }
}

/// ---------------------------------------------------------------------------
/// API Operations
/// ---------------------------------------------------------------------------

pub async fn fetch_records(
  config: &ApiConfig,
  token: &str,
) -> Result<Vec<HealthRecord>, ApiError> {
  let payload = api::get_json(config, "/api/health", Some(token)).await?;
  api::decode(payload)
}

pub async fn fetch_activities(config: &ApiConfig, token: &str) -> Result<Vec<Activity>, ApiError> {
  let payload = api::get_json(config, "/api/activity", Some(token)).await?;
  api::decode(payload)
}

/// Fetch records and activities concurrently; both are independent reads
pub async fn refresh(
  config: &ApiConfig,
  token: &str,
) -> Result<(Vec<HealthRecord>, Vec<Activity>), ApiError> {
  let (records, activities) = tokio::join!(
    fetch_records(config, token),
    fetch_activities(config, token)
  );
  Ok((records?, activities?))
}

/// Validate, derive BMI/status, and create the record. Returns the server's
/// copy so the cache reflects assigned ids.
pub async fn submit_record(
  config: &ApiConfig,
  token: &str,
  record: &NewHealthRecord,
) -> Result<HealthRecord, ApiError> {
  validate_new_record(record)?;

  let bmi = compute_bmi(record.weight, record.height);
  let body = json!({
    "date": record.date,
    "weight": record.weight,
    "height": record.height,
    "fat": record.fat,
    "pressure": record.pressure,
    "bmi": bmi,
    "status": bmi_status(bmi),
  });

  let payload = api::post_json(config, "/api/health", Some(token), &body).await?;
  api::decode(payload)
}

/// Only type/distance/duration cross the wire; the backend attaches the
/// latest health record and computes calories
pub async fn create_activity(
  config: &ApiConfig,
  token: &str,
  activity: &NewActivity,
) -> Result<Activity, ApiError> {
  validate_new_activity(activity)?;

  let body = json!({
    "type": activity.activity_type,
    "distance": activity.distance,
    "duration": activity.duration,
  });

  let payload = api::post_json(config, "/api/activity", Some(token), &body).await?;
  api::decode(payload)
}

pub async fn delete_activity(config: &ApiConfig, token: &str, id: i64) -> Result<(), ApiError> {
  api::delete_json(config, &format!("/api/activity/{}", id), Some(token)).await?;
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
