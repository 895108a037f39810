//! Shared plumbing for the gym backend REST API
//!
//! Every domain module goes through these helpers: bearer-token headers,
//! status-to-error mapping, and normalization of the backend's two response
//! envelopes (bare payloads vs `{"data": ...}` wrappers). The backend also
//! reports some failures as HTTP 200 with an error-shaped body; that
//! classification lives here, in one place.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::env;
use tracing::{info, warn};
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

impl ApiConfig {
  /// Read the backend base URL from the environment; anything that does not
  /// parse as a URL falls back to the default rather than poisoning every
  /// request
  pub fn from_env() -> Self {
    let base_url = match env::var("GYM_API_BASE_URL") {
      Ok(value) if Url::parse(&value).is_ok() => value,
      Ok(value) => {
        warn!("Invalid GYM_API_BASE_URL '{}', using default: {}", value, DEFAULT_BASE_URL);
        DEFAULT_BASE_URL.to_string()
      }
      Err(_) => {
        info!("GYM_API_BASE_URL not set, using default: {}", DEFAULT_BASE_URL);
        DEFAULT_BASE_URL.to_string()
      }
    };
    Self { base_url }
  }

  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
    }
  }

  /// Join a path onto the base URL
  pub fn endpoint(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Backend rejected request ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("Backend reported failure: {0}")]
  Backend(String),

  #[error("Invalid input: {0}")]
  Validation(String),

  #[error("Not signed in")]
  NotAuthenticated,

  #[error("Database error: {0}")]
  Database(String),

  #[error("Unexpected response shape: {0}")]
  Decode(String),
}

impl Serialize for ApiError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Request Helpers
/// ---------------------------------------------------------------------------

/// Issue a request and return the parsed JSON body.
///
/// 401 maps to `NotAuthenticated`; any other non-success status maps to
/// `Api` with the backend's `error`/`message` text when the body carries one.
pub async fn send_json(
  config: &ApiConfig,
  method: Method,
  path: &str,
  token: Option<&str>,
  body: Option<&Value>,
) -> Result<Value, ApiError> {
  let client = Client::new();

  let mut request = client.request(method, config.endpoint(path));

  if let Some(token) = token {
    request = request.header("Authorization", format!("Bearer {}", token));
  }
  if let Some(body) = body {
    request = request.json(body);
  }

  let response = request.send().await?;
  let status = response.status();

  if status == StatusCode::UNAUTHORIZED {
    return Err(ApiError::NotAuthenticated);
  }

  let text = response.text().await?;
  let payload: Value = if text.trim().is_empty() {
    Value::Null
  } else {
    serde_json::from_str(&text).unwrap_or(Value::Null)
  };

  if !status.is_success() {
    let message = error_message(&payload)
      .unwrap_or_else(|| text.chars().take(200).collect());
    return Err(ApiError::Api {
      status: status.as_u16(),
      message,
    });
  }

  Ok(payload)
}

pub async fn get_json(
  config: &ApiConfig,
  path: &str,
  token: Option<&str>,
) -> Result<Value, ApiError> {
  send_json(config, Method::GET, path, token, None).await
}

pub async fn post_json(
  config: &ApiConfig,
  path: &str,
  token: Option<&str>,
  body: &Value,
) -> Result<Value, ApiError> {
  send_json(config, Method::POST, path, token, Some(body)).await
}

pub async fn put_json(
  config: &ApiConfig,
  path: &str,
  token: Option<&str>,
  body: &Value,
) -> Result<Value, ApiError> {
  send_json(config, Method::PUT, path, token, Some(body)).await
}

pub async fn delete_json(
  config: &ApiConfig,
  path: &str,
  token: Option<&str>,
) -> Result<Value, ApiError> {
  send_json(config, Method::DELETE, path, token, None).await
}

/// ---------------------------------------------------------------------------
/// Response Normalization
/// ---------------------------------------------------------------------------

/// Some endpoints wrap their payload as `{"data": ...}`, others return it
/// bare. Normalize to the inner value.
pub fn unwrap_data(value: Value) -> Value {
  match value {
    Value::Object(mut map) if map.contains_key("data") => {
      map.remove("data").unwrap_or(Value::Null)
    }
    other => other,
  }
}

/// Deserialize the (unwrapped) payload into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(unwrap_data(value)).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pull the human-readable error text out of an error-shaped body.
pub fn error_message(payload: &Value) -> Option<String> {
  for key in ["error", "message"] {
    if let Some(text) = payload.get(key).and_then(Value::as_str) {
      if !text.is_empty() {
        return Some(text.to_string());
      }
    }
  }
  None
}

/// ---------------------------------------------------------------------------
/// 200-With-Error Classification
/// ---------------------------------------------------------------------------

/// The backend returns HTTP 200 with an error-shaped body for constraint
/// violations (duplicate membership, unique index hits). A 200 counts as a
/// failure iff its `error`/`message` text contains one of these markers.
const FAILURE_MARKERS: [&str; 4] = ["duplicate", "unique", "user_id", "package_id"];

pub fn backend_failure(payload: &Value) -> Option<String> {
  let text = error_message(payload)?;
  if FAILURE_MARKERS.iter().any(|marker| text.contains(marker)) {
    Some(text)
  } else {
    None
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
