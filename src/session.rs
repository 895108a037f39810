//! Session and authentication
//!
//! The web client kept its signed-in state in localStorage (`token`,
//! `token_type`, `id`, `actor`, `isLogin`, `page`). Here that state is a
//! single upserted row in SQLite, loaded by every command that needs the
//! bearer token.

use crate::api::{self, ApiConfig, ApiError};
use crate::db::DbPool;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// ---------------------------------------------------------------------------
/// Actors
/// ---------------------------------------------------------------------------

pub const ACTOR_CUSTOMER: &str = "customer";
pub const ACTOR_TRAINER: &str = "trainer";
pub const ACTOR_ADMIN: &str = "admin";

/// Post-login landing route for an actor
pub fn landing_page(actor: &str) -> &'static str {
  match actor {
    ACTOR_TRAINER => "/trainer",
    ACTOR_ADMIN => "/admin",
    // Customers and anything unrecognized land on the member home
    _ => "/",
  }
}

/// ---------------------------------------------------------------------------
/// Session State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
  pub user_id: i64,
  pub actor: String,
  pub token: String,
  pub token_type: String,
  pub is_login: bool,
  pub page: String,
}

/// ---------------------------------------------------------------------------
/// Form Payloads
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpPayload {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password: String,
  pub age: u8,
  pub birthday: String,
  pub gender_id: i64,
}

pub fn validate_credentials(creds: &Credentials) -> Result<(), ApiError> {
  if creds.email.trim().is_empty() || !creds.email.contains('@') {
    return Err(ApiError::Validation("A valid email is required".into()));
  }
  if creds.password.is_empty() {
    return Err(ApiError::Validation("Password is required".into()));
  }
  Ok(())
}

pub fn validate_sign_up(payload: &SignUpPayload) -> Result<(), ApiError> {
  if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
    return Err(ApiError::Validation("First and last name are required".into()));
  }
  if payload.email.trim().is_empty() || !payload.email.contains('@') {
    return Err(ApiError::Validation("A valid email is required".into()));
  }
  if payload.password.len() < 6 {
    return Err(ApiError::Validation("Password must be at least 6 characters".into()));
  }
  if payload.birthday.trim().is_empty() {
    return Err(ApiError::Validation("Birthday is required".into()));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Sign-In / Sign-Up
/// ---------------------------------------------------------------------------

/// Wire shape of the backend's sign-in response. The `error` field is always
/// present; non-empty means failure even under HTTP 200.
#[derive(Debug, Deserialize)]
struct SignInResponse {
  #[serde(default)]
  token_type: String,
  #[serde(default)]
  token: String,
  #[serde(default)]
  id: i64,
  #[serde(default)]
  actor: String,
  #[serde(default)]
  error: String,
}

pub async fn sign_in(
  config: &ApiConfig,
  db: &DbPool,
  creds: &Credentials,
) -> Result<Session, ApiError> {
  validate_credentials(creds)?;

  let body = json!({
    "email": creds.email,
    "password": creds.password,
  });

  let payload = api::post_json(config, "/signin", None, &body).await?;
  let resp: SignInResponse =
    serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;

  if !resp.error.is_empty() {
    return Err(ApiError::Backend(resp.error));
  }
  if resp.token.is_empty() {
    return Err(ApiError::Decode("sign-in response carried no token".into()));
  }

  let token_type = if resp.token_type.is_empty() {
    "Bearer".to_string()
  } else {
    resp.token_type
  };

  let page = landing_page(&resp.actor).to_string();
  let session = Session {
    user_id: resp.id,
    actor: resp.actor,
    token: resp.token,
    token_type,
    is_login: true,
    page,
  };

  save_session(db, &session).await?;
  info!("Signed in as {} (user {})", session.actor, session.user_id);

  Ok(session)
}

pub async fn sign_up(config: &ApiConfig, payload: &SignUpPayload) -> Result<(), ApiError> {
  validate_sign_up(payload)?;

  let body = json!({
    "first_name": payload.first_name,
    "last_name": payload.last_name,
    "email": payload.email,
    "password": payload.password,
    "age": payload.age,
    "birthday": payload.birthday,
    "gender_id": payload.gender_id,
  });

  api::post_json(config, "/signup", None, &body).await?;
  info!("Account created for {}", payload.email);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Database Helpers
/// ---------------------------------------------------------------------------

pub async fn save_session(db: &DbPool, session: &Session) -> Result<(), ApiError> {
  sqlx::query(
    r#"
        INSERT INTO session (id, user_id, actor, token, token_type, is_login, page)
        VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            actor = excluded.actor,
            token = excluded.token,
            token_type = excluded.token_type,
            is_login = excluded.is_login,
            page = excluded.page
        "#,
  )
  .bind(session.user_id)
  .bind(&session.actor)
  .bind(&session.token)
  .bind(&session.token_type)
  .bind(session.is_login)
  .bind(&session.page)
  .execute(db)
  .await
  .map_err(|e| ApiError::Database(e.to_string()))?;

  Ok(())
}

pub async fn load_session(db: &DbPool) -> Result<Option<Session>, ApiError> {
  sqlx::query_as::<_, Session>(
    "SELECT user_id, actor, token, token_type, is_login, page
         FROM session WHERE id = 1 AND is_login = 1",
  )
  .fetch_optional(db)
  .await
  .map_err(|e| ApiError::Database(e.to_string()))
}

/// Load the session or fail with `NotAuthenticated`
pub async fn require_session(db: &DbPool) -> Result<Session, ApiError> {
  load_session(db).await?.ok_or(ApiError::NotAuthenticated)
}

/// Sign out: drop the persisted session entirely
pub async fn clear_session(db: &DbPool) -> Result<(), ApiError> {
  sqlx::query("DELETE FROM session WHERE id = 1")
    .execute(db)
    .await
    .map_err(|e| ApiError::Database(e.to_string()))?;

  info!("Session cleared");
  Ok(())
}

/// Remember the last visited route (the old localStorage `page` key)
pub async fn set_last_page(db: &DbPool, page: &str) -> Result<(), ApiError> {
  sqlx::query("UPDATE session SET page = ?1 WHERE id = 1")
    .bind(page)
    .execute(db)
    .await
    .map_err(|e| ApiError::Database(e.to_string()))?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
