//! Registration, login, and logout.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::validation;
use database::{user, NewUser, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub handle: Option<String>,
}

/// Create an account. The handle is generated from the display name.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let pool = state.db.pool();

    let email = req.email.trim().to_lowercase();
    let display_name = req.display_name.trim().to_string();

    validation::validate_email(&email)?;
    validation::validate_password(&req.password)?;
    validation::validate_display_name(&display_name)?;

    // Fast path for a friendly message; the unique constraint is the
    // real guard against a concurrent registration.
    if user::get_user_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = auth::hash_password(req.password).await?;
    let handle = generate_handle(&state, &display_name).await?;

    let created = user::create_user(
        pool,
        &NewUser {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            display_name,
            handle: Some(handle),
        },
    )
    .await
    .map_err(|err| match err {
        database::DatabaseError::AlreadyExists { entity: "User", .. } => {
            ApiError::Conflict("Email is already registered".to_string())
        }
        other => ApiError::Database(other),
    })?;

    info!(user = %created.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": RegisteredUser {
                id: created.id,
                email: created.email,
                display_name: created.display_name,
                handle: created.handle,
            }
        })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();

    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Unprocessable(
            "Email and password are required".to_string(),
        ));
    }

    let pool = state.db.pool();
    let user = user::get_user_by_email(pool, &email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let verified = auth::verify_password(req.password, user.password_hash.clone()).await?;
    if !verified {
        return Err(ApiError::Unauthorized);
    }

    let session = database::session::create_session(pool, &user.id).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        user: user.summary(),
    }))
}

/// Delete the calling session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let token = auth::bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    database::session::delete_session(state.db.pool(), token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Slug the display name down to a handle and probe for a free one.
/// Uniqueness is ultimately enforced by the schema.
async fn generate_handle(state: &AppState, display_name: &str) -> Result<String> {
    let pool = state.db.pool();
    let slug = slugify(display_name);

    if !user::handle_exists(pool, &slug, None).await? {
        return Ok(slug);
    }

    for i in 1..100 {
        let candidate = format!("{slug}{i}");
        if !user::handle_exists(pool, &candidate, None).await? {
            return Ok(candidate);
        }
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    Ok(format!("{slug}{millis}"))
}

/// Lowercase, collapse non-alphanumerics to dashes, trim, and bound.
fn slugify(input: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;

    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_matches('-');
    let slug: String = slug.chars().take(20).collect();
    let slug = slug.trim_matches('-').to_string();

    if slug.len() < validation::MIN_HANDLE_LENGTH {
        "member".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Alice Cooper"), "alice-cooper");
        assert_eq!(slugify("  --Weird__Name!!  "), "weird-name");
        assert_eq!(slugify("小林"), "member");
        assert_eq!(slugify(""), "member");
        assert_eq!(
            slugify("A Very Long Display Name Indeed"),
            "a-very-long-display"
        );
        assert_eq!(slugify("ab"), "member");
    }
}
