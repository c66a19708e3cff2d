//! Session authentication: registration, login and the bearer-token gate.
//!
//! Tokens are 32 random bytes, hex encoded, handed to the client once. Only
//! their SHA-256 digest is stored, so a leaked sessions table cannot be
//! replayed. Expired sessions are rejected but left in place.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::{
    format_timestamp, now_timestamp, DbPool, LoginRequest, LoginResponse, RegisterRequest, Role,
    Session, User, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::Json;
use super::validation::{validate_email, validate_name, validate_password};

/// Reasons a request fails authentication. All surface as 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("Account is disabled")]
    AccountDisabled,
    /// Shared by unknown email and wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::unauthorized(err.to_string())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull the credential out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Store a new session for `user_id` and return the raw token
pub async fn issue_session(
    pool: &DbPool,
    user_id: &str,
    ttl: chrono::Duration,
) -> Result<String, ApiError> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| ApiError::internal("Session lifetime out of range"))?;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(format_timestamp(expires_at))
    .bind(format_timestamp(now))
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolve an `Authorization` header value to the identity behind it.
///
/// Read-only: neither extends the session nor deletes expired ones.
pub async fn authenticate(
    pool: &DbPool,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UserResponse, ApiError> {
    let token = bearer_token(authorization).ok_or(AuthError::MissingToken)?;

    let session: Session = sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if session.is_expired_at(now) {
        return Err(AuthError::TokenExpired.into());
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::AccountDisabled.into());
    }

    Ok(UserResponse::from(user))
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserResponse);

impl CurrentUser {
    /// Fail with 403 unless the caller holds at least `required`
    pub fn require_role(&self, required: Role) -> Result<(), ApiError> {
        if self.0.role.has_at_least(required) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "This action requires the {} role",
                required
            )))
        }
    }
}

impl Deref for CurrentUser {
    type Target = UserResponse;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        authenticate(&state.db, header, Utc::now())
            .await
            .map(CurrentUser)
    }
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_name(&req.name));
    errors.check("email", validate_email(&req.email));
    errors.check("password", validate_password(&req.password));
    errors.finish()
}

async fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

async fn insert_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, ApiError> {
    let password_hash = hash_password(password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = now_timestamp();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        role: role.to_string(),
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.role)
    .bind(user.is_active)
    .bind(&user.created_at)
    .bind(&user.updated_at)
    .execute(pool)
    .await?;

    Ok(user)
}

/// Register endpoint: create a student account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_register_request(&request)?;

    if find_user_by_email(&state.db, &request.email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let user = insert_user(
        &state.db,
        &request.name,
        &request.email,
        &request.password,
        Role::Student,
    )
    .await?;

    let token = issue_session(&state.db, &user.id, state.config.session_ttl()).await?;

    tracing::info!(user_id = %user.id, "Registered new student");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = find_user_by_email(&state.db, &request.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        return Err(AuthError::AccountDisabled.into());
    }

    let token = issue_session(&state.db, &user.id, state.config.session_ttl()).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Return the identity behind the presented token
pub async fn me(user: CurrentUser) -> Json<UserResponse> {
    Json(user.0)
}

/// Create the configured bootstrap admin account if it does not exist yet
pub async fn ensure_admin_user(pool: &DbPool, config: &AuthConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("No bootstrap admin configured");
        return Ok(());
    };

    if let Some(existing) = find_user_by_email(pool, email).await? {
        if existing.role_enum() != Role::Admin {
            tracing::warn!(
                "Bootstrap admin email {} belongs to a {} account; leaving it unchanged",
                email,
                existing.role
            );
        }
        return Ok(());
    }

    insert_user(pool, &config.admin_name, email, password, Role::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {}", e))?;

    tracing::info!("Created bootstrap admin user: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::db::init_memory;
    use chrono::Duration;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(Some("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(Some("Bearer   ")), None);
        assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(Some("abc123")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("p1").unwrap();
        assert_ne!(hash, "p1");
        assert!(verify_password("p1", &hash));
        assert!(!verify_password("p2", &hash));
        assert!(!verify_password("p1", "not-a-phc-string"));
    }

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_ne!(hash_token(&a), a);
        assert_eq!(hash_token(&a), hash_token(&a));
    }

    async fn student(pool: &DbPool, email: &str) -> User {
        insert_user(pool, "A", email, "p1", Role::Student).await.unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_authenticate_valid_session() {
        let pool = init_memory().await.unwrap();
        let user = student(&pool, "a@x.com").await;
        let token = issue_session(&pool, &user.id, Duration::days(7)).await.unwrap();

        let resolved = authenticate(&pool, Some(&bearer(&token)), Utc::now())
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "a@x.com");
        assert_eq!(resolved.role, Role::Student);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_after_expiry_without_deleting() {
        let pool = init_memory().await.unwrap();
        let user = student(&pool, "a@x.com").await;
        let token = issue_session(&pool, &user.id, Duration::days(7)).await.unwrap();
        let header = bearer(&token);

        let later = Utc::now() + Duration::days(7) + Duration::seconds(1);
        let err = authenticate(&pool, Some(&header), later).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Token expired");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let pool = init_memory().await.unwrap();

        let err = authenticate(&pool, None, Utc::now()).await.unwrap_err();
        assert_eq!(err.message(), "Missing token");

        let err = authenticate(&pool, Some("Bearer nope"), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Invalid token");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_authenticate_disabled_and_missing_user() {
        let pool = init_memory().await.unwrap();
        let user = student(&pool, "a@x.com").await;
        let token = issue_session(&pool, &user.id, Duration::days(1)).await.unwrap();
        let header = bearer(&token);

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(&user.id)
            .execute(&pool)
            .await
            .unwrap();
        let err = authenticate(&pool, Some(&header), Utc::now()).await.unwrap_err();
        assert_eq!(err.message(), "Account is disabled");

        // Sessions cascade with their user, so orphan one by hand
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&user.id)
            .execute(&pool)
            .await
            .unwrap();
        let err = authenticate(&pool, Some(&header), Utc::now()).await.unwrap_err();
        assert_eq!(err.message(), "User not found");
    }

    #[tokio::test]
    async fn test_ensure_admin_user_is_idempotent() {
        let pool = init_memory().await.unwrap();
        let config = AuthConfig {
            admin_email: Some("root@campus.local".to_string()),
            admin_password: Some("changeme".to_string()),
            ..AuthConfig::default()
        };

        ensure_admin_user(&pool, &config).await.unwrap();
        ensure_admin_user(&pool, &config).await.unwrap();

        let admins: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE role = 'admin'")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert!(verify_password("changeme", &admins[0].password_hash));
    }

    #[test]
    fn test_require_role() {
        let user = |role| {
            CurrentUser(UserResponse {
                id: "1".to_string(),
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                role,
            })
        };
        assert!(user(Role::Admin).require_role(Role::Admin).is_ok());
        assert!(user(Role::Admin).require_role(Role::Student).is_ok());
        let err = user(Role::Student).require_role(Role::Admin).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
