use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{error, info, warn};

use crate::auth::AuthKeys;
use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::store::Store;

const LOGIN_ERROR: &str = "Incorrect username or password";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(AppError::Validation(format!("Invalid email address: {}", email))),
    }
}

pub async fn register(store: &dyn Store, request: RegisterRequest) -> Result<User, AppError> {
    let email = request.email.trim().to_lowercase();
    let username = request.username.trim().to_string();

    validate_email(&email)?;
    if username.is_empty() {
        return Err(AppError::Validation("Username cannot be empty".into()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".into()));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    // a concurrent registration can still claim the email or username
    // while the password hashes; the unique constraints settle it
    let user = User::new(email, username, hash_password(&request.password)?);
    let user = match store.create_user(&user).await {
        Ok(user) => user,
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
            warn!("Registration for {} lost a race: {}", user.username, e);
            return Err(AppError::Conflict("Email or username already registered".into()));
        }
        Err(e) => {
            error!("Failed to create user {}: {}", user.username, e);
            return Err(AppError::Db(e));
        }
    };

    info!("Registered user {}", user.username);
    Ok(user)
}

/// Returns the user only if the account exists, is active, and the password matches.
pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let Some(user) = store.find_user_by_username(username).await? else {
        return Ok(None);
    };
    if !user.is_active || !verify_password(password, &user.hashed_password) {
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn login(store: &dyn Store, keys: &AuthKeys, request: LoginRequest) -> Result<TokenResponse, AppError> {
    let user = authenticate(store, &request.username, &request.password)
        .await?
        .ok_or_else(|| {
            warn!("Failed login attempt for {}", request.username);
            AppError::Unauthorized(LOGIN_ERROR.into())
        })?;

    Ok(TokenResponse {
        access_token: keys.issue_token(&user.username)?,
        token_type: "bearer".to_string(),
    })
}
