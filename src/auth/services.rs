use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    jwt::{JwtKeys, TokenKind},
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::error::{ApiError, FieldError};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex");
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_registration(req: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(FieldError::body("name", "Please add name", None));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::body(
            "email",
            "Please include a valid email",
            Some(&req.email),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::body(
            "password",
            "Please enter a password with 8 or more characters",
            None,
        ));
    }
    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::body(
            "email",
            "Please include a valid email",
            Some(&req.email),
        ));
    }
    if req.password.is_empty() {
        errors.push(FieldError::body("password", "Password is required", None));
    }
    errors
}

pub fn issue_tokens(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    let pair = keys.issue_pair(user.id)?;
    Ok(AuthResponse {
        token: pair.access,
        refresh_token: pair.refresh,
        user: PublicUser::from(user),
    })
}

pub async fn register_user(
    users: &dyn UserStore,
    keys: &JwtKeys,
    mut req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();
    req.name = req.name.trim().to_string();

    let errors = validate_registration(&req);
    if !errors.is_empty() {
        warn!(fields = errors.len(), "registration rejected");
        return Err(ApiError::Validation(errors));
    }

    if users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(issue_tokens(keys, user)?)
}

pub async fn login_user(
    users: &dyn UserStore,
    keys: &JwtKeys,
    mut req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();

    let errors = validate_login(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let Some(user) = users.find_by_email(&req.email).await? else {
        warn!(email = %req.email, "login unknown email");
        return Err(ApiError::BadRequest("Invalid credentials".into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::BadRequest("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(issue_tokens(keys, user)?)
}

pub async fn refresh_session(
    users: &dyn UserStore,
    keys: &JwtKeys,
    refresh_token: &str,
) -> Result<AuthResponse, ApiError> {
    let claims = keys.verify_kind(refresh_token, TokenKind::Refresh).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthenticated("Token is not valid".into())
    })?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("User not found".into()))?;

    Ok(issue_tokens(keys, user)?)
}
