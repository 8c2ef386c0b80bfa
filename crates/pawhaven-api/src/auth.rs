use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info, warn};
use uuid::Uuid;

use pawhaven_db::models::{NewUser, UserPreferences};
use pawhaven_types::api::{
    Claims, Detail, RegisterRequest, RegisterResponse, ResendCodeRequest, TokenForm,
    TokenResponse, VerifyEmailRequest, VerifyTokenResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Form, Json};
use crate::{run_blocking, run_cpu_bound};
use crate::state::AppState;
use crate::users::validate_age_range;
use crate::verification::{self, MAX_ATTEMPTS};

pub const DEFAULT_PROFILE_PHOTO: &str = "https://avatar.iran.liara.run/public/11";
pub const MIN_PASSWORD_LEN: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::bad_request("First and last name are required"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    validate_age_range(req.min_age, req.max_age)?;

    let taken = {
        let email = email.clone();
        run_blocking(&state, move |db| db.email_exists(&email)).await?
    };
    if taken {
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = hash_password(req.password).await?;
    let issued = verification::issue_code(&state.verify_code_secret)?;
    let user_id = Uuid::new_v4();

    let user = NewUser {
        id: user_id.to_string(),
        email: email.clone(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        password_hash,
        profile_photo_url: Some(
            req.profile_photo_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_PHOTO.to_string()),
        ),
        preferences: UserPreferences {
            preferred_species: req.preferred_species.map(|v| v.as_str().to_string()),
            preferred_size: req.preferred_size.map(|v| v.as_str().to_string()),
            temperament: req.temperament.map(|v| v.as_str().to_string()),
            activity_level: req.activity_level.map(|v| v.as_str().to_string()),
            min_age: req.min_age,
            max_age: req.max_age,
        },
        is_admin: state.is_admin_email(&email),
    };

    let uid = user.id.clone();
    let (digest, expires_at) = (issued.digest.clone(), issued.expires_at.clone());
    let created = run_blocking(&state, move |db| {
        if !db.create_user(&user)? {
            return Ok(false);
        }
        db.set_verification_code(&uid, &digest, &expires_at)?;
        Ok(true)
    })
    .await?;
    // Lost a race with a concurrent registration for the same email.
    if !created {
        return Err(ApiError::conflict("Email already registered"));
    }

    // Delivery problems never undo the account; the user can ask for a resend.
    if let Err(e) = state.verification.send(&email, &issued.code) {
        error!("Failed to deliver verification code to {}: {:#}", email, e);
    }

    info!("Registered user {} ({})", user_id, email);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user_id,
            email,
        }),
    ))
}

/// OAuth2 password flow: `username` carries the email.
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> ApiResult<Json<TokenResponse>> {
    let email = form.username.trim().to_lowercase();
    let user = run_blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Incorrect email or password"))?;

    if !verify_password(form.password, user.password_hash.clone()).await? {
        return Err(ApiError::unauthorized("Incorrect email or password"));
    }
    if !user.is_active {
        warn!("Login attempt for deactivated user {}", user.id);
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;
    let access_token = create_token(&state, user_id, &user.email)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

/// Reaching this handler means the middleware accepted the token.
pub async fn verify_token(Extension(claims): Extension<Claims>) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        valid: true,
        user_id: claims.sub,
    })
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<Detail>> {
    let email = req.email.trim().to_lowercase();
    let user = run_blocking(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.is_email_verified {
        return Err(ApiError::bad_request("Email already verified"));
    }
    let Some(digest) = user.email_verification_token.as_deref() else {
        return Err(ApiError::bad_request("No verification code outstanding"));
    };
    if user.email_verification_attempts >= MAX_ATTEMPTS {
        return Err(ApiError::bad_request(
            "Too many failed attempts, request a new code",
        ));
    }
    let expires_at = user.email_verification_expires_at.as_deref().unwrap_or("");
    if verification::is_expired(expires_at, Utc::now()) {
        return Err(ApiError::bad_request("Verification code expired"));
    }

    let uid = user.id.clone();
    if !verification::code_matches(&state.verify_code_secret, &req.code, digest)? {
        run_blocking(&state, move |db| db.record_failed_verification(&uid)).await?;
        return Err(ApiError::bad_request("Invalid verification code"));
    }

    run_blocking(&state, move |db| db.mark_email_verified(&uid)).await?;
    info!("Email verified for user {}", user.id);
    Ok(Json(Detail {
        detail: "Email verified".into(),
    }))
}

pub async fn resend_code(
    State(state): State<AppState>,
    Json(req): Json<ResendCodeRequest>,
) -> ApiResult<Json<Detail>> {
    let email = req.email.trim().to_lowercase();
    let lookup = email.clone();
    let user = run_blocking(&state, move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.is_email_verified {
        return Err(ApiError::bad_request("Email already verified"));
    }

    let issued = verification::issue_code(&state.verify_code_secret)?;
    let (digest, expires_at) = (issued.digest.clone(), issued.expires_at.clone());
    run_blocking(&state, move |db| {
        db.set_verification_code(&user.id, &digest, &expires_at)
    })
    .await?;

    if let Err(e) = state.verification.send(&email, &issued.code) {
        error!("Failed to deliver verification code to {}: {:#}", email, e);
    }
    Ok(Json(Detail {
        detail: "Verification code sent".into(),
    }))
}

pub async fn hash_password(password: String) -> ApiResult<String> {
    run_cpu_bound(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
    })
    .await
}

pub async fn verify_password(password: String, stored_hash: String) -> ApiResult<bool> {
    run_cpu_bound(move || {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
}

pub fn create_token(state: &AppState, user_id: Uuid, email: &str) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (Utc::now() + state.token_ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}
