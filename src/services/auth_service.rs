use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        Claims, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
        ResetClaims, ResetPasswordRequest, UpdateProfileRequest,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    notify,
    response::{ApiResponse, Meta},
    state::AppState,
};

const RESET_PURPOSE: &str = "password_reset";
const MIN_PASSWORD_LEN: usize = 8;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::Validation("username and email are required".into()));
    }
    validate_password(&payload.password)?;

    let taken = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(username.as_str()))
                .add(UserCol::Email.eq(email.as_str())),
        )
        .one(&state.orm)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.username == username { "Username" } else { "Email" };
        return Err(AppError::Validation(format!("{field} is already taken")));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role.as_str().to_string()),
        first_name: Set(payload.first_name),
        phone: Set(payload.phone),
        shop_name: Set(payload.shop_name),
        address: Set(payload.address),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success("User created", user_from_entity(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let user = Users::find()
        .filter(UserCol::Username.eq(username.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Validation("Invalid username or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Validation("Invalid username or password".into()));
    }

    let token = issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
            user: user_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Profile", user_from_entity(model), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = find_user(state, user.user_id).await?;
    let mut active: UserActive = existing.into();

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::Validation("email cannot be blank".into()));
        }
        let clash = Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .filter(UserCol::Id.ne(user.user_id))
            .one(&state.orm)
            .await?;
        if clash.is_some() {
            return Err(AppError::Validation("Email is already taken".into()));
        }
        active.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(Some(first_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(shop_name) = payload.shop_name {
        active.shop_name = Set(Some(shop_name));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }

    let model = active.update(&state.orm).await?;
    Ok(ApiResponse::success("Profile updated", user_from_entity(model), None))
}

/// Always succeeds so the endpoint cannot be used to enumerate accounts.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    if let Some(user) = user {
        let token = issue_reset_token(&user, &state.config.jwt_secret)?;
        let link = format!(
            "{}/reset-password/{token}",
            state.config.frontend_url.trim_end_matches('/')
        );
        if let Some(mail) = notify::password_reset_mail(&user, &link) {
            state.notifier.dispatch(vec![mail]);
        }
    } else {
        tracing::debug!("password reset requested for unknown email");
    }

    Ok(ApiResponse::success(
        "If an account exists for this email, a reset link has been sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    validate_password(&payload.new_password)?;
    let invalid = || AppError::Validation("Invalid or expired reset link".into());

    let claims = decode::<ResetClaims>(
        &payload.token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| invalid())?
    .claims;
    if claims.purpose != RESET_PURPOSE {
        return Err(invalid());
    }
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| invalid())?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;
    // Once the password changes the fingerprint no longer matches.
    if password_fingerprint(&user.password_hash) != claims.fp {
        return Err(invalid());
    }

    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    let user = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.id,
        "password_reset",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password has been reset",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn issue_token(user: &UserModel, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn issue_reset_token(user: &UserModel, secret: &str) -> AppResult<String> {
    let expiration = Utc::now() + Duration::hours(1);
    let claims = ResetClaims {
        sub: user.id.to_string(),
        purpose: RESET_PURPOSE.to_string(),
        fp: password_fingerprint(&user.password_hash),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Tail of the PHC hash string; changes whenever the password (or salt) does.
fn password_fingerprint(password_hash: &str) -> String {
    let start = password_hash.len().saturating_sub(16);
    password_hash.get(start..).unwrap_or(password_hash).to_string()
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        role: model.role.parse::<Role>().unwrap_or_default(),
        username: model.username,
        email: model.email,
        first_name: model.first_name,
        phone: model.phone,
        shop_name: model.shop_name,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
