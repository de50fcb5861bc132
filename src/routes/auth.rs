use mongodb::bson::{Bson, DateTime, doc, oid::ObjectId};
use rand::rngs::OsRng;
use rocket::State;
use rocket::serde::json::Json;

use crate::config::Config;
use crate::db::DbConn;
use crate::models::{
    AccountStatus, LoginDto, PasswordResetConfirmDto, PasswordResetRequestDto, RegisterDto, User,
    UserResponse, VerifyOtpDto,
};
use crate::services::{EmailService, JwtService, OtpService};
use crate::utils::{
    ApiError, ApiResponse, validate_email, validate_password, validate_username,
};

const OTP_ISSUE_LIMIT: i32 = 3;
const OTP_ISSUE_WINDOW_MS: i64 = 10 * 60 * 1000;
const REFRESH_LIMIT: i32 = 10;
const REFRESH_WINDOW_MS: i64 = 60 * 1000;

/// --------------------
/// Rate limiter helper
/// --------------------
async fn rate_limit(db: &DbConn, key: &str, limit: i32, window_ms: i64) -> Result<(), ApiError> {
    let now = chrono::Utc::now().timestamp_millis();
    let window_expires = DateTime::from_millis(now + window_ms);

    let collection = db.collection::<mongodb::bson::Document>("rate_limits");

    let doc = collection
        .find_one(doc! { "key": key }, None)
        .await
        .map_err(|_| ApiError::internal_error("Rate limiter lookup failed"))?;

    match doc {
        // First request OR expired window
        None => {
            collection
                .insert_one(
                    doc! {
                        "key": key,
                        "count": 1,
                        "expires_at": window_expires
                    },
                    None,
                )
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter insert failed"))?;
            Ok(())
        }

        Some(d) => {
            let count = d.get_i32("count").unwrap_or(0);
            let expires_at = d.get_datetime("expires_at").ok();

            // Window expired → reset
            if expires_at.map(|e| *e < DateTime::now()).unwrap_or(true) {
                collection
                    .update_one(
                        doc! { "key": key },
                        doc! {
                            "$set": {
                                "count": 1,
                                "expires_at": window_expires
                            }
                        },
                        None,
                    )
                    .await
                    .map_err(|_| ApiError::internal_error("Rate limiter reset failed"))?;
                return Ok(());
            }

            // Limit exceeded
            if count >= limit {
                return Err(ApiError::too_many_requests(
                    "Too many requests. Please try later.",
                ));
            }

            // Increment count
            collection
                .update_one(doc! { "key": key }, doc! { "$inc": { "count": 1 } }, None)
                .await
                .map_err(|_| ApiError::internal_error("Rate limiter increment failed"))?;

            Ok(())
        }
    }
}

/// Generates a fresh code, stores it on the account (overwriting any
/// pending one) and emails it. Email delivery is best-effort.
async fn issue_otp(db: &DbConn, user: &User, purpose: &str) -> Result<(), ApiError> {
    let code = OtpService::generate_code(&mut OsRng);

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": { "otp_code": &code, "otp_issued_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to store code: {}", e)))?;

    EmailService::send_otp_email(&user.email, &user.username, &code, purpose).await;
    Ok(())
}

/// --------------------
/// Register (step 1: create pending account, email code)
/// --------------------
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_username(&dto.username) {
        return Err(ApiError::bad_request("Invalid username"));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    if !validate_password(&dto.password) {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    rate_limit(
        db,
        &format!("register_otp:{}", dto.username),
        OTP_ISSUE_LIMIT,
        OTP_ISSUE_WINDOW_MS,
    )
    .await?;

    let existing = db
        .collection::<User>("users")
        .find_one(
            doc! { "$or": [ { "username": &dto.username }, { "email": &dto.email } ] },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if let Some(existing) = existing {
        if existing.username == dto.username {
            return Err(ApiError::conflict("Username already taken"));
        }
        return Err(ApiError::conflict("Email already registered"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;

    let user = User {
        id: None,
        username: dto.username.clone(),
        email: dto.email.clone(),
        password_hash,
        age: dto.age,
        status: AccountStatus::Pending,
        admin: false,
        otp_code: None,
        otp_issued_at: None,
        created_at: DateTime::now(),
    };

    let result = db
        .collection::<User>("users")
        .insert_one(&user, None)
        .await
        .map_err(|e| {
            // A concurrent registration can still hit the unique index.
            if crate::db::is_duplicate_key_error(&e) {
                ApiError::conflict("Username or email already registered")
            } else {
                ApiError::internal_error(format!("Failed to create account: {}", e))
            }
        })?;

    let mut user = user;
    user.id = result.inserted_id.as_object_id();

    issue_otp(db, &user, "Registration").await?;

    Ok(Json(ApiResponse::success_with_message(
        "Account created. A verification code has been emailed.".to_string(),
        serde_json::json!({ "username": user.username }),
    )))
}

/// --------------------
/// Verify code (step 2 of register and of login)
/// --------------------
#[post("/auth/verify", data = "<dto>")]
pub async fn verify_otp(
    db: &State<DbConn>,
    dto: Json<VerifyOtpDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "username": &dto.username }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let valid = OtpService::verify(
        user.otp_code.as_deref(),
        user.otp_issued_at,
        &dto.otp,
        DateTime::now(),
        Config::otp_ttl_minutes(),
    );
    if !valid {
        return Err(ApiError::unauthorized("Invalid or expired code"));
    }

    // Activate the account and clear the code so it cannot authenticate
    // a second time.
    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": {
                "status": "active",
                "otp_code": Bson::Null,
                "otp_issued_at": Bson::Null
            } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update account: {}", e)))?;

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("Account is missing an id"))?;

    let access_token = JwtService::generate_access_token(&user_id, &user.username)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.username)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let mut user = user;
    user.status = AccountStatus::Active;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Verification successful",
        "user": UserResponse::from(user),
        "accessToken": access_token,
        "refreshToken": refresh_token
    }))))
}

/// --------------------
/// Login (step 1: credentials → code emailed)
/// --------------------
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "username": &dto.username }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let password_ok = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(format!("Password check failed: {}", e)))?;
    if !password_ok {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if user.status == AccountStatus::Pending {
        return Err(ApiError::unauthorized(
            "Account not verified. Complete registration first.",
        ));
    }

    rate_limit(
        db,
        &format!("login_otp:{}", user.username),
        OTP_ISSUE_LIMIT,
        OTP_ISSUE_WINDOW_MS,
    )
    .await?;

    issue_otp(db, &user, "Login").await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Credentials valid. A verification code has been emailed.",
        "username": user.username
    }))))
}

/// --------------------
/// Password reset (step 1: request code by email)
/// --------------------
#[post("/auth/password-reset", data = "<dto>")]
pub async fn password_reset_request(
    db: &State<DbConn>,
    dto: Json<PasswordResetRequestDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    rate_limit(
        db,
        &format!("reset_otp:{}", dto.email),
        OTP_ISSUE_LIMIT,
        OTP_ISSUE_WINDOW_MS,
    )
    .await?;

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    // Same response whether or not the account exists, so this endpoint
    // cannot be used to enumerate registered emails.
    if let Some(user) = user {
        issue_otp(db, &user, "Password Reset").await?;
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "If an account exists with this email, a code has been sent."
    }))))
}

/// --------------------
/// Password reset (step 2: code + new password)
/// --------------------
#[post("/auth/password-reset/confirm", data = "<dto>")]
pub async fn password_reset_confirm(
    db: &State<DbConn>,
    dto: Json<PasswordResetConfirmDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_password(&dto.new_password) {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    // An unknown email gets the same rejection as a bad code.
    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid or expired code"));
    };

    let valid = OtpService::verify(
        user.otp_code.as_deref(),
        user.otp_issued_at,
        &dto.otp,
        DateTime::now(),
        Config::otp_ttl_minutes(),
    );
    if !valid {
        return Err(ApiError::unauthorized("Invalid or expired code"));
    }

    let password_hash = bcrypt::hash(&dto.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": {
                "password_hash": password_hash,
                "otp_code": Bson::Null,
                "otp_issued_at": Bson::Null
            } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update password: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Password reset successful. Please login."
    }))))
}

/// --------------------
/// Silent Refresh Token
/// --------------------
#[derive(serde::Deserialize)]
pub struct RefreshTokenDto {
    pub refresh_token: String,
}

#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    db: &State<DbConn>,
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    rate_limit(db, "refresh_token", REFRESH_LIMIT, REFRESH_WINDOW_MS).await?;

    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid user id in token"))?;

    let access = JwtService::generate_access_token(&user_id, &claims.username)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "accessToken": access
    }))))
}
