use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Accounts start out pending and become active on the first successful
/// code verification. A single enum avoids the invalid "verified but
/// inactive" combination two separate flags would allow.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub status: AccountStatus,
    pub admin: bool,
    // Both set on issue, both cleared after a successful verification.
    pub otp_code: Option<String>,
    pub otp_issued_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterDto {
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VerifyOtpDto {
    pub username: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PasswordResetRequestDto {
    pub email: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PasswordResetConfirmDto {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub status: AccountStatus,
    pub admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username,
            email: user.email,
            age: user.age,
            status: user.status,
            admin: user.admin,
        }
    }
}
