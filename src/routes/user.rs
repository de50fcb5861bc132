use mongodb::bson::doc;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{Review, SavedDoctor, User, UserResponse};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "User")]
#[get("/user/profile")]
pub async fn get_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// Deleting an account takes its reviews and bookmarks with it.
#[openapi(tag = "User")]
#[delete("/user/account")]
pub async fn delete_account(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    db.collection::<Review>("reviews")
        .delete_many(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete reviews: {}", e)))?;

    db.collection::<SavedDoctor>("saved_doctors")
        .delete_many(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete bookmarks: {}", e)))?;

    db.collection::<User>("users")
        .delete_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete account: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Account deleted successfully"
    }))))
}
