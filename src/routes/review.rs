use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use std::collections::HashMap;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, Doctor, Review, ReviewQuery, ReviewResponse, User};
use crate::utils::{ApiError, ApiResponse, validate_rating};

/// One review per (user, doctor); the unique index is the final word when
/// two submissions race.
#[openapi(tag = "Reviews")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_rating(dto.rating) {
        return Err(ApiError::bad_request("Rating must be between 1 and 10"));
    }

    let doctor_id = ObjectId::parse_str(&dto.doctor_id)
        .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;

    db.collection::<Doctor>("doctors")
        .find_one(doc! { "_id": doctor_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Doctor not found"))?;

    let existing = db
        .collection::<Review>("reviews")
        .find_one(
            doc! { "doctor_id": doctor_id, "user_id": auth.user_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::conflict("You have already reviewed this doctor"));
    }

    let review = Review {
        id: None,
        doctor_id,
        user_id: auth.user_id,
        rating: dto.rating,
        comment: dto.comment.clone(),
        created_at: DateTime::now(),
    };

    let result = db
        .collection::<Review>("reviews")
        .insert_one(&review, None)
        .await
        .map_err(|e| {
            if crate::db::is_duplicate_key_error(&e) {
                ApiError::conflict("You have already reviewed this doctor")
            } else {
                ApiError::internal_error(format!("Failed to create review: {}", e))
            }
        })?;

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        serde_json::json!({
            "review_id": result.inserted_id.as_object_id().map(|id| id.to_hex())
        }),
    )))
}

/// List reviews, newest first, optionally scoped to one doctor.
#[openapi(tag = "Reviews")]
#[get("/reviews?<query..>")]
pub async fn list_reviews(
    db: &State<DbConn>,
    _auth: AuthGuard,
    query: ReviewQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut filter = doc! {};
    if let Some(ref doctor_id) = query.doctor_id {
        let object_id = ObjectId::parse_str(doctor_id)
            .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;
        filter.insert("doctor_id", object_id);
    }

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut reviews = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let review: Review = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        reviews.push(review);
    }

    // Join reviewer usernames in one query.
    let user_ids: Vec<_> = reviews.iter().map(|r| r.user_id).collect();
    let mut cursor = db
        .collection::<User>("users")
        .find(doc! { "_id": { "$in": user_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut usernames: HashMap<ObjectId, String> = HashMap::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let user: User = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = user.id {
            usernames.insert(id, user.username);
        }
    }

    let listing: Vec<ReviewResponse> = reviews
        .into_iter()
        .map(|review| {
            let username = usernames.get(&review.user_id).cloned().unwrap_or_default();
            ReviewResponse::from_parts(review, username)
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": listing,
        "total": listing.len()
    }))))
}
