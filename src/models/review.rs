use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub doctor_id: ObjectId,
    pub user_id: ObjectId,
    pub rating: i32, // 1-10
    pub comment: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewDto {
    pub doctor_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct ReviewQuery {
    pub doctor_id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub doctor_id: String,
    pub username: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl ReviewResponse {
    pub fn from_parts(review: Review, username: String) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            doctor_id: review.doctor_id.to_hex(),
            username,
            rating: review.rating,
            comment: review.comment,
            created_at: review
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        }
    }
}
