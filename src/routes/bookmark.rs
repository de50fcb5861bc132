use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{Doctor, DoctorResponse, Review, SavedDoctor};
use crate::services::ratings::{self, RatingSummary};
use crate::utils::{ApiError, ApiResponse};

#[derive(Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Saved,
    Unsaved,
}

/// State after a toggle: present flips to absent and back.
fn toggled(present: bool) -> ToggleState {
    if present {
        ToggleState::Unsaved
    } else {
        ToggleState::Saved
    }
}

/// Save/unsave a doctor. Presence is binary; the unique index on
/// (user_id, doctor_id) keeps a racing duplicate insert from producing a
/// second row, and that race is treated as "already saved".
#[openapi(tag = "Bookmarks")]
#[post("/bookmarks/toggle/<doctor_id>")]
pub async fn toggle_bookmark(
    db: &State<DbConn>,
    auth: AuthGuard,
    doctor_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&doctor_id)
        .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;

    db.collection::<Doctor>("doctors")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Doctor not found"))?;

    let saved = db.collection::<SavedDoctor>("saved_doctors");
    let existing = saved
        .find_one(
            doc! { "user_id": auth.user_id, "doctor_id": object_id },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let state = toggled(existing.is_some());
    match existing {
        Some(entry) => {
            saved
                .delete_one(doc! { "_id": entry.id }, None)
                .await
                .map_err(|e| {
                    ApiError::internal_error(format!("Failed to remove bookmark: {}", e))
                })?;
        }
        None => {
            let entry = SavedDoctor {
                id: None,
                user_id: auth.user_id,
                doctor_id: object_id,
                created_at: DateTime::now(),
            };
            if let Err(e) = saved.insert_one(&entry, None).await {
                // A concurrent toggle already created the row; the doctor
                // ends up saved either way.
                if !crate::db::is_duplicate_key_error(&e) {
                    return Err(ApiError::internal_error(format!(
                        "Failed to save bookmark: {}",
                        e
                    )));
                }
            }
        }
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "doctor_id": doctor_id,
        "state": state
    }))))
}

/// The account's saved doctors, most recently saved first, each with its
/// rating summary.
#[openapi(tag = "Bookmarks")]
#[get("/bookmarks")]
pub async fn list_bookmarks(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<SavedDoctor>("saved_doctors")
        .find(doc! { "user_id": auth.user_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut entries = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let entry: SavedDoctor = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        entries.push(entry);
    }

    let doctor_ids: Vec<_> = entries.iter().map(|e| e.doctor_id).collect();

    let mut cursor = db
        .collection::<Doctor>("doctors")
        .find(doc! { "_id": { "$in": doctor_ids.clone() } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut doctors: HashMap<ObjectId, Doctor> = HashMap::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let doctor: Doctor = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = doctor.id {
            doctors.insert(id, doctor);
        }
    }

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(doc! { "doctor_id": { "$in": doctor_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut pairs = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let review: Review = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        pairs.push((review.doctor_id, review.rating));
    }
    let summaries = ratings::summarize_by_doctor(pairs);

    // Preserve save-recency order while joining in the doctor records.
    let listing: Vec<DoctorResponse> = entries
        .iter()
        .filter_map(|entry| doctors.remove(&entry.doctor_id))
        .map(|doctor| {
            let summary = doctor
                .id
                .and_then(|id| summaries.get(&id).copied())
                .unwrap_or(RatingSummary::NEUTRAL);
            DoctorResponse::from_parts(doctor, summary)
        })
        .collect();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "doctors": listing,
        "total": listing.len()
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution_on_presence() {
        // absent -> saved -> unsaved -> back where we started
        assert_eq!(toggled(false), ToggleState::Saved);
        assert_eq!(toggled(true), ToggleState::Unsaved);
        assert_eq!(toggled(false), ToggleState::Saved);
    }
}
