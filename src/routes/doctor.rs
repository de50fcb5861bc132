use mongodb::bson::doc;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::models::{Doctor, DoctorQuery, DoctorResponse, Review};
use crate::services::ratings::{self, RatingSummary};
use crate::utils::{ApiError, ApiResponse};

/// Search and filter the directory. Doctors are returned with their rating
/// figures; the default order is highest average rating first, with
/// unreviewed doctors carrying the neutral 0.0 rather than being dropped.
#[openapi(tag = "Doctors")]
#[get("/doctors?<query..>")]
pub async fn list_doctors(
    db: &State<DbConn>,
    query: DoctorQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut filter = doc! {};
    if let Some(ref specialty) = query.specialty {
        filter.insert("specialty", specialty);
    }
    if let Some(ref location) = query.location {
        filter.insert("location", location);
    }
    if let Some(ref search) = query.search {
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": search, "$options": "i" } },
                doc! { "specialty": { "$regex": search, "$options": "i" } },
                doc! { "hospital": { "$regex": search, "$options": "i" } },
                doc! { "location": { "$regex": search, "$options": "i" } },
            ],
        );
    }

    let mut cursor = db
        .collection::<Doctor>("doctors")
        .find(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut doctors = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let doctor: Doctor = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        doctors.push(doctor);
    }

    // One reviews pass for the whole listing instead of a query per doctor.
    let ids: Vec<_> = doctors.iter().filter_map(|d| d.id).collect();
    let mut cursor = db
        .collection::<Review>("reviews")
        .find(doc! { "doctor_id": { "$in": ids } }, None)
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

    let mut listing: Vec<DoctorResponse> = doctors
        .into_iter()
        .map(|doctor| {
            let summary = doctor
                .id
                .and_then(|id| summaries.get(&id).copied())
                .unwrap_or(RatingSummary::NEUTRAL);
            DoctorResponse::from_parts(doctor, summary)
        })
        .collect();

    match query.sort.as_deref() {
        Some("name") => listing.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => listing.sort_by(|a, b| {
            ratings::rating_order(a.average_rating, b.average_rating)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "doctors": listing,
        "total": listing.len()
    }))))
}

/// Single-doctor lookup with its rating summary computed on demand.
#[openapi(tag = "Doctors")]
#[get("/doctors/<doctor_id>")]
pub async fn get_doctor(
    db: &State<DbConn>,
    doctor_id: String,
) -> Result<Json<ApiResponse<DoctorResponse>>, ApiError> {
    let object_id = mongodb::bson::oid::ObjectId::parse_str(&doctor_id)
        .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;

    let doctor = db
        .collection::<Doctor>("doctors")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Doctor not found"))?;

    let mut cursor = db
        .collection::<Review>("reviews")
        .find(doc! { "doctor_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut doctor_ratings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let review: Review = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        doctor_ratings.push(review.rating);
    }
    let summary = ratings::summarize(&doctor_ratings);

    Ok(Json(ApiResponse::success(DoctorResponse::from_parts(
        doctor, summary,
    ))))
}
