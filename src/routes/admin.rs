use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AdminGuard;
use crate::models::{CreateDoctorDto, Doctor, Review, SavedDoctor, UpdateDoctorDto};
use crate::utils::{ApiError, ApiResponse, validate_email};

fn doctor_from_dto(dto: &CreateDoctorDto) -> Doctor {
    Doctor {
        id: None,
        name: dto.name.clone(),
        specialty: dto.specialty.clone(),
        hospital: dto.hospital.clone(),
        location: dto.location.clone(),
        email: dto.email.clone(),
        cell: dto.cell.clone(),
        image: dto.image.clone(),
        created_at: DateTime::now(),
    }
}

#[openapi(tag = "Admin")]
#[post("/admin/doctors", data = "<dto>")]
pub async fn create_doctor(
    db: &State<DbConn>,
    _admin: AdminGuard,
    dto: Json<CreateDoctorDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.name.trim().is_empty() || dto.specialty.trim().is_empty() {
        return Err(ApiError::bad_request("Name and specialty are required"));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let result = db
        .collection::<Doctor>("doctors")
        .insert_one(doctor_from_dto(&dto), None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create doctor: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Doctor created successfully".to_string(),
        serde_json::json!({
            "doctor_id": result.inserted_id.as_object_id().map(|id| id.to_hex())
        }),
    )))
}

#[openapi(tag = "Admin")]
#[put("/admin/doctors/<doctor_id>", data = "<dto>")]
pub async fn update_doctor(
    db: &State<DbConn>,
    _admin: AdminGuard,
    doctor_id: String,
    dto: Json<UpdateDoctorDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&doctor_id)
        .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;

    if let Some(ref email) = dto.email {
        if !validate_email(email) {
            return Err(ApiError::bad_request("Invalid email"));
        }
    }

    let mut update_doc = doc! {};
    if let Some(ref name) = dto.name {
        update_doc.insert("name", name);
    }
    if let Some(ref specialty) = dto.specialty {
        update_doc.insert("specialty", specialty);
    }
    if let Some(ref hospital) = dto.hospital {
        update_doc.insert("hospital", hospital);
    }
    if let Some(ref location) = dto.location {
        update_doc.insert("location", location);
    }
    if let Some(ref email) = dto.email {
        update_doc.insert("email", email);
    }
    if let Some(ref cell) = dto.cell {
        update_doc.insert("cell", cell);
    }
    if let Some(ref image) = dto.image {
        update_doc.insert("image", image);
    }

    if update_doc.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let result = db
        .collection::<Doctor>("doctors")
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update doctor: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Doctor not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Doctor updated successfully"
    }))))
}

/// Removing a doctor cascades to its reviews and bookmarks.
#[openapi(tag = "Admin")]
#[delete("/admin/doctors/<doctor_id>")]
pub async fn delete_doctor(
    db: &State<DbConn>,
    _admin: AdminGuard,
    doctor_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&doctor_id)
        .map_err(|_| ApiError::bad_request("Invalid doctor ID"))?;

    let result = db
        .collection::<Doctor>("doctors")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete doctor: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Doctor not found"));
    }

    db.collection::<Review>("reviews")
        .delete_many(doc! { "doctor_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete reviews: {}", e)))?;

    db.collection::<SavedDoctor>("saved_doctors")
        .delete_many(doc! { "doctor_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete bookmarks: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Doctor deleted successfully"
    }))))
}

/// Bulk seeding for directory data. Entries already present (same name and
/// hospital) are skipped so the import can be re-run.
#[openapi(tag = "Admin")]
#[post("/admin/doctors/import", data = "<dtos>")]
pub async fn import_doctors(
    db: &State<DbConn>,
    _admin: AdminGuard,
    dtos: Json<Vec<CreateDoctorDto>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let collection = db.collection::<Doctor>("doctors");

    let mut inserted = 0;
    let mut skipped = 0;
    for dto in dtos.iter() {
        let existing = collection
            .find_one(doc! { "name": &dto.name, "hospital": &dto.hospital }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        if existing.is_some() {
            skipped += 1;
            continue;
        }

        collection
            .insert_one(doctor_from_dto(dto), None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to insert doctor: {}", e)))?;
        inserted += 1;
    }

    Ok(Json(ApiResponse::success_with_message(
        format!("Imported {} doctors ({} skipped)", inserted, skipped),
        serde_json::json!({
            "inserted": inserted,
            "skipped": skipped
        }),
    )))
}
