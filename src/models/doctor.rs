use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::services::ratings::RatingSummary;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Doctor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub specialty: String,
    pub hospital: String,
    pub location: String,
    pub email: String,
    pub cell: String,
    pub image: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDoctorDto {
    pub name: String,
    pub specialty: String,
    pub hospital: String,
    pub location: String,
    pub email: String,
    pub cell: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateDoctorDto {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub hospital: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub cell: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct DoctorQuery {
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    /// "rating" (default) or "name"
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DoctorResponse {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub hospital: String,
    pub location: String,
    pub email: String,
    pub cell: String,
    pub image: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

impl DoctorResponse {
    pub fn from_parts(doctor: Doctor, summary: RatingSummary) -> Self {
        DoctorResponse {
            id: doctor.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doctor.name,
            specialty: doctor.specialty,
            hospital: doctor.hospital,
            location: doctor.location,
            email: doctor.email,
            cell: doctor.cell,
            image: doctor.image,
            average_rating: summary.average_rating,
            review_count: summary.review_count,
        }
    }
}
