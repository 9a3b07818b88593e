use axum::Json;
use serde::Deserialize;

use crate::models::SymptomObservation;
use crate::services::symptoms;

// POST /api/symptoms/extract
#[derive(Deserialize)]
pub struct ExtractRequest {
    pub transcript: String,
}

pub async fn extract_symptoms(Json(payload): Json<ExtractRequest>) -> Json<Vec<SymptomObservation>> {
    Json(symptoms::extract(&payload.transcript))
}
