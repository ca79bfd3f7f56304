use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub offer_id: Uuid,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub motivation_letter: String,
    pub cv_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationResponse {
    pub success: bool,
    pub application: ApplicationResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HasAppliedResponse {
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApplicationStatusPayload {
    pub status: ApplicationStatus,
}

impl From<Application> for ApplicationResponse {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            student_id: value.student_id,
            offer_id: value.offer_id,
            applied_at: value.applied_at,
            status: value.status,
            motivation_letter: value.motivation_letter,
            cv_path: value.cv_path,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
