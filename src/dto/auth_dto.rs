use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::{Profile, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanySignUpData {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub sector: String,
    #[validate(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: UserRole,
    #[validate(nested)]
    pub company: Option<CompanySignUpData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact card exposed on offer detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub profile: ProfileResponse,
}

impl From<Profile> for ProfileResponse {
    fn from(value: Profile) -> Self {
        Self {
            id: value.id,
            role: value.role,
            first_name: value.first_name,
            last_name: value.last_name,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Profile> for ContactResponse {
    fn from(value: Profile) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}
