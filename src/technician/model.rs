//! Technician models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::pricing::ServiceCategory;

/// Technician profile
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Technician {
    pub id: Uuid,
    /// Identity the technician signs in with; also the sender of their chat messages
    pub user_id: Uuid,
    pub name: String,
    pub service_type: ServiceCategory,
    pub district: String,
    /// Listed rate in whole rupees, used as the opening quote of every booking
    pub base_charge: i64,
    pub experience_years: i32,
    pub is_verified: bool,
    pub rating: f64,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for a technician registering their own profile
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTechnicianRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 60))]
    pub service_type: String,
    #[validate(length(min = 1, max = 100))]
    pub district: String,
    pub base_charge: i64,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: i32,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
}

/// Query parameters for listing technicians
#[derive(Debug, Default, Deserialize)]
pub struct TechnicianFilter {
    pub district: Option<String>,
    pub service: Option<String>,
    #[serde(skip)]
    pub include_unverified: bool,
}

impl TechnicianFilter {
    pub fn matches(&self, technician: &Technician) -> bool {
        if !self.include_unverified && !technician.is_verified {
            return false;
        }
        if let Some(district) = &self.district {
            if !technician.district.eq_ignore_ascii_case(district.trim()) {
                return false;
            }
        }
        if let Some(service) = &self.service {
            if technician.service_type != ServiceCategory::from_name(service) {
                return false;
            }
        }
        true
    }
}
