//! Technician directory service

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::model::{RegisterTechnicianRequest, Technician, TechnicianFilter};
use crate::booking::negotiation::validate_price;
use crate::error::{NegotiationError, NegotiationResult};
use crate::models::{Actor, Role};
use crate::pricing::ServiceCategory;
use crate::store::NegotiationStore;

/// Rating every new profile starts with
pub const DEFAULT_RATING: f64 = 5.0;

#[derive(Clone)]
pub struct TechnicianService {
    store: Arc<dyn NegotiationStore>,
}

impl TechnicianService {
    pub fn new(store: Arc<dyn NegotiationStore>) -> Self {
        Self { store }
    }

    /// Public directory: verified technicians only, whatever the caller asked for.
    pub async fn list_verified(
        &self,
        mut filter: TechnicianFilter,
    ) -> NegotiationResult<Vec<Technician>> {
        filter.include_unverified = false;
        Ok(self.store.list_technicians(&filter).await?)
    }

    /// Public profile. Unverified profiles are reachable by id so open bookings can show them.
    pub async fn get(&self, id: Uuid) -> NegotiationResult<Technician> {
        self.store
            .get_technician(id)
            .await?
            .ok_or(NegotiationError::TechnicianNotFound(id))
    }

    /// A technician lists their own profile. It stays hidden until an admin verifies it.
    pub async fn register(
        &self,
        actor: &Actor,
        request: RegisterTechnicianRequest,
    ) -> NegotiationResult<Technician> {
        if actor.role != Role::Technician {
            return Err(NegotiationError::Unauthorized(
                "only technicians can register a profile".to_string(),
            ));
        }

        let service_type = ServiceCategory::from_name(&request.service_type);
        validate_price(&service_type, request.base_charge)?;

        let technician = Technician {
            id: Uuid::new_v4(),
            user_id: actor.id,
            name: request.name.trim().to_string(),
            service_type,
            district: request.district.trim().to_string(),
            base_charge: request.base_charge,
            experience_years: request.experience_years,
            is_verified: false,
            rating: DEFAULT_RATING,
            bio: request.bio,
            created_at: Utc::now(),
        };

        self.store.insert_technician(&technician).await?;

        tracing::info!(
            technician_id = %technician.id,
            user_id = %actor.id,
            service = %technician.service_type,
            district = %technician.district,
            "Technician registered, awaiting verification"
        );

        Ok(technician)
    }

    pub async fn list_all(&self, actor: &Actor) -> NegotiationResult<Vec<Technician>> {
        actor.require_admin()?;
        let filter = TechnicianFilter {
            include_unverified: true,
            ..Default::default()
        };
        Ok(self.store.list_technicians(&filter).await?)
    }

    pub async fn verify(&self, actor: &Actor, id: Uuid) -> NegotiationResult<Technician> {
        actor.require_admin()?;
        let technician = self
            .store
            .set_technician_verified(id, true)
            .await?
            .ok_or(NegotiationError::TechnicianNotFound(id))?;

        tracing::info!(technician_id = %id, admin_id = %actor.id, "Technician verified");
        Ok(technician)
    }
}
