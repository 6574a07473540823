//! The authorization gate.
//!
//! One decision function over an enumerated preset: platform roles are
//! checked first via capability containment, then the persisted tenant
//! role assignment. Denial is always explicit; nothing degrades to allow.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::identity::{AccessLevel, Capability, Identity};
use crate::models::restaurant::{RoleAssignment, TenantRole};
use crate::services::store::Store;

/// How a request was granted. Returned for audit logging by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    /// Granted by a platform-level role, independent of tenant membership.
    Platform,
    /// Granted by the subject's role assignment within the restaurant.
    Tenant(TenantRole),
}

pub struct AccessGate<S> {
    store: Arc<S>,
}

impl<S: Store> AccessGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Decide whether `identity` may act on `restaurant_id` at `level`.
    ///
    /// Pure decision over the supplied identity plus one persisted lookup.
    #[instrument(skip(self, identity), fields(subject_id = %identity.subject_id, restaurant_id = %restaurant_id))]
    pub async fn authorize(
        &self,
        identity: &Identity,
        restaurant_id: Uuid,
        level: AccessLevel,
    ) -> Result<AccessGrant, ServiceError> {
        self.authorize_capability(identity, restaurant_id, level.required_capability())
            .await
    }

    async fn authorize_capability(
        &self,
        identity: &Identity,
        restaurant_id: Uuid,
        capability: Capability,
    ) -> Result<AccessGrant, ServiceError> {
        // Platform roles (super-admin included) grant capabilities across
        // every restaurant, no membership row needed.
        if identity.has_capability(capability) {
            debug!(capability = ?capability, "Granted by platform role");
            return Ok(AccessGrant::Platform);
        }

        match self
            .store
            .role_assignment(restaurant_id, &identity.subject_id)
            .await?
        {
            Some(RoleAssignment { role, .. }) if role.grants(capability) => {
                debug!(capability = ?capability, role = %role, "Granted by tenant role assignment");
                Ok(AccessGrant::Tenant(role))
            }
            Some(RoleAssignment { role, .. }) => {
                warn!(capability = ?capability, role = %role, "Tenant role does not grant capability");
                Err(ServiceError::PermissionDenied(
                    "insufficient permissions".into(),
                ))
            }
            None => {
                warn!(capability = ?capability, "No role assignment for this restaurant");
                Err(ServiceError::PermissionDenied(
                    "access denied to this restaurant".into(),
                ))
            }
        }
    }

    /// Replace all assignments of `role` within a restaurant.
    ///
    /// Managers may replace staff lists; replacing manager lists is
    /// reserved for the platform admin, so managers can neither self-assign
    /// nor reassign other managers.
    #[instrument(skip(self, identity, subject_ids), fields(subject_id = %identity.subject_id, restaurant_id = %restaurant_id, role = %role))]
    pub async fn replace_tenant_roles(
        &self,
        identity: &Identity,
        restaurant_id: Uuid,
        role: TenantRole,
        subject_ids: &[String],
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        let required = match role {
            TenantRole::Manager => Capability::AssignManagers,
            TenantRole::Staff => Capability::AssignStaff,
        };
        self.authorize_capability(identity, restaurant_id, required)
            .await?;

        if self.store.restaurant(restaurant_id).await?.is_none() {
            return Err(ServiceError::NotFound("Restaurant"));
        }

        self.store
            .replace_role_assignments(restaurant_id, role, subject_ids)
            .await
    }

    /// List every role assignment for a restaurant.
    ///
    /// Visible at manager level: a tenant manager may read the full list,
    /// manager rows included, even though replacing those rows is
    /// admin-only.
    #[instrument(skip(self, identity), fields(subject_id = %identity.subject_id, restaurant_id = %restaurant_id))]
    pub async fn list_tenant_roles(
        &self,
        identity: &Identity,
        restaurant_id: Uuid,
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        self.authorize(identity, restaurant_id, AccessLevel::ManagerOrAdmin)
            .await?;

        if self.store.restaurant(restaurant_id).await?.is_none() {
            return Err(ServiceError::NotFound("Restaurant"));
        }

        self.store.list_role_assignments(restaurant_id).await
    }
}
