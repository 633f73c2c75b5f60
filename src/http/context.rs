//! Application state shared across request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::identity::{ProvisioningService, RegistrationService};
use crate::storage::traits::IdentityStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Credential store backing every service
    pub storage: Arc<dyn IdentityStorage>,
    /// Account registration and profile update orchestration
    pub registration_service: Arc<RegistrationService>,
    /// OAuth client, scope, and resource provisioning
    pub provisioning_service: Arc<ProvisioningService>,
}
