use axum::extract::FromRef;
use vestibule_database::Database;
use vestibule_domain::config::ApiConfig;
use vestibule_identity::IdentityService;

/// Shared application state handed to every request handler.
///
/// Every field is internally Arc-backed, so cloning the state per request
/// stays cheap.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub config: ApiConfig,
    pub database: Database,
    pub identity: IdentityService,
}

impl ApiState {
    #[must_use]
    pub fn new(config: ApiConfig, database: Database, identity: IdentityService) -> Self {
        Self { config, database, identity }
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.config.clone()
    }
}

impl FromRef<ApiState> for Database {
    fn from_ref(state: &ApiState) -> Self {
        state.database.clone()
    }
}

impl FromRef<ApiState> for IdentityService {
    fn from_ref(state: &ApiState) -> Self {
        state.identity.clone()
    }
}
