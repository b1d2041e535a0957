use interactives_core::Config;
use interactives_infra::HealthRegistry;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub config: Config,
    pub health: HealthRegistry,
}
