use std::sync::Arc;

use crate::config::Config;
use crate::service_client::ScreeningService;
use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single screening session this console drives.
    pub session: Arc<Session>,
    /// Screening service backend. Default: `ScreeningClient` over HTTP.
    pub service: Arc<dyn ScreeningService>,
    pub config: Config,
}
