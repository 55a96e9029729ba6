use std::sync::Arc;

use crate::services::{MatchService, ProfileStore, SessionRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: Arc<SessionRegistry>,
    pub matcher: Arc<MatchService>,
}

impl AppState {
    /// Creates state around a profile store with no open sessions
    pub fn new(profiles: Arc<dyn ProfileStore>, matcher: MatchService) -> Self {
        Self {
            profiles,
            sessions: Arc::new(SessionRegistry::new()),
            matcher: Arc::new(matcher),
        }
    }
}
