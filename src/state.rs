use std::sync::Arc;

use crate::{config::Config, registry::SessionRegistry, store::QuizStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub config: Config,
    pub sessions: SessionRegistry,
}

impl FromRef<AppState> for Arc<dyn QuizStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
