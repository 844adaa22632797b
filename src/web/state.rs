use std::sync::Arc;

use crate::{Config, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(mm: ModelManager, config: Arc<Config>) -> Self {
        Self { mm, config }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
