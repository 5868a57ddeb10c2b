//! Shared handler state

use std::sync::Arc;

use crate::app::Refresher;

/// State cloned into every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>) -> Self {
        Self { refresher }
    }
}
