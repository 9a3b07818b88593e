use std::sync::Arc;

use crate::services::backend::HealthBackend;
use crate::services::call::CallController;

pub struct AppState {
    pub calls: CallController,
    pub backend: Arc<dyn HealthBackend>,
}
