use crate::config::AppConfig;
use crate::notifier::RoomNotifier;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<S, D> {
    pub config: AppConfig,
    pub store: D,
    /// `None` while VAPID is not configured.
    pub notifier: Option<Arc<RoomNotifier<S, D>>>,
}
