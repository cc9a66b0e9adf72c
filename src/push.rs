use crate::adapters::WebPushSender;
use crate::config;
use crate::notifier::RoomNotifier;
use crate::ports::store::RoomStore;

pub(crate) mod vapid;

use log::{info, warn};

pub use vapid::generate_vapid_credentials;
pub(crate) use vapid::{VapidConfigStatus, load_vapid_config};

/// Builds the notifier, or `None` when Web Push cannot be used.
pub fn build_notifier<D: RoomStore>(
    config: &config::AppConfig,
    store: D,
) -> Option<RoomNotifier<WebPushSender, D>> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Missing => {
            info!("push notifications disabled: no VAPID configuration");
            return None;
        }
    };

    match WebPushSender::new(vapid) {
        Ok(sender) => Some(RoomNotifier::new(sender, store, config.icon.clone())),
        Err(err) => {
            warn!("push notifications disabled: failed to init web-push ({err})");
            None
        }
    }
}
