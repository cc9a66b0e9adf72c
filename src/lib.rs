pub mod adapters;
mod app;
pub mod config;
pub mod notifier;
pub mod ports;
pub mod push;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use log::{error, info};
use std::sync::Arc;

pub use app::app;
pub use push::generate_vapid_credentials;

pub async fn serve(config: config::AppConfig) {
    let addr = config.addr;
    let store =
        match adapters::FirebaseStore::new(&config.database_url, config.database_secret.clone()) {
            Ok(store) => store,
            Err(err) => {
                error!("{err}");
                return;
            }
        };
    let notifier = push::build_notifier(&config, store.clone()).map(Arc::new);
    let state = state::AppState {
        config,
        store,
        notifier,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    info!("listening on http://{addr}");
    axum::serve(listener, app(state)).await.expect("server error");
}
