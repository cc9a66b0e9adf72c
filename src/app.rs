use crate::ports::push::PushSender;
use crate::ports::store::RoomStore;
use crate::state;

use axum::Router;
use axum::routing::{get, post, put};

mod push;
mod rooms;

pub fn app<S, D>(state: state::AppState<S, D>) -> Router
where
    S: PushSender,
    D: RoomStore,
{
    Router::new()
        .route("/api/rooms/{room_id}/events", post(rooms::room_written::<S, D>))
        .route(
            "/api/rooms/{room_id}/members/{username}/push-subscriptions",
            post(rooms::register_push_subscription::<S, D>),
        )
        .route(
            "/api/rooms/{room_id}/members/{username}/subscriptions/{machine_type}",
            put(rooms::set_subscription::<S, D>),
        )
        .route("/api/push/public-key", get(push::push_public_key::<S, D>))
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
