use crate::app::push::{ErrorResponse, error_response};
use crate::notifier::{NotifyReport, SkipReason};
use crate::ports::push::PushSender;
use crate::ports::store::RoomStore;
use crate::state;
use crate::types::room::{MachineType, PushSubscription, Room, subscription_key};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Before/after snapshots delivered by the store's change hook.
#[derive(Debug, Deserialize)]
pub(crate) struct RoomWriteEvent {
    #[serde(default)]
    pub(crate) before: Option<Room>,
    #[serde(default)]
    pub(crate) after: Option<Room>,
}

pub(crate) async fn room_written<S: PushSender, D: RoomStore>(
    State(state): State<state::AppState<S, D>>,
    Path(room_id): Path<String>,
    Json(event): Json<RoomWriteEvent>,
) -> Json<NotifyReport> {
    let Some(notifier) = state.notifier.as_ref() else {
        warn!("room {room_id} written but web push is not configured, skipping notifications");
        return Json(NotifyReport::Skipped {
            reason: SkipReason::PushDisabled,
        });
    };
    let report = notifier
        .on_room_write(&room_id, event.before.as_ref(), event.after.as_ref())
        .await;
    Json(report)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterSubscriptionRequest {
    pub(crate) subscription: PushSubscription,
}

#[derive(Serialize)]
pub(crate) struct RegisterSubscriptionResponse {
    pub(crate) key: String,
}

pub(crate) async fn register_push_subscription<S: PushSender, D: RoomStore>(
    State(state): State<state::AppState<S, D>>,
    Path((room_id, username)): Path<(String, String)>,
    Json(request): Json<RegisterSubscriptionRequest>,
) -> Result<(StatusCode, Json<RegisterSubscriptionResponse>), ApiError> {
    let subscription = request.subscription;
    if username.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "username is required.",
        ));
    }
    if subscription.endpoint.trim().is_empty()
        || subscription.keys.p256dh.trim().is_empty()
        || subscription.keys.auth.trim().is_empty()
    {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "endpoint, p256dh, and auth are required.",
        ));
    }

    let key = subscription_key(&subscription.endpoint);
    if let Err(err) = state
        .store
        .put_push_subscription(&room_id, &username, &key, &subscription)
        .await
    {
        error!("failed to add subscription for '{username}' in room {room_id}: {err}");
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            "Unable to add subscription.",
        ));
    }

    info!("subscription added for '{username}' in room {room_id}");
    Ok((StatusCode::CREATED, Json(RegisterSubscriptionResponse { key })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionToggleRequest {
    pub(crate) enabled: bool,
}

#[derive(Serialize)]
pub(crate) struct SubscriptionToggleResponse {
    pub(crate) machine_type: MachineType,
    pub(crate) enabled: bool,
}

pub(crate) async fn set_subscription<S: PushSender, D: RoomStore>(
    State(state): State<state::AppState<S, D>>,
    Path((room_id, username, machine_type)): Path<(String, String, String)>,
    Json(request): Json<SubscriptionToggleRequest>,
) -> Result<Json<SubscriptionToggleResponse>, ApiError> {
    let Some(machine_type) = MachineType::parse(&machine_type) else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "machine type must be washer or dryer.",
        ));
    };

    if let Err(err) = state
        .store
        .set_subscription_flag(&room_id, &username, machine_type, request.enabled)
        .await
    {
        error!("failed to update {machine_type} subscription for '{username}' in room {room_id}: {err}");
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            "Unable to update subscription.",
        ));
    }

    Ok(Json(SubscriptionToggleResponse {
        machine_type,
        enabled: request.enabled,
    }))
}
