use crate::ports::push::PushSender;
use crate::ports::store::RoomStore;
use crate::push as push_service;
use crate::state;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

pub(crate) fn error_response(
    status: StatusCode,
    error: &'static str,
) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error }))
}

pub(crate) async fn push_public_key<S: PushSender, D: RoomStore>(
    State(state): State<state::AppState<S, D>>,
) -> Result<Json<PublicKeyResponse>, (StatusCode, Json<ErrorResponse>)> {
    match push_service::load_vapid_config(&state.config) {
        push_service::VapidConfigStatus::Ready(vapid) => Ok(Json(PublicKeyResponse {
            public_key: vapid.public_key,
        })),
        push_service::VapidConfigStatus::Incomplete | push_service::VapidConfigStatus::Missing => {
            Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Push notifications are not configured.",
            ))
        }
    }
}
