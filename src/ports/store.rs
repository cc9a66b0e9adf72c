use crate::types::room::{MachineType, PushSubscription};

/// A push subscription to delete, addressed by room, member and map key.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StaleSubscription {
    pub username: String,
    pub key: String,
}

/// Targeted writes against the realtime store. Never overwrites a full room.
pub trait RoomStore: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn set_subscription_flag<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        machine_type: MachineType,
        enabled: bool,
    ) -> Self::Fut<'a>;

    fn put_push_subscription<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        key: &'a str,
        subscription: &'a PushSubscription,
    ) -> Self::Fut<'a>;

    /// Deletes all entries in one batched write.
    fn remove_push_subscriptions<'a>(
        &'a self,
        room_id: &'a str,
        stale: &'a [StaleSubscription],
    ) -> Self::Fut<'a>;
}

/// Key segments from the database root down to a member record.
pub fn member_segments<'a>(room_id: &'a str, username: &'a str) -> Vec<&'a str> {
    vec!["rooms", room_id, "members", username]
}

pub fn subscription_flag_segments<'a>(
    room_id: &'a str,
    username: &'a str,
    machine_type: MachineType,
) -> Vec<&'a str> {
    let mut segments = member_segments(room_id, username);
    segments.extend(["subscriptions", machine_type.as_str()]);
    segments
}

pub fn push_subscription_segments<'a>(
    room_id: &'a str,
    username: &'a str,
    key: &'a str,
) -> Vec<&'a str> {
    let mut segments = member_segments(room_id, username);
    segments.extend(["pushSubscriptions", key]);
    segments
}

/// Slash-joined form used as a key in multi-path updates.
pub fn push_subscription_path(room_id: &str, username: &str, key: &str) -> String {
    push_subscription_segments(room_id, username, key).join("/")
}
