use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A laundry room record as stored under `rooms/<room id>`.
///
/// The store drops empty lists and maps, so `machines` and `members` are
/// `None` on a room that was never populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machines: Option<Vec<Machine>>,
    #[serde(default)]
    pub modes: Vec<WashMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<BTreeMap<String, Member>>,
}

impl Room {
    pub fn machines(&self) -> &[Machine] {
        self.machines.as_deref().unwrap_or_default()
    }

    pub fn member(&self, username: &str) -> Option<&Member> {
        self.members.as_ref()?.get(username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    pub status: MachineStatus,
    #[serde(default)]
    pub finish_time: Option<i64>,
    #[serde(default)]
    pub last_used_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    Washer,
    Dryer,
}

impl MachineType {
    pub const ALL: [MachineType; 2] = [MachineType::Washer, MachineType::Dryer];

    pub fn as_str(self) -> &'static str {
        match self {
            MachineType::Washer => "washer",
            MachineType::Dryer => "dryer",
        }
    }

    /// "washer" -> "Washer"
    pub fn display_name(self) -> String {
        let id = self.as_str();
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    #[serde(rename = "In Use", alias = "InUse")]
    InUse,
    Finished,
    #[serde(rename = "Out of Service", alias = "OutOfService")]
    OutOfService,
}

impl MachineStatus {
    pub fn is_busy(self) -> bool {
        matches!(self, MachineStatus::InUse | MachineStatus::OutOfService)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, deserialize_with = "readable_subscriptions")]
    pub push_subscriptions: BTreeMap<String, PushSubscription>,
    #[serde(default)]
    pub subscriptions: SubscriptionFlags,
}

/// Drops entries that are not a usable subscription instead of failing the
/// whole room.
fn readable_subscriptions<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, PushSubscription>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(subscription) => Some((key, subscription)),
            Err(err) => {
                warn!("skipping unreadable push subscription {key}: {err}");
                None
            }
        })
        .collect())
}

impl Member {
    pub fn has_push_target(&self) -> bool {
        !self.push_subscriptions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFlags {
    #[serde(default)]
    pub washer: bool,
    #[serde(default)]
    pub dryer: bool,
}

impl SubscriptionFlags {
    pub fn get(&self, machine_type: MachineType) -> bool {
        match machine_type {
            MachineType::Washer => self.washer,
            MachineType::Dryer => self.dryer,
        }
    }
}

/// Browser `PushSubscriptionJSON`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    /// DOMHighResTimeStamp, may be fractional.
    #[serde(default)]
    pub expiration_time: Option<f64>,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashMode {
    pub id: u64,
    pub name: String,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
}

const SUBSCRIPTION_KEY_MAX_CHARS: usize = 100;

/// Derives the `pushSubscriptions` map key for an endpoint.
///
/// Database keys cannot contain `.`, `$`, `#`, `[`, `]` or `/`.
pub fn subscription_key(endpoint: &str) -> String {
    endpoint
        .chars()
        .map(|ch| match ch {
            '.' | '$' | '#' | '[' | ']' | '/' => '_',
            other => other,
        })
        .take(SUBSCRIPTION_KEY_MAX_CHARS)
        .collect()
}
