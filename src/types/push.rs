use crate::types::room::MachineType;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Completion { machine_name: String },
    Availability { machine_type: MachineType },
}

/// The JSON document the service worker renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Payload {
    pub fn message(&self, icon: &str) -> NotificationMessage {
        let (title, body) = match self {
            Payload::Completion { machine_name } => (
                format!("✅ {machine_name} Finished!"),
                "Your laundry is ready for pickup.".to_string(),
            ),
            Payload::Availability { machine_type } => (
                format!("🔔 {} Available!", machine_type.display_name()),
                format!("A {machine_type} is now free in your laundry room."),
            ),
        };
        NotificationMessage {
            title,
            body,
            icon: icon.to_string(),
        }
    }

    pub fn to_json(&self, icon: &str) -> String {
        // A struct of three strings always serializes.
        serde_json::to_string(&self.message(icon)).unwrap_or_default()
    }
}
