use std::net::SocketAddr;

pub const DEFAULT_ICON: &str = "/icons/icon-192.png";

#[derive(Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_secret: Option<String>,
    pub icon: String,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "https://washbuddy.example".to_string(),
            database_secret: None,
            icon: DEFAULT_ICON.to_string(),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
        }
    }
}
