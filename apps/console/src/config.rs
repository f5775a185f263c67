use std::{collections::HashMap, fs};

use relay_core::RelayConfig;
use serde::Deserialize;
use shared::protocol::{Location, SERVICE_PORT};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_host: String,
    pub location_id: String,
    pub location_desc: String,
    pub sort_order: u32,
    pub location_type: String,
    pub button_number: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".into(),
            location_id: "1".into(),
            location_desc: "Visalia".into(),
            sort_order: 1,
            location_type: "User".into(),
            button_number: "1".into(),
        }
    }
}

impl Settings {
    /// Channel endpoint: the configured host against the fixed
    /// service port.
    pub fn server_url(&self) -> String {
        format!("ws://{}:{}", self.server_host, SERVICE_PORT)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            location: Location {
                locationid: self.location_id.clone(),
                locationdesc: self.location_desc.clone(),
                sortorder: self.sort_order,
                locationtype: self.location_type.clone(),
            },
            button_number: self.button_number.clone(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("relay.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_host") {
                settings.server_host = v.clone();
            }
            if let Some(v) = file_cfg.get("location_id") {
                settings.location_id = v.clone();
            }
            if let Some(v) = file_cfg.get("location_desc") {
                settings.location_desc = v.clone();
            }
            if let Some(v) = file_cfg.get("sort_order") {
                if let Ok(parsed) = v.parse::<u32>() {
                    settings.sort_order = parsed;
                }
            }
            if let Some(v) = file_cfg.get("location_type") {
                settings.location_type = v.clone();
            }
            if let Some(v) = file_cfg.get("button_number") {
                settings.button_number = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("RELAY_SERVER_HOST") {
        settings.server_host = v;
    }
    if let Ok(v) = std::env::var("RELAY_LOCATION_ID") {
        settings.location_id = v;
    }
    if let Ok(v) = std::env::var("RELAY_LOCATION_DESC") {
        settings.location_desc = v;
    }
    if let Ok(v) = std::env::var("RELAY_SORT_ORDER") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.sort_order = parsed;
        }
    }
    if let Ok(v) = std::env::var("RELAY_LOCATION_TYPE") {
        settings.location_type = v;
    }
    if let Ok(v) = std::env::var("RELAY_BUTTON_NUMBER") {
        settings.button_number = v;
    }

    settings
}
