//! Configuration system.
//!
//! Loads scene configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration for the scene client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Room server address, e.g. `127.0.0.1:40000`.
    pub server_addr: String,
    /// Room name to join-or-create.
    #[serde(default = "default_room_name")]
    pub room_name: String,
    /// Fixed client tick rate.
    pub tick_hz: u32,
    /// Player name.
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

fn default_room_name() -> String {
    "part1_room".to_string()
}

fn default_player_name() -> String {
    "Player".to_string()
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:40000".to_string(),
            room_name: default_room_name(),
            tick_hz: 60,
            player_name: default_player_name(),
        }
    }
}

impl SceneConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_apply() {
        let cfg = SceneConfig::from_json_str(
            r#"{"server_addr": "127.0.0.1:9000", "tick_hz": 30}"#,
        )
        .unwrap();
        assert_eq!(cfg.room_name, "part1_room");
        assert_eq!(cfg.player_name, "Player");
        assert_eq!(cfg.tick_hz, 30);
    }
}
