// Parsed server-list-ping status

use serde::{Deserialize, Serialize};

/// What a successful ping tells us about a server. Player fields are
/// absent when the status document carries no `players` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub version_name: String,
    pub protocol: i32,
    pub online_players: Option<i64>,
    pub max_players: Option<i64>,
}

impl ServerStatus {
    /// True when the status carried a `players` object, i.e. the probe
    /// counts as an online sighting with player data.
    pub fn has_player_data(&self) -> bool {
        self.online_players.is_some()
    }
}
