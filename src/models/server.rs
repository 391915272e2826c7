// Directory records for registered servers

use serde::{Deserialize, Serialize};

/// Default Minecraft server port, used when a registration omits one.
pub const DEFAULT_PORT: u16 = 25565;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub port: u16,
    /// Version string reported by the last successful probe, if any.
    pub version: Option<String>,
    /// Epoch millis of the last probe that carried player data.
    pub last_online: Option<i64>,
    pub owner_id: Option<i64>,
    pub created_at: i64,
}

/// Registration payload for POST /api/servers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServer {
    pub name: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub owner_id: Option<i64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
