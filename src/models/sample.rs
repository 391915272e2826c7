// Stored stat samples and the points the stats API serves

use serde::{Deserialize, Serialize};

/// One observation row. Counts are NULL when the probe succeeded without
/// player data (server online but hiding its player list).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSample {
    pub id: i64,
    pub server_id: i64,
    pub player_count: Option<i64>,
    pub max_players: Option<i64>,
    pub created_at: i64,
}

/// A `{timestamp, playerCount}` pair as served by the stats endpoints.
/// Raw queries map samples 1:1; bucketed queries carry the bucket start
/// and the rounded bucket average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatPoint {
    pub timestamp: i64,
    pub player_count: Option<i64>,
}

impl From<&StatSample> for StatPoint {
    fn from(sample: &StatSample) -> Self {
        Self {
            timestamp: sample.created_at,
            player_count: sample.player_count,
        }
    }
}
