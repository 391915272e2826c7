// Derived growth summaries, one row per server

use serde::{Deserialize, Serialize};

/// Relative player-count growth. `None` means the baseline window had no
/// usable samples (or averaged to zero), not zero growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthStat {
    pub server_id: i64,
    /// (avg of trailing 7d - avg of the 7d before that) / avg of the 7d before that.
    pub weekly_growth: Option<f64>,
    /// (avg of trailing 7d - avg of trailing 30d) / avg of trailing 30d.
    pub monthly_growth: Option<f64>,
    pub updated_at: i64,
}
