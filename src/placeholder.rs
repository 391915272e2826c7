// Placeholder resolution: %METRIC_<serverId>% tokens in listing text
// replaced with directory stats. Ids are loaded once each per pass; a
// broken id renders a marker instead of poisoning the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::TimeZone;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{Server, StatSample};
use crate::server_repo::ServerRepo;
use crate::stats_repo::{StatsRepo, aggregation};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%([A-Z_]+)_(\d+)%").unwrap_or_else(|e| panic!("placeholder regex: {}", e))
});

/// Rendered for tokens whose server id has no directory record (or
/// whose record cannot be loaded).
pub const SERVER_NOT_FOUND: &str = "[server not found]";
/// Rendered for tokens whose metric name is not recognized.
pub const UNKNOWN_PLACEHOLDER: &str = "[unknown placeholder]";

const UNKNOWN_VALUE: &str = "unknown";

/// The closed set of metrics a token can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Count from the newest sample.
    RealtimePlayers,
    /// Highest count ever observed.
    PeakPlayers,
    /// Lowest nonzero count ever observed.
    LowPlayers,
    AveragePlayers,
    MedianPlayers,
    /// Version string from the last successful probe.
    Version,
    /// Day the first sample was recorded.
    DataCollectionStart,
    Address,
}

impl Metric {
    pub fn from_token(name: &str) -> Option<Self> {
        match name {
            "PLAYER_COUNT_REALTIME" => Some(Self::RealtimePlayers),
            "PLAYER_COUNT_HIGH" => Some(Self::PeakPlayers),
            "PLAYER_COUNT_LOW" => Some(Self::LowPlayers),
            "PLAYER_COUNT_AVERAGE" => Some(Self::AveragePlayers),
            "PLAYER_COUNT_MEDIAN" => Some(Self::MedianPlayers),
            "VERSION" => Some(Self::Version),
            "DATA_COLLECTION_START" => Some(Self::DataCollectionStart),
            "ADDRESS" => Some(Self::Address),
            _ => None,
        }
    }
}

// Everything the metrics need for one server, fetched once per pass.
struct ServerAggregates {
    server: Server,
    latest: Option<StatSample>,
    oldest: Option<StatSample>,
    /// Non-NULL counts, ascending.
    counts: Vec<i64>,
}

impl ServerAggregates {
    fn render(&self, metric: Metric) -> String {
        match metric {
            Metric::RealtimePlayers => self
                .latest
                .as_ref()
                .and_then(|s| s.player_count)
                .unwrap_or(0)
                .to_string(),
            Metric::PeakPlayers => self.counts.last().copied().unwrap_or(0).to_string(),
            Metric::LowPlayers => self
                .counts
                .iter()
                .copied()
                .find(|&c| c > 0)
                .unwrap_or(0)
                .to_string(),
            Metric::AveragePlayers => aggregation::mean(&self.counts)
                .map(aggregation::round_count)
                .unwrap_or(0)
                .to_string(),
            Metric::MedianPlayers => aggregation::median(&self.counts)
                .map(aggregation::round_count)
                .unwrap_or(0)
                .to_string(),
            Metric::Version => self
                .server
                .version
                .clone()
                .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            Metric::DataCollectionStart => self
                .oldest
                .as_ref()
                .and_then(|s| format_day(s.created_at))
                .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            Metric::Address => self.server.address.clone(),
        }
    }
}

fn format_day(ts: i64) -> Option<String> {
    chrono::Utc
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%d/%m/%Y").to_string())
}

pub struct PlaceholderResolver {
    server_repo: Arc<ServerRepo>,
    stats_repo: Arc<StatsRepo>,
}

impl PlaceholderResolver {
    pub fn new(server_repo: Arc<ServerRepo>, stats_repo: Arc<StatsRepo>) -> Self {
        Self {
            server_repo,
            stats_repo,
        }
    }

    /// Replace every `%METRIC_<id>%` token in `text`. Total: unknown
    /// metrics and missing servers become markers, never errors.
    pub async fn resolve(&self, text: &str) -> String {
        if !TOKEN_RE.is_match(text) {
            return text.to_string();
        }

        let mut ids: BTreeMap<i64, Option<ServerAggregates>> = BTreeMap::new();
        for caps in TOKEN_RE.captures_iter(text) {
            if let Some(id) = parse_id(&caps) {
                ids.entry(id).or_insert(None);
            }
        }

        for (id, slot) in ids.iter_mut() {
            *slot = match self.load_aggregates(*id).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        server_id = id,
                        operation = "load_placeholder_aggregates",
                        "placeholder load failed"
                    );
                    None
                }
            };
        }

        TOKEN_RE
            .replace_all(text, |caps: &Captures| {
                let Some(metric) = Metric::from_token(&caps[1]) else {
                    return UNKNOWN_PLACEHOLDER.to_string();
                };
                match parse_id(caps).and_then(|id| ids.get(&id)) {
                    Some(Some(aggregates)) => aggregates.render(metric),
                    _ => SERVER_NOT_FOUND.to_string(),
                }
            })
            .into_owned()
    }

    async fn load_aggregates(&self, id: i64) -> anyhow::Result<Option<ServerAggregates>> {
        let Some(server) = self.server_repo.get(id).await? else {
            return Ok(None);
        };
        let latest = self.stats_repo.latest_sample(id).await?;
        let oldest = self.stats_repo.oldest_sample(id).await?;
        let counts = self.stats_repo.sorted_player_counts(id).await?;
        Ok(Some(ServerAggregates {
            server,
            latest,
            oldest,
            counts,
        }))
    }
}

// Ids too large for i64 resolve like any other unknown server.
fn parse_id(caps: &Captures) -> Option<i64> {
    caps[2].parse::<i64>().ok()
}
