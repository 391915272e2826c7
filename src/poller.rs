// Background fleet poller: every tick, probe all registered servers
// concurrently and record one sample per server. A sweep that outlives
// the interval makes the next tick skip instead of stacking sweeps.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::{Duration, interval};

use crate::ping::PingClient;
use crate::server_repo::ServerRepo;
use crate::stats_repo::StatsRepo;

/// Repos, client, and shutdown for the poller.
pub struct PollerDeps {
    pub server_repo: Arc<ServerRepo>,
    pub stats_repo: Arc<StatsRepo>,
    pub ping: Arc<PingClient>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct PollerConfig {
    pub interval_secs: u64,
    /// How often to log sweep totals (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Totals for one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub probed: usize,
    pub online: usize,
    pub unreachable: usize,
    pub storage_failures: usize,
}

enum ProbeOutcome {
    Online,
    Unreachable,
    StorageFailed,
}

pub fn spawn(deps: PollerDeps, config: PollerConfig) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        server_repo,
        stats_repo,
        ping,
        mut shutdown_rx,
    } = deps;
    let PollerConfig {
        interval_secs,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut sweeps_total: u64 = 0;
        let mut online_total: u64 = 0;
        let mut unreachable_total: u64 = 0;
        let mut storage_failures_total: u64 = 0;

        let poller_span = tracing::span!(tracing::Level::DEBUG, "poller", interval_secs);
        let _guard = poller_span.enter();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match run_once(&server_repo, &stats_repo, &ping).await {
                        Ok(summary) => {
                            sweeps_total += 1;
                            online_total += summary.online as u64;
                            unreachable_total += summary.unreachable as u64;
                            storage_failures_total += summary.storage_failures as u64;
                            tracing::debug!(
                                operation = "sweep",
                                probed = summary.probed,
                                online = summary.online,
                                unreachable = summary.unreachable,
                                "sweep finished"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "sweep", "sweep failed");
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        sweeps_total,
                        online_total,
                        unreachable_total,
                        storage_failures_total,
                        "poller stats"
                    );
                }
            }
        }
    })
}

/// One full sweep: load the fleet, probe every server concurrently,
/// wait for all probes. Only the fleet load can fail the sweep; probe
/// and storage errors are contained per server.
pub async fn run_once(
    server_repo: &Arc<ServerRepo>,
    stats_repo: &Arc<StatsRepo>,
    ping: &Arc<PingClient>,
) -> anyhow::Result<SweepSummary> {
    let servers = server_repo.list_all().await?;

    let mut tasks = Vec::with_capacity(servers.len());
    for server in servers {
        let server_repo = server_repo.clone();
        let stats_repo = stats_repo.clone();
        let ping = ping.clone();
        tasks.push(tokio::spawn(async move {
            probe_one(&server_repo, &stats_repo, &ping, server).await
        }));
    }

    let mut summary = SweepSummary::default();
    for result in join_all(tasks).await {
        summary.probed += 1;
        match result {
            Ok(ProbeOutcome::Online) => summary.online += 1,
            Ok(ProbeOutcome::Unreachable) => summary.unreachable += 1,
            Ok(ProbeOutcome::StorageFailed) => summary.storage_failures += 1,
            Err(e) => {
                tracing::warn!(error = %e, operation = "probe_task", "probe task panicked");
                summary.storage_failures += 1;
            }
        }
    }
    Ok(summary)
}

async fn probe_one(
    server_repo: &ServerRepo,
    stats_repo: &StatsRepo,
    ping: &PingClient,
    server: crate::models::Server,
) -> ProbeOutcome {
    match ping.status(&server.address, server.port).await {
        Ok(status) => {
            let now = chrono::Utc::now().timestamp_millis();
            let online_at = status.has_player_data().then_some(now);
            if let Err(e) = server_repo
                .record_poll_success(server.id, &status.version_name, online_at)
                .await
            {
                tracing::warn!(
                    error = %e,
                    server_id = server.id,
                    operation = "record_poll_success",
                    "directory update failed"
                );
                return ProbeOutcome::StorageFailed;
            }
            if let Err(e) = stats_repo
                .insert_sample(server.id, status.online_players, status.max_players, now)
                .await
            {
                tracing::warn!(
                    error = %e,
                    server_id = server.id,
                    operation = "insert_sample",
                    "sample insert failed"
                );
                return ProbeOutcome::StorageFailed;
            }
            tracing::debug!(
                server_id = server.id,
                players = ?status.online_players,
                version = %status.version_name,
                "probe ok"
            );
            ProbeOutcome::Online
        }
        Err(e) => {
            tracing::debug!(
                error = %e,
                server_id = server.id,
                address = %server.address,
                port = server.port,
                operation = "probe",
                "server unreachable"
            );
            ProbeOutcome::Unreachable
        }
    }
}
