// Background worker: recompute weekly and monthly growth for every
// server with recent samples, replacing the whole batch in one
// transaction. Runs on a cron schedule or a fixed interval.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::models::GrowthStat;
use crate::stats_repo::StatsRepo;
use crate::stats_repo::aggregation::{self, MS_PER_DAY};

/// Config for the growth worker.
#[derive(Debug, Clone)]
pub struct GrowthWorkerConfig {
    /// Optional cron expression (e.g. "0 0 4 * * * *" = 04:00 daily). Uses local time.
    pub schedule: Option<String>,
    /// Recompute every N seconds when `schedule` is unset or invalid.
    pub interval_secs: u64,
}

/// Spawns the growth worker. Returns a join handle.
pub fn spawn(repo: Arc<StatsRepo>, config: GrowthWorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config).await;
    })
}

#[instrument(skip(repo), fields(interval_secs = config.interval_secs))]
async fn run(repo: Arc<StatsRepo>, config: GrowthWorkerConfig) {
    if let Some(ref cron_str) = config.schedule {
        match cron::Schedule::from_str(cron_str) {
            Ok(schedule) => {
                run_on_schedule(&repo, schedule).await;
                return;
            }
            Err(e) => {
                warn!(error = %e, cron = %cron_str, "invalid growth schedule; using fixed interval");
            }
        }
    }
    run_on_interval(&repo, config.interval_secs).await;
}

async fn run_on_schedule(repo: &StatsRepo, schedule: cron::Schedule) {
    loop {
        let now = chrono::Local::now();
        let next = schedule.after(&now).next();
        if let Some(next) = next {
            let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(delay).await;
            run_logged(repo).await;
        } else {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

async fn run_on_interval(repo: &StatsRepo, interval_secs: u64) {
    let mut tick = tokio::time::interval(Duration::from_secs(interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so a recompute done at
    // startup is not repeated back to back.
    tick.tick().await;
    loop {
        tick.tick().await;
        run_logged(repo).await;
    }
}

async fn run_logged(repo: &StatsRepo) {
    match run_once(repo).await {
        Ok(rows) => info!(rows, operation = "growth_recompute", "growth recompute complete"),
        Err(e) => warn!(error = %e, operation = "growth_recompute", "growth recompute failed"),
    }
}

/// One recompute pass over every server with a sample in the trailing
/// 7 days. Used by the worker loop and by the startup bootstrap.
/// Returns the number of rows written.
pub async fn run_once(repo: &StatsRepo) -> anyhow::Result<u32> {
    let now = chrono::Utc::now().timestamp_millis();
    let week_ago = now - 7 * MS_PER_DAY;
    let two_weeks_ago = now - 14 * MS_PER_DAY;
    let month_ago = now - 30 * MS_PER_DAY;

    let ids = repo.server_ids_with_samples_since(week_ago).await?;

    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        let current = repo.window_average(id, week_ago, now).await?;
        let previous_week = repo.window_average(id, two_weeks_ago, week_ago).await?;
        let month = repo.window_average(id, month_ago, now).await?;
        rows.push(GrowthStat {
            server_id: id,
            weekly_growth: aggregation::growth_ratio(current, previous_week),
            monthly_growth: aggregation::growth_ratio(current, month),
            updated_at: now,
        });
    }

    let count = rows.len() as u32;
    repo.upsert_growth_batch(&rows).await?;
    Ok(count)
}
