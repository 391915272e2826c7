use anyhow::Result;
use craftlist::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let pool = db::connect(&app_config.database.path, app_config.database.max_pool_size).await?;
    db::init(&pool).await?;
    let server_repo = Arc::new(server_repo::ServerRepo::new(pool.clone()));
    let stats_repo = Arc::new(stats_repo::StatsRepo::new(pool));
    let ping = Arc::new(ping::PingClient::new(Duration::from_secs(
        app_config.polling.probe_timeout_secs,
    )));

    // Growth figures are served from the table, so recompute once up
    // front rather than waiting for the first scheduled run.
    match growth_worker::run_once(&stats_repo).await {
        Ok(rows) => tracing::info!(rows, "growth bootstrap complete"),
        Err(e) => tracing::warn!(error = %e, "growth bootstrap failed"),
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let poller_handle = poller::spawn(
        poller::PollerDeps {
            server_repo: server_repo.clone(),
            stats_repo: stats_repo.clone(),
            ping,
            shutdown_rx,
        },
        poller::PollerConfig {
            interval_secs: app_config.polling.interval_secs,
            stats_log_interval_secs: app_config.polling.stats_log_interval_secs,
        },
    );
    let _growth_handle = growth_worker::spawn(
        stats_repo.clone(),
        growth_worker::GrowthWorkerConfig {
            schedule: app_config.growth.schedule.clone(),
            interval_secs: app_config.growth.interval_secs,
        },
    );

    let app = routes::app(server_repo, stats_repo);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                let _ = poller_handle.await;
            }
        }
    }

    Ok(())
}
