// Placeholder resolver tests: token substitution against real
// directory rows, marker rendering, empty-history defaults

mod common;

use std::sync::Arc;

use chrono::TimeZone;

use craftlist::placeholder::{PlaceholderResolver, SERVER_NOT_FOUND, UNKNOWN_PLACEHOLDER};
use craftlist::server_repo::ServerRepo;
use craftlist::stats_repo::StatsRepo;

fn resolver(pool: &sqlx::SqlitePool) -> PlaceholderResolver {
    PlaceholderResolver::new(
        Arc::new(ServerRepo::new(pool.clone())),
        Arc::new(StatsRepo::new(pool.clone())),
    )
}

#[tokio::test]
async fn realtime_count_replaces_the_token_inline() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let stats = StatsRepo::new(pool.clone());
    let server = common::create_server(&servers, "alpha", "a.example.net", 25_565).await;

    common::insert_count(&stats, server.id, Some(10), 1_000).await;
    common::insert_count(&stats, server.id, Some(33), 2_000).await;

    let text = format!("Online: %PLAYER_COUNT_REALTIME_{}%", server.id);
    let out = resolver(&pool).resolve(&text).await;
    assert_eq!(out, "Online: 33");
}

#[tokio::test]
async fn missing_server_renders_a_marker() {
    let (_dir, pool) = common::test_pool().await;
    let out = resolver(&pool)
        .resolve("Play on %PLAYER_COUNT_REALTIME_999%!")
        .await;
    assert_eq!(out, format!("Play on {SERVER_NOT_FOUND}!"));
}

#[tokio::test]
async fn unknown_metric_renders_a_marker_even_without_the_server() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let server = common::create_server(&servers, "alpha", "a.example.net", 25_565).await;

    let text = format!("%PLAYER_COUNT_BOGUS_{}% and %ALSO_BAD_999%", server.id);
    let out = resolver(&pool).resolve(&text).await;
    assert_eq!(out, format!("{UNKNOWN_PLACEHOLDER} and {UNKNOWN_PLACEHOLDER}"));
}

#[tokio::test]
async fn every_metric_renders_from_recorded_history() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let stats = StatsRepo::new(pool.clone());
    let server = common::create_server(&servers, "alpha", "mc.alpha.example", 25_565).await;

    let start = chrono::Utc
        .with_ymd_and_hms(2024, 3, 5, 12, 0, 0)
        .unwrap()
        .timestamp_millis();
    common::insert_count(&stats, server.id, Some(0), start).await;
    common::insert_count(&stats, server.id, Some(5), start + 1_000).await;
    common::insert_count(&stats, server.id, Some(40), start + 2_000).await;
    common::insert_count(&stats, server.id, Some(15), start + 3_000).await;
    servers
        .record_poll_success(server.id, "1.21.4", Some(start + 3_000))
        .await
        .unwrap();

    let resolver = resolver(&pool);
    let id = server.id;

    let cases = [
        ("PLAYER_COUNT_REALTIME", "15"),
        ("PLAYER_COUNT_HIGH", "40"),
        // Lowest nonzero, not the recorded 0.
        ("PLAYER_COUNT_LOW", "5"),
        ("PLAYER_COUNT_AVERAGE", "15"),
        ("PLAYER_COUNT_MEDIAN", "10"),
        ("VERSION", "1.21.4"),
        ("DATA_COLLECTION_START", "05/03/2024"),
        ("ADDRESS", "mc.alpha.example"),
    ];
    for (metric, expected) in cases {
        let out = resolver.resolve(&format!("%{metric}_{id}%")).await;
        assert_eq!(out, expected, "metric {metric}");
    }
}

#[tokio::test]
async fn registered_server_without_history_uses_defaults() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let server = common::create_server(&servers, "alpha", "mc.alpha.example", 25_565).await;

    let resolver = resolver(&pool);
    let id = server.id;

    for metric in [
        "PLAYER_COUNT_REALTIME",
        "PLAYER_COUNT_HIGH",
        "PLAYER_COUNT_LOW",
        "PLAYER_COUNT_AVERAGE",
        "PLAYER_COUNT_MEDIAN",
    ] {
        let out = resolver.resolve(&format!("%{metric}_{id}%")).await;
        assert_eq!(out, "0", "metric {metric}");
    }
    let version = resolver.resolve(&format!("%VERSION_{id}%")).await;
    assert_eq!(version, "unknown");
    let start = resolver
        .resolve(&format!("%DATA_COLLECTION_START_{id}%"))
        .await;
    assert_eq!(start, "unknown");
}

#[tokio::test]
async fn null_latest_count_renders_zero_but_keeps_history() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let stats = StatsRepo::new(pool.clone());
    let server = common::create_server(&servers, "alpha", "a.example.net", 25_565).await;

    common::insert_count(&stats, server.id, Some(7), 1_000).await;
    common::insert_count(&stats, server.id, None, 2_000).await;

    let resolver = resolver(&pool);
    let realtime = resolver
        .resolve(&format!("%PLAYER_COUNT_REALTIME_{}%", server.id))
        .await;
    assert_eq!(realtime, "0");
    let high = resolver
        .resolve(&format!("%PLAYER_COUNT_HIGH_{}%", server.id))
        .await;
    assert_eq!(high, "7");
}

#[tokio::test]
async fn mixed_tokens_resolve_independently() {
    let (_dir, pool) = common::test_pool().await;
    let servers = ServerRepo::new(pool.clone());
    let stats = StatsRepo::new(pool.clone());
    let alpha = common::create_server(&servers, "alpha", "a.example.net", 25_565).await;
    let beta = common::create_server(&servers, "beta", "b.example.net", 25_565).await;

    common::insert_count(&stats, alpha.id, Some(12), 1_000).await;
    common::insert_count(&stats, beta.id, Some(3), 1_000).await;

    let text = format!(
        "alpha %PLAYER_COUNT_REALTIME_{a}% / beta %PLAYER_COUNT_REALTIME_{b}% / gone %PLAYER_COUNT_REALTIME_424242% / alpha again %PLAYER_COUNT_HIGH_{a}%",
        a = alpha.id,
        b = beta.id,
    );
    let out = resolver(&pool).resolve(&text).await;
    assert_eq!(
        out,
        format!("alpha 12 / beta 3 / gone {SERVER_NOT_FOUND} / alpha again 12")
    );
}

#[tokio::test]
async fn text_without_tokens_passes_through() {
    let (_dir, pool) = common::test_pool().await;
    let resolver = resolver(&pool);

    let plain = "Growth is up 5% this week, uptime 99.9%";
    assert_eq!(resolver.resolve(plain).await, plain);
    assert_eq!(resolver.resolve("").await, "");
}

#[tokio::test]
async fn oversized_ids_resolve_as_not_found() {
    let (_dir, pool) = common::test_pool().await;
    let out = resolver(&pool)
        .resolve("%PLAYER_COUNT_REALTIME_99999999999999999999999999%")
        .await;
    assert_eq!(out, SERVER_NOT_FOUND);
}
