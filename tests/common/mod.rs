// Shared test helpers: temp SQLite store, seeded rows, loopback
// status responders for probe tests.

#![allow(dead_code)]

use bytes::BytesMut;
use craftlist::db;
use craftlist::models::{NewServer, Server};
use craftlist::ping::protocol;
use craftlist::server_repo::ServerRepo;
use craftlist::stats_repo::StatsRepo;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Fresh file-backed store. Keep the TempDir alive for the test's duration.
pub async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("directory.db");
    let pool = db::connect(path.to_str().unwrap(), 5).await.unwrap();
    db::init(&pool).await.unwrap();
    (dir, pool)
}

pub async fn create_server(repo: &ServerRepo, name: &str, address: &str, port: u16) -> Server {
    repo.create(
        &NewServer {
            name: name.into(),
            address: address.into(),
            port,
            owner_id: None,
        },
        1_000,
    )
    .await
    .unwrap()
}

pub async fn insert_count(repo: &StatsRepo, server_id: i64, count: Option<i64>, ts: i64) {
    repo.insert_sample(server_id, count, Some(100), ts)
        .await
        .unwrap()
}

pub fn status_json(version: &str, protocol_number: i32, online: i64, max: i64) -> String {
    serde_json::json!({
        "version": { "name": version, "protocol": protocol_number },
        "players": { "online": online, "max": max },
        "description": { "text": "A Minecraft Server" },
    })
    .to_string()
}

/// Status document for a server that hides its player list.
pub fn status_json_no_players(version: &str, protocol_number: i32) -> String {
    serde_json::json!({
        "version": { "name": version, "protocol": protocol_number },
        "description": { "text": "A Minecraft Server" },
    })
    .to_string()
}

/// Loopback listener that answers every connection with the given
/// status document, framed like a real server.
pub async fn spawn_status_responder(document: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let document = document.clone();
            tokio::spawn(async move {
                // Drain whatever arrived of the handshake + request.
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;

                let mut payload = BytesMut::new();
                protocol::write_varint(&mut payload, protocol::PACKET_ID_STATUS);
                protocol::write_string(&mut payload, &document);
                let frame = protocol::frame(payload);
                let _ = socket.write_all(&frame).await;
            });
        }
    });
    addr
}

/// Listener that accepts and then says nothing, to exercise timeouts.
pub async fn spawn_silent_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _socket = socket;
                tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
            });
        }
    });
    addr
}

/// An address nothing listens on (bound once, then released).
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
