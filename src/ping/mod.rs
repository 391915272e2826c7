// Minecraft server-list-ping client.
//
// One TCP exchange per probe: handshake + status request out, one JSON
// status frame back. The whole exchange runs under a single deadline.

pub mod protocol;

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::models::ServerStatus;

/// Probe deadline when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum PingError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("probe timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol violation: {0}")]
    Protocol(&'static str),
    #[error("malformed status document: {0}")]
    BadStatus(#[from] serde_json::Error),
}

// Raw shape of the status JSON. Unknown fields (description, favicon,
// forge data) are ignored.
#[derive(Debug, Deserialize)]
struct StatusDocument {
    version: StatusVersion,
    #[serde(default)]
    players: Option<StatusPlayers>,
}

#[derive(Debug, Deserialize)]
struct StatusVersion {
    name: String,
    protocol: i32,
}

#[derive(Debug, Deserialize)]
struct StatusPlayers {
    online: i64,
    max: i64,
}

#[derive(Debug, Clone)]
pub struct PingClient {
    timeout: Duration,
}

impl Default for PingClient {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl PingClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe `address:port` and parse its status. Any failure mode
    /// (refused, timed out, garbled) comes back as a [`PingError`].
    pub async fn status(&self, address: &str, port: u16) -> Result<ServerStatus, PingError> {
        match timeout(self.timeout, query(address, port)).await {
            Ok(result) => result,
            Err(_) => Err(PingError::Timeout),
        }
    }

    /// Reachability check: did a full status exchange succeed.
    pub async fn is_online(&self, address: &str, port: u16) -> bool {
        self.status(address, port).await.is_ok()
    }
}

async fn query(address: &str, port: u16) -> Result<ServerStatus, PingError> {
    let mut stream = TcpStream::connect((address, port))
        .await
        .map_err(PingError::Connect)?;

    let mut request = protocol::handshake_packet(address, port);
    request.extend_from_slice(&protocol::status_request_packet());
    stream.write_all(&request).await?;

    let frame_len = read_varint_stream(&mut stream).await?;
    if frame_len <= 0 || frame_len as usize > protocol::MAX_FRAME_BYTES {
        return Err(PingError::Protocol("unreasonable frame length"));
    }
    let mut body = vec![0u8; frame_len as usize];
    stream.read_exact(&mut body).await?;

    let mut cursor = &body[..];
    let packet_id = protocol::read_varint(&mut cursor)?;
    if packet_id != protocol::PACKET_ID_STATUS {
        return Err(PingError::Protocol("unexpected packet id"));
    }
    let json_len = protocol::read_varint(&mut cursor)?;
    if json_len < 0 || json_len as usize > cursor.len() {
        return Err(PingError::Protocol("status length out of bounds"));
    }
    parse_status(&cursor[..json_len as usize])
}

// The outer frame length arrives before we know how much to read, so
// this one is decoded byte-by-byte off the socket.
async fn read_varint_stream(stream: &mut TcpStream) -> Result<i32, PingError> {
    let mut value: u64 = 0;
    for shift in 0..protocol::MAX_VARINT_BYTES {
        let byte = stream.read_u8().await?;
        value |= ((byte & 0x7f) as u64) << (7 * shift);
        if byte & 0x80 == 0 {
            return Ok(value as u32 as i32);
        }
    }
    Err(PingError::Protocol("VarInt wider than 5 bytes"))
}

fn parse_status(json: &[u8]) -> Result<ServerStatus, PingError> {
    let doc: StatusDocument = serde_json::from_slice(json)?;
    if let Some(players) = &doc.players
        && (players.online < 0 || players.max < 0)
    {
        return Err(PingError::Protocol("negative player count"));
    }
    Ok(ServerStatus {
        version_name: doc.version.name,
        protocol: doc.version.protocol,
        online_players: doc.players.as_ref().map(|p| p.online),
        max_players: doc.players.as_ref().map(|p| p.max),
    })
}
