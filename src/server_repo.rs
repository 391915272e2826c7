// Directory table access: registrations and poll bookkeeping.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::instrument;

use crate::models::{NewServer, Server};

pub struct ServerRepo {
    pool: SqlitePool,
}

impl ServerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, new), fields(repo = "servers", operation = "create", name = %new.name))]
    pub async fn create(&self, new: &NewServer, created_at: i64) -> anyhow::Result<Server> {
        let result = sqlx::query(
            "INSERT INTO servers (name, address, port, owner_id, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&new.name)
        .bind(&new.address)
        .bind(new.port as i64)
        .bind(new.owner_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Server {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            address: new.address.clone(),
            port: new.port,
            version: None,
            last_online: None,
            owner_id: new.owner_id,
            created_at,
        })
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<Server>> {
        let row = sqlx::query(
            "SELECT id, name, address, port, version, last_online, owner_id, created_at
             FROM servers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_server_row(&row)?))
    }

    /// Full fleet, ascending by id. The poller sweeps this every tick.
    pub async fn list_all(&self) -> anyhow::Result<Vec<Server>> {
        let rows = sqlx::query(
            "SELECT id, name, address, port, version, last_online, owner_id, created_at
             FROM servers ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(parse_server_row(&row)?);
        }
        Ok(out)
    }

    /// Record a successful probe: refresh the version string, and bump
    /// last_online only when the probe carried player data.
    #[instrument(skip(self, version), fields(repo = "servers", operation = "record_poll_success"))]
    pub async fn record_poll_success(
        &self,
        id: i64,
        version: &str,
        online_at: Option<i64>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE servers SET version = $1, last_online = COALESCE($2, last_online) WHERE id = $3",
        )
        .bind(version)
        .bind(online_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_server_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Server> {
    Ok(Server {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        port: row.try_get::<i64, _>("port")? as u16,
        version: row.try_get("version")?,
        last_online: row.try_get("last_online")?,
        owner_id: row.try_get("owner_id")?,
        created_at: row.try_get("created_at")?,
    })
}
