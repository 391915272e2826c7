// Stat sample store and the query surface over it. A NULL server_id
// argument widens any lookup to the whole directory.

pub mod aggregation;

use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::instrument;

use crate::models::{GrowthStat, StatPoint, StatSample};
use aggregation::Interval;

pub struct StatsRepo {
    pool: SqlitePool,
}

impl StatsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self), fields(repo = "stats", operation = "insert_sample"))]
    pub async fn insert_sample(
        &self,
        server_id: i64,
        player_count: Option<i64>,
        max_players: Option<i64>,
        created_at: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO stat_samples (server_id, player_count, max_players, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(server_id)
        .bind(player_count)
        .bind(max_players)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The player count at one timestamp. Exact sample if present,
    /// otherwise interpolated from the nearest neighbors; `None` only
    /// when no samples exist at all for the scope.
    #[instrument(skip(self), fields(repo = "stats", operation = "point_in_time"))]
    pub async fn point_in_time(
        &self,
        server_id: Option<i64>,
        ts: i64,
    ) -> anyhow::Result<Option<StatPoint>> {
        if let Some(exact) = self.sample_at(server_id, ts).await? {
            return Ok(Some(exact));
        }
        let before = self.preceding_sample(server_id, ts).await?;
        let after = self.following_sample(server_id, ts).await?;
        Ok(aggregation::interpolate_between(ts, before, after))
    }

    pub async fn sample_at(
        &self,
        server_id: Option<i64>,
        ts: i64,
    ) -> anyhow::Result<Option<StatPoint>> {
        let row = sqlx::query(
            "SELECT created_at, player_count FROM stat_samples
             WHERE ($1 IS NULL OR server_id = $1) AND created_at = $2
             ORDER BY id ASC LIMIT 1",
        )
        .bind(server_id)
        .bind(ts)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_point_row(&row)?))
    }

    /// Nearest sample strictly before `ts`.
    pub async fn preceding_sample(
        &self,
        server_id: Option<i64>,
        ts: i64,
    ) -> anyhow::Result<Option<StatPoint>> {
        let row = sqlx::query(
            "SELECT created_at, player_count FROM stat_samples
             WHERE ($1 IS NULL OR server_id = $1) AND created_at < $2
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(server_id)
        .bind(ts)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_point_row(&row)?))
    }

    /// Nearest sample strictly after `ts`.
    pub async fn following_sample(
        &self,
        server_id: Option<i64>,
        ts: i64,
    ) -> anyhow::Result<Option<StatPoint>> {
        let row = sqlx::query(
            "SELECT created_at, player_count FROM stat_samples
             WHERE ($1 IS NULL OR server_id = $1) AND created_at > $2
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(server_id)
        .bind(ts)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_point_row(&row)?))
    }

    /// Samples mapped 1:1 to points, ascending, both range bounds
    /// inclusive and each optional.
    #[instrument(skip(self), fields(repo = "stats", operation = "raw_series"))]
    pub async fn raw_series(
        &self,
        server_id: Option<i64>,
        from: Option<i64>,
        to: Option<i64>,
    ) -> anyhow::Result<Vec<StatPoint>> {
        let rows = sqlx::query(
            "SELECT created_at, player_count FROM stat_samples
             WHERE ($1 IS NULL OR server_id = $1)
               AND ($2 IS NULL OR created_at >= $2)
               AND ($3 IS NULL OR created_at <= $3)
             ORDER BY created_at ASC",
        )
        .bind(server_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(parse_point_row(&row)?);
        }
        Ok(out)
    }

    /// Epoch-aligned buckets of width `interval`: each point carries the
    /// bucket start and the rounded average count of its samples.
    /// Buckets with no samples are omitted, not zero-filled.
    #[instrument(skip(self), fields(repo = "stats", operation = "bucketed_series"))]
    pub async fn bucketed_series(
        &self,
        server_id: Option<i64>,
        interval: Interval,
        from: Option<i64>,
        to: Option<i64>,
    ) -> anyhow::Result<Vec<StatPoint>> {
        let rows = sqlx::query(
            "SELECT (created_at / $4) * $4 AS bucket, AVG(player_count) AS avg_count
             FROM stat_samples
             WHERE ($1 IS NULL OR server_id = $1)
               AND ($2 IS NULL OR created_at >= $2)
               AND ($3 IS NULL OR created_at <= $3)
             GROUP BY bucket
             ORDER BY bucket ASC",
        )
        .bind(server_id)
        .bind(from)
        .bind(to)
        .bind(interval.as_millis())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let bucket: i64 = row.try_get("bucket")?;
            let avg: Option<f64> = row.try_get("avg_count")?;
            out.push(StatPoint {
                timestamp: bucket,
                player_count: avg.map(aggregation::round_count),
            });
        }
        Ok(out)
    }

    /// Average count over [from, to). NULL counts are skipped; `None`
    /// when the window holds no usable samples.
    pub async fn window_average(
        &self,
        server_id: i64,
        from: i64,
        to: i64,
    ) -> anyhow::Result<Option<f64>> {
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(player_count) FROM stat_samples
             WHERE server_id = $1 AND created_at >= $2 AND created_at < $3",
        )
        .bind(server_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }

    /// Ids of servers with at least one sample at or after `since`.
    pub async fn server_ids_with_samples_since(&self, since: i64) -> anyhow::Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT server_id FROM stat_samples WHERE created_at >= $1 ORDER BY server_id ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Replace the growth rows for a batch of servers in one
    /// transaction; readers never see a half-applied recompute.
    #[instrument(skip(self, rows), fields(repo = "stats", operation = "upsert_growth_batch", rows_count = rows.len()))]
    pub async fn upsert_growth_batch(&self, rows: &[GrowthStat]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO growth_stats (server_id, weekly_growth, monthly_growth, updated_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT(server_id) DO UPDATE SET
                   weekly_growth = excluded.weekly_growth,
                   monthly_growth = excluded.monthly_growth,
                   updated_at = excluded.updated_at",
            )
            .bind(row.server_id)
            .bind(row.weekly_growth)
            .bind(row.monthly_growth)
            .bind(row.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_growth(&self, server_id: i64) -> anyhow::Result<Option<GrowthStat>> {
        let row = sqlx::query(
            "SELECT server_id, weekly_growth, monthly_growth, updated_at FROM growth_stats WHERE server_id = $1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(GrowthStat {
            server_id: row.try_get("server_id")?,
            weekly_growth: row.try_get("weekly_growth")?,
            monthly_growth: row.try_get("monthly_growth")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    pub async fn latest_sample(&self, server_id: i64) -> anyhow::Result<Option<StatSample>> {
        let row = sqlx::query(
            "SELECT id, server_id, player_count, max_players, created_at FROM stat_samples
             WHERE server_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_sample_row(&row)?))
    }

    pub async fn oldest_sample(&self, server_id: i64) -> anyhow::Result<Option<StatSample>> {
        let row = sqlx::query(
            "SELECT id, server_id, player_count, max_players, created_at FROM stat_samples
             WHERE server_id = $1 ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(parse_sample_row(&row)?))
    }

    /// All non-NULL counts for one server, ascending, ready for median
    /// and peak/low picks.
    pub async fn sorted_player_counts(&self, server_id: i64) -> anyhow::Result<Vec<i64>> {
        let counts = sqlx::query_scalar::<_, i64>(
            "SELECT player_count FROM stat_samples
             WHERE server_id = $1 AND player_count IS NOT NULL
             ORDER BY player_count ASC",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn parse_point_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<StatPoint> {
    Ok(StatPoint {
        timestamp: row.try_get("created_at")?,
        player_count: row.try_get("player_count")?,
    })
}

fn parse_sample_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<StatSample> {
    Ok(StatSample {
        id: row.try_get("id")?,
        server_id: row.try_get("server_id")?,
        player_count: row.try_get("player_count")?,
        max_players: row.try_get("max_players")?,
        created_at: row.try_get("created_at")?,
    })
}
