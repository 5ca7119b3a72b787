use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::db::models::{AgentRow, MarketRow, RecentVoteRow, StatsRow};
use crate::error::{AppError, Result};
use crate::types::{CastVote, NewMarket, Tally};

/// Filter for the market listing. `limit: None` returns every matching row.
#[derive(Debug, Clone, Default)]
pub struct MarketFilter {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Persistence for markets, votes and agents. Cheap to clone (wraps the pool).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and apply migrations.
    pub async fn open(db_path: &str, max_connections: u32) -> Result<Self> {
        if let Some(dir) = Path::new(db_path).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database ready at {db_path}");

        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Markets
    // -----------------------------------------------------------------------

    /// Active markets, hot first then newest first.
    pub async fn list_markets(&self, filter: &MarketFilter) -> Result<Vec<MarketRow>> {
        let category = filter
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all");

        let rows = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, question, category, yes_percent, no_percent, total_votes,
                   end_date, created_at, is_hot, is_active, resolved, resolution
            FROM markets
            WHERE is_active = 1 AND (?1 IS NULL OR category = ?1)
            ORDER BY is_hot DESC, created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(category)
        .bind(filter.limit.unwrap_or(-1))
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_market(&self, id: i64) -> Result<Option<MarketRow>> {
        let row = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, question, category, yes_percent, no_percent, total_votes,
                   end_date, created_at, is_hot, is_active, resolved, resolution
            FROM markets
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn create_market(&self, market: &NewMarket) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO markets (question, category, end_date, is_hot) VALUES (?, ?, ?, ?)",
        )
        .bind(&market.question)
        .bind(&market.category)
        .bind(&market.end_date)
        .bind(market.is_hot)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a batch of markets in one transaction. Nothing is written if any insert fails.
    pub async fn create_markets(&self, markets: &[NewMarket]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for market in markets {
            sqlx::query(
                "INSERT INTO markets (question, category, end_date, is_hot) VALUES (?, ?, ?, ?)",
            )
            .bind(&market.question)
            .bind(&market.category)
            .bind(&market.end_date)
            .bind(market.is_hot)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(markets.len() as u64)
    }

    // -----------------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------------

    /// Upsert the agent's vote, recompute the market tally from all of its vote
    /// rows, and bump the agent's vote count, as one transaction.
    ///
    /// The upsert is the first statement so the transaction takes SQLite's write
    /// lock up front; concurrent votes queue on `busy_timeout` instead of failing
    /// a read-to-write upgrade. Returns `NotFound` if the market does not exist.
    pub async fn cast_vote(&self, vote: &CastVote) -> Result<Tally> {
        let mut tx = self.pool.begin().await?;

        let upserted = sqlx::query(
            r#"
            INSERT INTO votes (market_id, agent_id, agent_name, vote, comment)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (SELECT 1 FROM markets WHERE id = ?1)
            ON CONFLICT(market_id, agent_id) DO UPDATE SET
                vote = excluded.vote,
                comment = excluded.comment,
                created_at = datetime('now')
            "#,
        )
        .bind(vote.market_id)
        .bind(&vote.agent_id)
        .bind(&vote.agent_name)
        .bind(vote.vote.as_str())
        .bind(vote.comment.as_deref())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if upserted == 0 {
            // Dropping the transaction rolls it back.
            return Err(AppError::NotFound);
        }

        let (total, yes_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN vote = 'YES' THEN 1 ELSE 0 END), 0)
            FROM votes
            WHERE market_id = ?
            "#,
        )
        .bind(vote.market_id)
        .fetch_one(&mut *tx)
        .await?;

        let tally = Tally::from_counts(yes_count, total);

        sqlx::query(
            "UPDATE markets SET total_votes = ?, yes_percent = ?, no_percent = ? WHERE id = ?",
        )
        .bind(tally.total_votes)
        .bind(tally.yes_percent)
        .bind(tally.no_percent)
        .bind(vote.market_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO agents (id, name, total_votes)
            VALUES (?, ?, 1)
            ON CONFLICT(id) DO UPDATE SET total_votes = total_votes + 1
            "#,
        )
        .bind(&vote.agent_id)
        .bind(&vote.agent_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            market_id = vote.market_id,
            yes = yes_count,
            total = total,
            "Tally recomputed"
        );

        Ok(tally)
    }

    pub async fn recent_votes(&self, limit: i64) -> Result<Vec<RecentVoteRow>> {
        let rows = sqlx::query_as::<_, RecentVoteRow>(
            r#"
            SELECT v.id, v.market_id, v.agent_id, v.agent_name, v.vote, v.comment,
                   v.created_at, m.question
            FROM votes v
            JOIN markets m ON v.market_id = m.id
            ORDER BY v.created_at DESC, v.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    pub async fn stats(&self) -> Result<StatsRow> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM markets WHERE is_active = 1) AS active_markets,
                (SELECT COUNT(*) FROM votes) AS total_votes,
                (SELECT COUNT(DISTINCT agent_id) FROM votes) AS total_agents
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<AgentRow>> {
        let rows = sqlx::query_as::<_, AgentRow>(
            r#"
            SELECT id, name, avatar, total_votes, correct_votes, accuracy, created_at
            FROM agents
            ORDER BY total_votes DESC, accuracy DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    // A single connection: every connection to `sqlite::memory:` is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Store::new(pool)
}
