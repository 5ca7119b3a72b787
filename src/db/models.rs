/// Database row types matching `migrations/0001_init.sql`.
/// Serialized as-is in API responses, so field names are the wire names.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketRow {
    pub id: i64,
    pub question: String,
    pub category: String,
    pub yes_percent: i64,
    pub no_percent: i64,
    pub total_votes: i64,
    pub end_date: String,
    pub created_at: String,
    pub is_hot: bool,
    pub is_active: bool,
    pub resolved: bool,
    pub resolution: Option<String>,
}

/// A vote row joined with its market's question.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentVoteRow {
    pub id: i64,
    pub market_id: i64,
    pub agent_id: String,
    pub agent_name: String,
    pub vote: String,
    pub comment: Option<String>,
    pub created_at: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub total_votes: i64,
    pub correct_votes: i64,
    pub accuracy: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatsRow {
    pub active_markets: i64,
    pub total_votes: i64,
    pub total_agents: i64,
}
