use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror the server's JSON shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatsResponse {
    pub active_markets: i64,
    pub total_votes: i64,
    pub total_agents: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct MarketResponse {
    pub id: i64,
    pub question: String,
    pub category: String,
    pub yes_percent: i64,
    pub no_percent: i64,
    pub total_votes: i64,
    pub is_hot: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct VoteResponse {
    pub id: i64,
    pub market_id: i64,
    pub agent_name: String,
    pub vote: String,
    pub created_at: String,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentResponse {
    pub name: String,
    pub total_votes: i64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LatencyResponse {
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

/// What the right-hand pane shows; toggled with `l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightPane {
    RecentVotes,
    Leaderboard,
}

impl RightPane {
    pub fn toggle(self) -> Self {
        match self {
            RightPane::RecentVotes => RightPane::Leaderboard,
            RightPane::Leaderboard => RightPane::RecentVotes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub stats: StatsResponse,
    pub markets: Vec<MarketResponse>,
    pub recent_votes: Vec<VoteResponse>,
    pub leaderboard: Vec<AgentResponse>,
    pub latency: LatencyResponse,
    pub right_pane: RightPane,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            stats: StatsResponse::default(),
            markets: Vec::new(),
            recent_votes: Vec::new(),
            leaderboard: Vec::new(),
            latency: LatencyResponse::default(),
            right_pane: RightPane::RecentVotes,
            base_url,
        }
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let stats_url = format!("{}/api/stats", self.base_url);
        let markets_url = format!("{}/api/markets?limit=100", self.base_url);
        let votes_url = format!("{}/api/votes/recent?limit=50", self.base_url);
        let leaders_url = format!("{}/api/leaderboard?limit=20", self.base_url);
        let latency_url = format!("{}/api/stats/latency", self.base_url);

        let (stats_res, markets_res, votes_res, leaders_res, latency_res) = tokio::join!(
            client.get(&stats_url).send(),
            client.get(&markets_url).send(),
            client.get(&votes_url).send(),
            client.get(&leaders_url).send(),
            client.get(&latency_url).send(),
        );

        let (stats_res, markets_res, votes_res) = match (stats_res, markets_res, votes_res) {
            (Ok(s), Ok(m), Ok(v)) => (s, m, v),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        if let Some(code) = [&stats_res, &markets_res, &votes_res]
            .iter()
            .map(|r| r.status())
            .find(|s| !s.is_success())
        {
            self.status = ConnectionStatus::Error(format!("HTTP {code}"));
            return;
        }

        let (stats, markets, votes) = tokio::join!(
            stats_res.json::<StatsResponse>(),
            markets_res.json::<Vec<MarketResponse>>(),
            votes_res.json::<Vec<VoteResponse>>(),
        );

        match (stats, markets, votes) {
            (Ok(s), Ok(m), Ok(v)) => {
                self.stats = s;
                self.markets = m;
                self.recent_votes = v;
                self.status = ConnectionStatus::Connected;

                if let Ok(r) = leaders_res {
                    if let Ok(agents) = r.json::<Vec<AgentResponse>>().await {
                        self.leaderboard = agents;
                    }
                }
                if let Ok(r) = latency_res {
                    if let Ok(latency) = r.json::<LatencyResponse>().await {
                        self.latency = latency;
                    }
                }
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.status = ConnectionStatus::Error(format!("parse error: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `2026-02-04 13:05:09` -> `13:05:09`. Anything unexpected is returned unchanged.
pub fn format_time(created_at: &str) -> String {
    created_at
        .split_once(' ')
        .or_else(|| created_at.split_once('T'))
        .map(|(_, time)| time.chars().take(8).collect())
        .unwrap_or_else(|| created_at.to_string())
}

pub fn format_percent(p: i64) -> String {
    format!("{p}%")
}

pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.0}%", accuracy * 100.0)
}

pub fn format_latency(ms: Option<f64>) -> String {
    match ms {
        Some(d) if d >= 1000.0 => format!("{:.1}s", d / 1000.0),
        Some(d) => format!("{:.1}ms", d),
        None => "—".to_string(),
    }
}

/// Cut to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_from_sqlite_timestamp() {
        assert_eq!(format_time("2026-02-04 13:05:09"), "13:05:09");
        assert_eq!(format_time("2026-02-04T13:05:09.123Z"), "13:05:09");
        assert_eq!(format_time("garbage"), "garbage");
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Will AI agents unionize?", 10), "Will AI a…");
        assert_eq!(truncate("🦞🦞🦞🦞", 3), "🦞🦞…");
    }

    #[test]
    fn accuracy_and_latency() {
        assert_eq!(format_accuracy(0.756), "76%");
        assert_eq!(format_latency(Some(2500.0)), "2.5s");
        assert_eq!(format_latency(Some(3.04)), "3.0ms");
        assert_eq!(format_latency(None), "—");
    }

    #[test]
    fn pane_toggles() {
        assert_eq!(RightPane::RecentVotes.toggle(), RightPane::Leaderboard);
        assert_eq!(RightPane::Leaderboard.toggle(), RightPane::RecentVotes);
    }

    #[test]
    fn parses_server_shapes() {
        let markets: Vec<MarketResponse> = serde_json::from_str(
            r#"[{"id":1,"question":"Q","category":"meme","yes_percent":75,"no_percent":25,
                 "total_votes":4,"end_date":"2027-02-04","created_at":"2026-02-04 00:00:00",
                 "is_hot":true,"is_active":true,"resolved":false,"resolution":null}]"#,
        )
        .unwrap();
        assert_eq!(markets[0].yes_percent, 75);
        assert!(markets[0].is_hot);
    }
}
