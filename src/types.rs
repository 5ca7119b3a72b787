use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vote choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteChoice::Yes => "YES",
            VoteChoice::No => "NO",
        }
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = ();

    /// Exact match only: `"yes"` or `" YES"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(VoteChoice::Yes),
            "NO" => Ok(VoteChoice::No),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Write-side inputs
// ---------------------------------------------------------------------------

/// A validated vote, ready for the tally transaction.
#[derive(Debug, Clone)]
pub struct CastVote {
    pub market_id: i64,
    pub agent_id: String,
    pub agent_name: String,
    pub vote: VoteChoice,
    pub comment: Option<String>,
}

/// A market to insert. Also the record shape of the seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarket {
    pub question: String,
    pub category: String,
    pub end_date: String,
    #[serde(default)]
    pub is_hot: bool,
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Aggregate tally for one market after a vote has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub yes_percent: i64,
    pub no_percent: i64,
    pub total_votes: i64,
}

impl Tally {
    /// Split `yes_count` of `total` into integer percentages. The YES share rounds
    /// half up; NO is the complement so the pair always sums to 100. No votes = 50/50.
    pub fn from_counts(yes_count: i64, total: i64) -> Self {
        let yes_percent = if total > 0 {
            (200 * yes_count + total) / (2 * total)
        } else {
            50
        };
        Self {
            yes_percent,
            no_percent: 100 - yes_percent,
            total_votes: total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub success: bool,
    pub market_id: i64,
    #[serde(flatten)]
    pub tally: Tally,
}
