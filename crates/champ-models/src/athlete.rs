//! Athlete listing and leaderboard models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Athlete {
    pub id: u32,
    pub name: String,
    pub sport: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub score: u32,
    /// Display color as `#RRGGBB`
    pub color: String,
}

impl LeaderboardEntry {
    fn new(rank: u32, name: &str, score: u32, color: &str) -> Self {
        Self {
            rank,
            name: name.to_string(),
            score,
            color: color.to_string(),
        }
    }
}

/// Static demo roster served until persistence exists.
pub fn demo_athletes() -> Vec<Athlete> {
    vec![
        Athlete {
            id: 1,
            name: "Alex Runner".to_string(),
            sport: "Sprinting".to_string(),
        },
        Athlete {
            id: 2,
            name: "Jamie Jumper".to_string(),
            sport: "Long Jump".to_string(),
        },
    ]
}

/// Static demo leaderboard, ordered by rank.
pub fn demo_leaderboard() -> Vec<LeaderboardEntry> {
    vec![
        LeaderboardEntry::new(1, "Alex Runner", 92, "#10B981"),
        LeaderboardEntry::new(2, "Jamie Jumper", 88, "#2563EB"),
        LeaderboardEntry::new(3, "Sam Sprinter", 85, "#F59E0B"),
    ]
}
