use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A proposed public investment. Suggestions start unapproved and are hidden
/// from non-admin visitors until an admin approves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub likes: i64,
    pub author_name: String,
    pub author_address: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedInvestment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub budget: i64,
    pub completed: bool,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub completed_date: String,
    pub contractor: String,
    pub created_at: DateTime<Utc>,
}

/// The set of investments a voting client has liked.
///
/// This lives with the client (cookie or local storage) and is presented on
/// every vote request. The server never stores it; it only keeps the
/// aggregate `likes` counter per investment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterMembership {
    pub voter_token: String,
    #[serde(default)]
    pub liked: BTreeSet<i64>,
}

impl VoterMembership {
    pub fn new(voter_token: impl Into<String>) -> Self {
        Self {
            voter_token: voter_token.into(),
            liked: BTreeSet::new(),
        }
    }

    pub fn has_voted(&self, entry_id: i64) -> bool {
        self.liked.contains(&entry_id)
    }

    /// Returns false if the entry was already remembered.
    pub fn remember(&mut self, entry_id: i64) -> bool {
        self.liked.insert(entry_id)
    }

    /// Returns false if the entry was not remembered.
    pub fn forget(&mut self, entry_id: i64) -> bool {
        self.liked.remove(&entry_id)
    }
}
