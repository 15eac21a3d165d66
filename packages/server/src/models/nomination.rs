use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nomination {
    pub id: String,
    pub nominator: String,
    pub nominee: String,
    pub created_at: DateTime<Utc>,
    pub closed: bool,
}

impl Nomination {
    pub fn new(nominator: String, nominee: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nominator,
            nominee,
            created_at: Utc::now(),
            closed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub vote: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: u32,
    pub no: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSession {
    pub nomination_id: String,
    pub nominee: String,
    pub votes: Vec<Vote>,
    pub tally: Tally,
    pub finished: bool,
}

impl VoteSession {
    pub fn open(nomination: &Nomination) -> Self {
        Self {
            nomination_id: nomination.id.clone(),
            nominee: nomination.nominee.clone(),
            votes: Vec::new(),
            tally: Tally::default(),
            finished: false,
        }
    }

    pub fn has_voted(&self, seat_id: &str) -> bool {
        self.votes.iter().any(|v| v.voter == seat_id)
    }

    pub fn voted_yes(&self, seat_id: &str) -> bool {
        self.votes.iter().any(|v| v.voter == seat_id && v.vote)
    }

    pub fn record(&mut self, voter: &str, vote: bool) {
        self.votes.push(Vote {
            voter: voter.to_string(),
            vote,
            timestamp: Utc::now(),
        });
        if vote {
            self.tally.yes += 1;
        } else {
            self.tally.no += 1;
        }
    }

    pub fn passes(&self) -> bool {
        self.tally.yes > self.tally.no
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub nomination_id: String,
    pub nominee: String,
    pub tally: Tally,
    pub executed: bool,
}
