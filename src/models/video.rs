use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Watch lifecycle. Videos are created NEW and promoted to UNWATCHED by the
/// classification sweep; the remaining transitions are user-driven and any
/// of the four states may be set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchStatus {
    New,
    Unwatched,
    Watching,
    Watched,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::New => "NEW",
            WatchStatus::Unwatched => "UNWATCHED",
            WatchStatus::Watching => "WATCHING",
            WatchStatus::Watched => "WATCHED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(WatchStatus::New),
            "UNWATCHED" => Some(WatchStatus::Unwatched),
            "WATCHING" => Some(WatchStatus::Watching),
            "WATCHED" => Some(WatchStatus::Watched),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub status: WatchStatus,
    pub last_seen_at: DateTime<Utc>,
    pub watch_updated_at: DateTime<Utc>,
}

/// Payload from the search/listing API, ready to upsert.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}
