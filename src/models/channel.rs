use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub channel_id: String,
    pub title: String,
    pub created_date: NaiveDate,
    pub updated_date: NaiveDate,
}

/// Snippet returned by the channel detail endpoint, used to (re)label a
/// channel on registration and on each collection pass.
#[derive(Debug, Clone)]
pub struct ChannelMeta {
    pub title: String,
    pub description: String,
}
