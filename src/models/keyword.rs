use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a keyword entered the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSource {
    Seed,
    Manual,
    Tag,
    Ai,
}

impl KeywordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordSource::Seed => "seed",
            KeywordSource::Manual => "manual",
            KeywordSource::Tag => "tag",
            KeywordSource::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seed" => Some(KeywordSource::Seed),
            "manual" => Some(KeywordSource::Manual),
            "tag" => Some(KeywordSource::Tag),
            "ai" => Some(KeywordSource::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,
    pub source: KeywordSource,
    pub created_date: NaiveDate,
    /// Sole fairness signal for rotation: the oldest date goes first,
    /// and marking collected bumps it to today unconditionally.
    pub updated_date: NaiveDate,
}
