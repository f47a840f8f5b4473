use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Channel, Keyword, KeywordSource, NewVideo, Video, WatchStatus};

use super::schema::SCHEMA;

/// Owner of all persisted collection state: the keyword/channel rotation
/// registry, the video/tag store and the hidden-video flags.
pub struct ScheduleStore {
    conn: Connection,
}

impl ScheduleStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Ok(Self { conn })
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Ok(Self { conn })
    }

    /// Apply the schema. Run once at process startup, deliberately not part
    /// of `open` so connection construction stays cheap and side-effect free.
    pub async fn migrate(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Keyword rotation

    /// Insert the seed keyword scheduled as already-due. No-op when the
    /// keyword exists, so calling this on every tick never resets an
    /// in-progress rotation.
    pub async fn ensure_seed(&self, keyword: &str) -> Result<()> {
        self.insert_keyword(keyword, KeywordSource::Seed).await
    }

    /// Register a user-entered keyword, scheduled as already-due.
    pub async fn add_keyword(&self, keyword: &str) -> Result<()> {
        self.insert_keyword(keyword, KeywordSource::Manual).await
    }

    async fn insert_keyword(&self, keyword: &str, source: KeywordSource) -> Result<()> {
        let keyword = keyword.trim().to_lowercase();
        let today = today();
        let due = yesterday(today);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO keywords (keyword, source, created_date, updated_date)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![keyword, source.as_str(), today.to_string(), due.to_string()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// The single most overdue keyword, or None when every keyword has
    /// already been collected today. Ties break by insertion order.
    pub async fn due_keyword(&self) -> Result<Option<String>> {
        let today = today().to_string();
        let keyword = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT keyword FROM keywords WHERE updated_date < ?1
                     ORDER BY updated_date ASC, id ASC LIMIT 1",
                )?;
                let mut rows = stmt.query_map(params![today], |row| row.get::<_, String>(0))?;
                Ok(rows.next().transpose()?)
            })
            .await?;
        Ok(keyword)
    }

    /// Advance the rotation for this keyword unconditionally, even when the
    /// fetch returned nothing: a permanently failing keyword must not
    /// monopolize future ticks.
    pub async fn mark_keyword_collected(&self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim().to_lowercase();
        let today = today().to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE keywords SET updated_date = ?1 WHERE keyword = ?2",
                    params![today, keyword],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Hide every video matching the keyword's listing predicate, then drop
    /// the keyword from the rotation.
    pub async fn delete_keyword(&self, keyword: &str) -> Result<()> {
        let kw = keyword.trim().to_lowercase();
        self.hide_by_keyword(&kw).await?;
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM keywords WHERE keyword = ?1", params![kw])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn active_keywords(&self, limit: u32) -> Result<Vec<Keyword>> {
        let keywords = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, keyword, source, created_date, updated_date FROM keywords
                     ORDER BY updated_date DESC, id DESC LIMIT ?1",
                )?;
                let keywords = stmt
                    .query_map(params![limit], |row| Ok(keyword_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(keywords)
            })
            .await?;
        Ok(keywords)
    }

    // Channel rotation

    /// Register a channel scheduled as already-due; no-op when it exists.
    pub async fn add_channel(&self, channel_id: &str, title: &str) -> Result<()> {
        let channel_id = channel_id.trim().to_string();
        let title = title.trim().to_string();
        let today = today();
        let due = yesterday(today);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO channels (channel_id, title, created_date, updated_date)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![channel_id, title, today.to_string(), due.to_string()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Refresh the label only; rotation state is untouched.
    pub async fn rename_channel(&self, channel_id: &str, title: &str) -> Result<()> {
        let channel_id = channel_id.to_string();
        let title = title.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE channels SET title = ?1 WHERE channel_id = ?2",
                    params![title, channel_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn delete_channel(&self, channel_id: &str) -> Result<()> {
        let channel_id = channel_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM channels WHERE channel_id = ?1", params![channel_id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn due_channel(&self) -> Result<Option<Channel>> {
        let today = today().to_string();
        let channel = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, channel_id, title, created_date, updated_date FROM channels
                     WHERE updated_date < ?1 ORDER BY updated_date ASC, id ASC LIMIT 1",
                )?;
                let mut rows = stmt.query_map(params![today], |row| Ok(channel_from_row(row)))?;
                Ok(rows.next().transpose()?)
            })
            .await?;
        Ok(channel)
    }

    pub async fn mark_channel_collected(&self, channel_id: &str) -> Result<()> {
        let channel_id = channel_id.to_string();
        let today = today().to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE channels SET updated_date = ?1 WHERE channel_id = ?2",
                    params![today, channel_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        let channels = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, channel_id, title, created_date, updated_date FROM channels
                     ORDER BY title",
                )?;
                let channels = stmt
                    .query_map([], |row| Ok(channel_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(channels)
            })
            .await?;
        Ok(channels)
    }

    // Video operations

    /// Insert-or-update keyed by video id. A re-sighting refreshes only
    /// title, description, published_at and last_seen_at; status and
    /// watch_updated_at belong to user actions and the classification sweep.
    pub async fn upsert_video(&self, video: NewVideo) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO videos (video_id, channel_id, title, description, published_at, status, last_seen_at, watch_updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, 'NEW', ?6, ?6)
                       ON CONFLICT(video_id) DO UPDATE SET
                           title = excluded.title,
                           description = excluded.description,
                           published_at = excluded.published_at,
                           last_seen_at = excluded.last_seen_at"#,
                    params![
                        video.video_id,
                        video.channel_id,
                        video.title,
                        video.description,
                        video.published_at.to_rfc3339(),
                        now,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Persist externally reported tags for a video. Tags are trimmed,
    /// lowercased, required to be at least two characters and deduplicated;
    /// each persisted tag also registers or refreshes a source=tag keyword.
    pub async fn save_tags(&self, video_id: &str, tags: &[String]) -> Result<()> {
        let video_id = video_id.to_string();
        let tags = normalize_tags(tags);
        let today = today().to_string();
        self.conn
            .call(move |conn| {
                for tag in &tags {
                    conn.execute(
                        r#"INSERT INTO video_tags (video_id, tag, collected_date)
                           VALUES (?1, ?2, ?3)
                           ON CONFLICT(video_id, tag) DO UPDATE SET
                               collected_date = excluded.collected_date"#,
                        params![video_id, tag, today],
                    )?;
                    conn.execute(
                        r#"INSERT INTO keywords (keyword, source, created_date, updated_date)
                           VALUES (?1, 'tag', ?2, ?2)
                           ON CONFLICT(keyword) DO UPDATE SET
                               updated_date = excluded.updated_date"#,
                        params![tag, today],
                    )?;
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Register extractor-derived keywords (source=ai). These feed the
    /// search rotation but never become per-video tags.
    pub async fn save_ai_keywords(&self, words: &[String]) -> Result<()> {
        let words = normalize_tags(words);
        let today = today().to_string();
        self.conn
            .call(move |conn| {
                for word in &words {
                    conn.execute(
                        r#"INSERT INTO keywords (keyword, source, created_date, updated_date)
                           VALUES (?1, 'ai', ?2, ?2)
                           ON CONFLICT(keyword) DO UPDATE SET
                               updated_date = excluded.updated_date"#,
                        params![word, today],
                    )?;
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Direct status transition; every combination of the four states is
    /// legal. Bumps watch_updated_at.
    pub async fn set_status(&self, video_id: &str, status: WatchStatus) -> Result<()> {
        let video_id = video_id.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE videos SET status = ?1, watch_updated_at = ?2 WHERE video_id = ?3",
                    params![status.as_str(), now, video_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Hiding (soft delete)

    pub async fn hide(&self, video_id: &str) -> Result<()> {
        let video_id = video_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO hidden_videos (video_id) VALUES (?1)",
                    params![video_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Hide every video carrying the (normalized) tag.
    pub async fn hide_by_tag(&self, tag: &str) -> Result<()> {
        let tag = tag.trim().to_lowercase();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO hidden_videos (video_id)
                     SELECT DISTINCT video_id FROM video_tags WHERE tag = ?1",
                    params![tag],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Hide every video the listing predicate would match for this keyword:
    /// substring over title or any tag, case-insensitive.
    pub async fn hide_by_keyword(&self, keyword: &str) -> Result<()> {
        let kw = keyword.trim().to_lowercase();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT OR IGNORE INTO hidden_videos (video_id)
                       SELECT DISTINCT v.video_id FROM videos v
                       WHERE lower(v.title) LIKE '%' || ?1 || '%'
                          OR EXISTS (SELECT 1 FROM video_tags t
                                     WHERE t.video_id = v.video_id AND t.tag LIKE '%' || ?1 || '%')"#,
                    params![kw],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Listing

    /// Filtered listing. The query matches a case-insensitive substring of
    /// the title or any tag; an UNWATCHED status filter also admits NEW
    /// (an unclassified item behaves as unwatched to the consumer); hidden
    /// videos are excluded unconditionally. Ordered by published_at
    /// descending, ties by status rank.
    pub async fn list_videos(
        &self,
        query: &str,
        status: Option<WatchStatus>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Video>> {
        let query = query.trim().to_lowercase();
        let status = status.map(|s| s.as_str()).unwrap_or("").to_string();
        let limit = limit.map(i64::from).unwrap_or(-1);
        let offset = i64::from(offset.unwrap_or(0));
        let videos = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT v.id, v.video_id, v.channel_id, v.title, v.description,
                              v.published_at, v.status, v.last_seen_at, v.watch_updated_at
                       FROM videos v
                       WHERE {VIDEO_FILTER}
                       ORDER BY v.published_at DESC,
                                CASE v.status
                                    WHEN 'NEW' THEN 0
                                    WHEN 'UNWATCHED' THEN 1
                                    WHEN 'WATCHING' THEN 2
                                    ELSE 3
                                END
                       LIMIT ?3 OFFSET ?4"#,
                ))?;
                let videos = stmt
                    .query_map(params![query, status, limit, offset], |row| {
                        Ok(video_from_row(row))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(videos)
            })
            .await?;
        Ok(videos)
    }

    pub async fn count_videos(&self, query: &str, status: Option<WatchStatus>) -> Result<i64> {
        let query = query.trim().to_lowercase();
        let status = status.map(|s| s.as_str()).unwrap_or("").to_string();
        let count = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM videos v WHERE {VIDEO_FILTER}"),
                    params![query, status],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    /// Everything still awaiting classification, oldest-inserted first.
    pub async fn new_videos(&self) -> Result<Vec<Video>> {
        let videos = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, video_id, channel_id, title, description,
                              published_at, status, last_seen_at, watch_updated_at
                       FROM videos WHERE status = 'NEW' ORDER BY id ASC"#,
                )?;
                let videos = stmt
                    .query_map([], |row| Ok(video_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(videos)
            })
            .await?;
        Ok(videos)
    }

    pub async fn video_tags(&self, video_id: &str) -> Result<Vec<String>> {
        let video_id = video_id.to_string();
        let tags = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT tag FROM video_tags WHERE video_id = ?1 ORDER BY tag")?;
                let tags = stmt
                    .query_map(params![video_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(tags)
            })
            .await?;
        Ok(tags)
    }

    /// Sorted distinct union of keywords and tags, for search suggestions.
    pub async fn suggest_words(&self) -> Result<Vec<String>> {
        let words = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT keyword FROM keywords UNION SELECT tag FROM video_tags ORDER BY 1",
                )?;
                let words = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(words)
            })
            .await?;
        Ok(words)
    }

    // Maintenance

    /// Rewind every keyword's and channel's updated_date to yesterday so the
    /// whole registry is due on the next tick. Bootstrap/recovery only.
    pub async fn reset_due(&self) -> Result<(usize, usize)> {
        let due = yesterday(today()).to_string();
        let counts = self
            .conn
            .call(move |conn| {
                let keywords =
                    conn.execute("UPDATE keywords SET updated_date = ?1", params![due])?;
                let channels =
                    conn.execute("UPDATE channels SET updated_date = ?1", params![due])?;
                Ok((keywords, channels))
            })
            .await?;
        Ok(counts)
    }
}

/// Shared WHERE clause for list/count/hide-by-keyword parity:
/// ?1 = lowercased query substring ('' matches all),
/// ?2 = status filter ('' matches all, UNWATCHED also admits NEW).
const VIDEO_FILTER: &str = r#"(?1 = '' OR lower(v.title) LIKE '%' || ?1 || '%'
           OR EXISTS (SELECT 1 FROM video_tags t
                      WHERE t.video_id = v.video_id AND t.tag LIKE '%' || ?1 || '%'))
      AND (?2 = '' OR v.status = ?2 OR (?2 = 'UNWATCHED' AND v.status = 'NEW'))
      AND NOT EXISTS (SELECT 1 FROM hidden_videos h WHERE h.video_id = v.video_id)"#;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.chars().count() >= 2 && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn keyword_from_row(row: &Row) -> Keyword {
    Keyword {
        id: row.get(0).unwrap(),
        keyword: row.get(1).unwrap(),
        source: KeywordSource::parse(&row.get::<_, String>(2).unwrap())
            .unwrap_or(KeywordSource::Seed),
        created_date: parse_date(&row.get::<_, String>(3).unwrap()).unwrap_or_else(today),
        updated_date: parse_date(&row.get::<_, String>(4).unwrap()).unwrap_or_else(today),
    }
}

fn channel_from_row(row: &Row) -> Channel {
    Channel {
        id: row.get(0).unwrap(),
        channel_id: row.get(1).unwrap(),
        title: row.get(2).unwrap(),
        created_date: parse_date(&row.get::<_, String>(3).unwrap()).unwrap_or_else(today),
        updated_date: parse_date(&row.get::<_, String>(4).unwrap()).unwrap_or_else(today),
    }
}

fn video_from_row(row: &Row) -> Video {
    Video {
        id: row.get(0).unwrap(),
        video_id: row.get(1).unwrap(),
        channel_id: row.get(2).unwrap(),
        title: row.get(3).unwrap(),
        description: row.get(4).unwrap(),
        published_at: parse_datetime(&row.get::<_, String>(5).unwrap())
            .unwrap_or_else(Utc::now),
        status: WatchStatus::parse(&row.get::<_, String>(6).unwrap())
            .unwrap_or(WatchStatus::New),
        last_seen_at: parse_datetime(&row.get::<_, String>(7).unwrap())
            .unwrap_or_else(Utc::now),
        watch_updated_at: parse_datetime(&row.get::<_, String>(8).unwrap())
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn store() -> ScheduleStore {
        let store = ScheduleStore::open_in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn video(id: &str, title: &str) -> NewVideo {
        NewVideo {
            video_id: id.to_string(),
            channel_id: "UC123".to_string(),
            title: title.to_string(),
            description: String::new(),
            published_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn seed_is_due_and_conflict_preserves_rotation() {
        let store = store().await;
        store.ensure_seed("it").await.unwrap();
        assert_eq!(store.due_keyword().await.unwrap(), Some("it".to_string()));

        store.mark_keyword_collected("it").await.unwrap();
        assert_eq!(store.due_keyword().await.unwrap(), None);

        // Re-seeding must not rewind the rotation.
        store.ensure_seed("it").await.unwrap();
        assert_eq!(store.due_keyword().await.unwrap(), None);
    }

    #[tokio::test]
    async fn rotation_is_fair_round_robin() {
        let store = store().await;
        for kw in ["alpha", "beta", "gamma", "delta"] {
            store.ensure_seed(kw).await.unwrap();
        }

        let mut selected = Vec::new();
        for _ in 0..4 {
            let kw = store.due_keyword().await.unwrap().expect("a keyword is due");
            store.mark_keyword_collected(&kw).await.unwrap();
            selected.push(kw);
        }

        // Each keyword selected exactly once, in insertion order, then none due.
        assert_eq!(selected, vec!["alpha", "beta", "gamma", "delta"]);
        assert_eq!(store.due_keyword().await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_preserves_status() {
        let store = store().await;
        store.upsert_video(video("v1", "Rust streams")).await.unwrap();
        store.set_status("v1", WatchStatus::Watched).await.unwrap();

        let before = store.list_videos("", None, None, None).await.unwrap();
        let watch_updated_at = before[0].watch_updated_at;

        let mut again = video("v1", "Rust streams");
        again.description = "updated description".to_string();
        store.upsert_video(again).await.unwrap();

        let videos = store.list_videos("", None, None, None).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].status, WatchStatus::Watched);
        assert_eq!(videos[0].description, "updated description");
        assert_eq!(videos[0].watch_updated_at, watch_updated_at);
    }

    #[tokio::test]
    async fn tags_are_normalized_and_register_keywords() {
        let store = store().await;
        store.upsert_video(video("v1", "Intro")).await.unwrap();
        store
            .save_tags(
                "v1",
                &[
                    "Python".to_string(),
                    "  AI ".to_string(),
                    "a".to_string(),
                    "python".to_string(),
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.video_tags("v1").await.unwrap(), vec!["ai", "python"]);

        let keywords = store.active_keywords(10).await.unwrap();
        let tagged: Vec<_> = keywords
            .iter()
            .filter(|k| k.source == KeywordSource::Tag)
            .map(|k| k.keyword.as_str())
            .collect();
        assert!(tagged.contains(&"python"));
        assert!(tagged.contains(&"ai"));
    }

    #[tokio::test]
    async fn hidden_videos_never_listed() {
        let store = store().await;
        store.upsert_video(video("v1", "kept")).await.unwrap();
        store.upsert_video(video("v2", "hidden")).await.unwrap();
        store.hide("v2").await.unwrap();

        for (query, status) in [
            ("", None),
            ("hidden", None),
            ("", Some(WatchStatus::Unwatched)),
            ("hidden", Some(WatchStatus::New)),
        ] {
            let videos = store.list_videos(query, status, None, None).await.unwrap();
            assert!(videos.iter().all(|v| v.video_id != "v2"));
            let count = store.count_videos(query, status).await.unwrap();
            assert_eq!(count, videos.len() as i64);
        }
    }

    #[tokio::test]
    async fn unwatched_filter_includes_new() {
        let store = store().await;
        store.upsert_video(video("v1", "new one")).await.unwrap();
        store.upsert_video(video("v2", "unwatched one")).await.unwrap();
        store.upsert_video(video("v3", "watched one")).await.unwrap();
        store.set_status("v2", WatchStatus::Unwatched).await.unwrap();
        store.set_status("v3", WatchStatus::Watched).await.unwrap();

        let videos = store
            .list_videos("", Some(WatchStatus::Unwatched), None, None)
            .await
            .unwrap();
        let ids: Vec<_> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"v1"));
        assert!(ids.contains(&"v2"));
    }

    #[tokio::test]
    async fn query_matches_title_or_tag() {
        let store = store().await;
        store.upsert_video(video("v1", "Advanced Rust Patterns")).await.unwrap();
        store.upsert_video(video("v2", "Cooking show")).await.unwrap();
        store.save_tags("v2", &["rustlang".to_string()]).await.unwrap();
        store.upsert_video(video("v3", "Gardening")).await.unwrap();

        let videos = store.list_videos("RUST", None, None, None).await.unwrap();
        let ids: Vec<_> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"v1"));
        assert!(ids.contains(&"v2"));
        assert_eq!(store.count_videos("rust", None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_keyword_hides_matching_videos() {
        let store = store().await;
        store.add_keyword("foo").await.unwrap();
        store.upsert_video(video("v1", "foo tutorial")).await.unwrap();
        store.upsert_video(video("v2", "all about FOO")).await.unwrap();
        store.upsert_video(video("v3", "unrelated")).await.unwrap();
        store.save_tags("v3", &["foobar".to_string()]).await.unwrap();

        store.delete_keyword("foo").await.unwrap();

        let videos = store.list_videos("", None, None, None).await.unwrap();
        assert!(videos.is_empty());
        assert_eq!(store.count_videos("", None).await.unwrap(), 0);
        assert_eq!(store.due_keyword().await.unwrap(), None);
    }

    #[tokio::test]
    async fn hide_by_tag_is_exact_match() {
        let store = store().await;
        store.upsert_video(video("v1", "one")).await.unwrap();
        store.upsert_video(video("v2", "two")).await.unwrap();
        store.save_tags("v1", &["docker".to_string()]).await.unwrap();
        store.save_tags("v2", &["dockerfile".to_string()]).await.unwrap();

        store.hide_by_tag(" Docker ").await.unwrap();

        let ids: Vec<_> = store
            .list_videos("", None, None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec!["v2"]);
    }

    #[tokio::test]
    async fn ordering_published_desc_then_status_rank() {
        let store = store().await;
        let mut older = video("v1", "older");
        older.published_at = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        store.upsert_video(older).await.unwrap();

        // Same timestamp, different status rank.
        store.upsert_video(video("v2", "tied watched")).await.unwrap();
        store.upsert_video(video("v3", "tied new")).await.unwrap();
        store.set_status("v2", WatchStatus::Watched).await.unwrap();

        let ids: Vec<_> = store
            .list_videos("", None, None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec!["v3", "v2", "v1"]);
    }

    #[tokio::test]
    async fn pagination_limits_and_offsets() {
        let store = store().await;
        for i in 0..5u32 {
            let mut v = video(&format!("v{i}"), &format!("video {i}"));
            v.published_at = Utc.with_ymd_and_hms(2026, 8, 1, i, 0, 0).unwrap();
            store.upsert_video(v).await.unwrap();
        }

        let page = store.list_videos("", None, Some(2), Some(2)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v1"]);
        assert_eq!(store.count_videos("", None).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn channel_rotation_round_robin() {
        let store = store().await;
        store.add_channel("UCa", "Channel A").await.unwrap();
        store.add_channel("UCb", "Channel B").await.unwrap();

        let first = store.due_channel().await.unwrap().expect("due channel");
        assert_eq!(first.channel_id, "UCa");
        store.mark_channel_collected(&first.channel_id).await.unwrap();

        let second = store.due_channel().await.unwrap().expect("due channel");
        assert_eq!(second.channel_id, "UCb");
        store.mark_channel_collected(&second.channel_id).await.unwrap();

        assert!(store.due_channel().await.unwrap().is_none());

        // Registering again must not make it due.
        store.add_channel("UCa", "Channel A").await.unwrap();
        assert!(store.due_channel().await.unwrap().is_none());

        store.rename_channel("UCa", "Channel A (renamed)").await.unwrap();
        let channels = store.list_channels().await.unwrap();
        assert_eq!(channels[0].title, "Channel A (renamed)");
    }

    #[tokio::test]
    async fn reset_due_rewinds_everything() {
        let store = store().await;
        store.ensure_seed("it").await.unwrap();
        store.add_channel("UCa", "Channel A").await.unwrap();
        store.mark_keyword_collected("it").await.unwrap();
        store.mark_channel_collected("UCa").await.unwrap();
        assert!(store.due_keyword().await.unwrap().is_none());
        assert!(store.due_channel().await.unwrap().is_none());

        let (keywords, channels) = store.reset_due().await.unwrap();
        assert_eq!((keywords, channels), (1, 1));
        assert!(store.due_keyword().await.unwrap().is_some());
        assert!(store.due_channel().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn suggest_words_unions_keywords_and_tags() {
        let store = store().await;
        store.add_keyword("zig").await.unwrap();
        store.upsert_video(video("v1", "one")).await.unwrap();
        store.save_tags("v1", &["ada".to_string()]).await.unwrap();

        let words = store.suggest_words().await.unwrap();
        assert_eq!(words, vec!["ada", "zig"]);
    }

    #[tokio::test]
    async fn new_videos_oldest_first() {
        let store = store().await;
        store.upsert_video(video("v1", "first")).await.unwrap();
        store.upsert_video(video("v2", "second")).await.unwrap();
        store.upsert_video(video("v3", "third")).await.unwrap();
        store.set_status("v2", WatchStatus::Watched).await.unwrap();

        let ids: Vec<_> = store
            .new_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec!["v1", "v3"]);
    }

    #[tokio::test]
    async fn full_collection_pass_for_one_keyword() {
        // Two pages worth of results (30 + 20 items) for keyword "ai".
        let store = store().await;
        store.ensure_seed("ai").await.unwrap();
        let keyword = store.due_keyword().await.unwrap().unwrap();

        for i in 0..50 {
            store
                .upsert_video(video(&format!("v{i}"), &format!("ai video {i}")))
                .await
                .unwrap();
        }
        store.mark_keyword_collected(&keyword).await.unwrap();

        assert_eq!(store.count_videos("", None).await.unwrap(), 50);
        assert_eq!(store.due_keyword().await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videos.db").to_string_lossy().to_string();

        {
            let store = ScheduleStore::open(&path).await.unwrap();
            store.migrate().await.unwrap();
            store.upsert_video(video("v1", "kept")).await.unwrap();
        }

        let store = ScheduleStore::open(&path).await.unwrap();
        store.migrate().await.unwrap();
        assert_eq!(store.count_videos("", None).await.unwrap(), 1);
    }
}
