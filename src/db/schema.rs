pub const SCHEMA: &str = r#"
-- keywords table: search rotation registry
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL UNIQUE,
    source TEXT NOT NULL DEFAULT 'seed',
    created_date TEXT NOT NULL,
    updated_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_keywords_updated ON keywords(updated_date);

-- channels table: subscribed channel rotation registry
CREATE TABLE IF NOT EXISTS channels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    created_date TEXT NOT NULL,
    updated_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_channels_updated ON channels(updated_date);

-- videos table: never deleted, removal is modeled by hidden_videos
CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id TEXT NOT NULL UNIQUE,
    channel_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'NEW',
    last_seen_at TEXT NOT NULL,
    watch_updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_published_at ON videos(published_at DESC);
CREATE INDEX IF NOT EXISTS idx_videos_status ON videos(status);

-- video_tags table: externally reported tags only
CREATE TABLE IF NOT EXISTS video_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    collected_date TEXT NOT NULL,
    UNIQUE(video_id, tag)
);

CREATE INDEX IF NOT EXISTS idx_video_tags_tag ON video_tags(tag);

-- hidden_videos table: soft-delete flags, orthogonal to status
CREATE TABLE IF NOT EXISTS hidden_videos (
    video_id TEXT PRIMARY KEY
);
"#;
