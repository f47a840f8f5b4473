use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ai::{Extractor, TagSource};
use crate::db::ScheduleStore;
use crate::error::Result;
use crate::models::{NewVideo, WatchStatus};
use crate::youtube::YoutubeClient;

/// Process-wide reentrancy guard: at most one collection tick runs at a
/// time, and a trigger arriving mid-tick is a silent no-op, never queued.
pub struct TickGuard {
    running: AtomicBool,
}

impl TickGuard {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn release(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for TickGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone)]
pub struct TickSummary {
    /// Due keyword collected this tick and how many videos it yielded.
    pub keyword: Option<(String, usize)>,
    /// Due channel collected this tick and how many videos it yielded.
    pub channel: Option<(String, usize)>,
}

/// Composes store, fetcher and extractor into one rotation tick: pick due
/// work, fetch, persist, extract; plus the separate classification sweep.
pub struct Collector {
    store: Arc<ScheduleStore>,
    youtube: YoutubeClient,
    extractor: Extractor,
    guard: TickGuard,
    seed_keyword: String,
    page_size: u32,
    max_pages: Option<u32>,
}

impl Collector {
    pub fn new(
        store: Arc<ScheduleStore>,
        youtube: YoutubeClient,
        extractor: Extractor,
        seed_keyword: String,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            store,
            youtube,
            extractor,
            guard: TickGuard::new(),
            seed_keyword,
            page_size,
            max_pages,
        }
    }

    /// One guarded rotation tick. Returns None when another tick is
    /// already in progress. Store errors propagate; fetch and AI errors
    /// never do.
    pub async fn run_tick(&self) -> Result<Option<TickSummary>> {
        if !self.guard.try_acquire() {
            tracing::debug!("collection tick already running, skipping trigger");
            return Ok(None);
        }
        let result = self.tick_inner().await;
        self.guard.release();
        result.map(Some)
    }

    async fn tick_inner(&self) -> Result<TickSummary> {
        self.store.ensure_seed(&self.seed_keyword).await?;

        let mut summary = TickSummary::default();

        // Keyword and channel halves of the rotation are independent;
        // either may have nothing due.
        if let Some(keyword) = self.store.due_keyword().await? {
            let count = self.collect_keyword(&keyword).await?;
            self.store.mark_keyword_collected(&keyword).await?;
            if count == 0 {
                tracing::warn!("keyword '{}' yielded no videos; rotation advanced anyway", keyword);
            } else {
                tracing::info!("collected {} videos for keyword '{}'", count, keyword);
            }
            summary.keyword = Some((keyword, count));
        } else {
            tracing::info!("no keyword due for collection");
        }

        if let Some(channel) = self.store.due_channel().await? {
            let count = self.collect_channel(&channel.channel_id).await?;
            self.store.mark_channel_collected(&channel.channel_id).await?;
            if count == 0 {
                tracing::warn!(
                    "channel '{}' yielded no videos; rotation advanced anyway",
                    channel.channel_id
                );
            } else {
                tracing::info!("collected {} videos for channel '{}'", count, channel.channel_id);
            }
            summary.channel = Some((channel.channel_id, count));
        } else {
            tracing::info!("no channel due for collection");
        }

        Ok(summary)
    }

    async fn collect_keyword(&self, keyword: &str) -> Result<usize> {
        let videos = self
            .youtube
            .search_by_keyword(keyword, self.page_size, self.max_pages)
            .await;
        let count = videos.len();
        for video in videos {
            self.ingest(video).await?;
        }
        Ok(count)
    }

    async fn collect_channel(&self, channel_id: &str) -> Result<usize> {
        if let Some(meta) = self.youtube.channel_meta(channel_id).await {
            self.store.rename_channel(channel_id, &meta.title).await?;
        }

        let videos = self
            .youtube
            .latest_by_channel(channel_id, self.page_size, self.max_pages)
            .await;
        let count = videos.len();
        for video in videos {
            self.ingest(video).await?;
        }
        Ok(count)
    }

    /// Persist one fetched item and run its tags through the extraction
    /// chain. Only externally reported tags become video tags; derived
    /// keywords feed the search rotation instead.
    async fn ingest(&self, video: NewVideo) -> Result<()> {
        let video_id = video.video_id.clone();
        let title = video.title.clone();
        let description = video.description.clone();

        self.store.upsert_video(video).await?;

        let external = self.youtube.item_tags(&video_id).await;
        let extraction = self.extractor.extract(&title, &description, &external).await;
        match extraction.source {
            TagSource::External => self.store.save_tags(&video_id, &extraction.tags).await?,
            TagSource::Ai | TagSource::Heuristic => {
                self.store.save_ai_keywords(&extraction.tags).await?
            }
        }
        Ok(())
    }

    /// Promote every NEW video that classifies as technical (or cannot be
    /// classified) to UNWATCHED. Not gated by tick success.
    pub async fn classify_new_videos(&self) -> Result<usize> {
        let mut promoted = 0;
        for video in self.store.new_videos().await? {
            if self.extractor.is_technical(&video.title, &video.description).await {
                self.store
                    .set_status(&video.video_id, WatchStatus::Unwatched)
                    .await?;
                promoted += 1;
            }
        }
        Ok(promoted)
    }

    /// Fire-and-forget tick plus classification sweep, for interactive
    /// refresh triggers. Overlapping triggers are dropped by the guard.
    pub fn trigger(self: &Arc<Self>) {
        let collector = Arc::clone(self);
        tokio::spawn(async move {
            match collector.run_tick().await {
                Ok(Some(_)) => {
                    if let Err(e) = collector.classify_new_videos().await {
                        tracing::error!("classification sweep failed: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!("collection tick failed: {}", e),
            }
        });
    }
}
