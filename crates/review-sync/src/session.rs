//! Dashboard session: owns the criteria model, both refresh streams and the
//! background tasks that feed them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use review_core::{
    build_dashboard, CriteriaModel, DashboardMetrics, FilterCriteria, Review, ReviewId,
    ReviewResult, TrendGranularity,
};
use review_data::{HelpfulAck, RatingAck, ReviewSource, ReviewStats, TextAnalysis};
use review_observability::StreamMetrics;

use crate::stream::{RefreshStream, StreamSnapshot};

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interval between stats refreshes.
    pub poll_interval: Duration,
    /// Trend bucket size for [`DashboardSession::dashboard`].
    pub granularity: TrendGranularity,
}

impl SessionConfig {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            granularity: TrendGranularity::default(),
        }
    }

    pub fn with_granularity(mut self, granularity: TrendGranularity) -> Self {
        self.granularity = granularity;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// Metrics for both streams.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMetrics {
    pub stats: StreamMetrics,
    pub reviews: StreamMetrics,
}

/// A live dashboard view over a [`ReviewSource`].
///
/// Stats are polled on a fixed interval, skipping ticks while the previous
/// poll is outstanding; reviews are refetched whenever the filter criteria
/// change. Each fetch runs as its own task, and only the most
/// recently issued fetch on a stream can update what observers see.
pub struct DashboardSession {
    source: Arc<dyn ReviewSource>,
    criteria: Arc<CriteriaModel>,
    stats: Arc<RefreshStream<ReviewStats>>,
    reviews: Arc<RefreshStream<Arc<[Review]>>>,
    config: SessionConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DashboardSession {
    /// Create a detached session.
    pub fn new(source: Arc<dyn ReviewSource>, config: SessionConfig) -> Self {
        Self::with_criteria(source, config, FilterCriteria::default())
    }

    /// Create a detached session starting from `criteria`.
    pub fn with_criteria(
        source: Arc<dyn ReviewSource>,
        config: SessionConfig,
        criteria: FilterCriteria,
    ) -> Self {
        Self {
            source,
            criteria: Arc::new(CriteriaModel::new(criteria)),
            stats: Arc::new(RefreshStream::new("stats")),
            reviews: Arc::new(RefreshStream::new("reviews")),
            config,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the stats poller and the criteria watcher. Both fetch
    /// immediately. Must be called from within a tokio runtime.
    ///
    /// Attaching an attached session does nothing.
    pub fn attach(&self) {
        let mut tasks = self.lock_tasks();
        if !tasks.is_empty() {
            return;
        }
        self.stats.attach();
        self.reviews.attach();

        let source = Arc::clone(&self.source);
        let stats = Arc::clone(&self.stats);
        let interval = self.config.poll_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if stats.is_fetching() {
                    debug!("stats fetch still outstanding, skipping tick");
                    continue;
                }
                spawn_stats_fetch(Arc::clone(&source), Arc::clone(&stats));
            }
        }));

        let source = Arc::clone(&self.source);
        let reviews = Arc::clone(&self.reviews);
        let mut criteria_rx = self.criteria.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                let criteria = criteria_rx.borrow_and_update().clone();
                spawn_reviews_fetch(Arc::clone(&source), Arc::clone(&reviews), criteria);
                if criteria_rx.changed().await.is_err() {
                    break;
                }
            }
        }));

        info!(poll_interval_ms = interval.as_millis() as u64, "dashboard session attached");
    }

    /// Stop polling and watching. Fetches still in flight complete as
    /// no-ops.
    pub fn detach(&self) {
        let tasks = std::mem::take(&mut *self.lock_tasks());
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            task.abort();
        }
        self.stats.detach();
        self.reviews.detach();
        info!("dashboard session detached");
    }

    pub fn is_attached(&self) -> bool {
        !self.lock_tasks().is_empty()
    }

    /// The criteria model driving the reviews stream.
    pub fn criteria(&self) -> &CriteriaModel {
        &self.criteria
    }

    /// Fetch stats now and wait for the result. Returns whether it was
    /// applied; a detached session issues nothing and returns `false`.
    pub async fn refresh_stats(&self) -> bool {
        applied(spawn_stats_fetch(Arc::clone(&self.source), Arc::clone(&self.stats))).await
    }

    /// Fetch reviews for the current criteria now and wait for the result.
    /// Returns whether it was applied; a detached session issues nothing
    /// and returns `false`.
    pub async fn refresh_reviews(&self) -> bool {
        applied(self.issue_reviews_fetch()).await
    }

    fn issue_reviews_fetch(&self) -> Option<JoinHandle<bool>> {
        spawn_reviews_fetch(
            Arc::clone(&self.source),
            Arc::clone(&self.reviews),
            self.criteria.current(),
        )
    }

    /// Analyze a single text.
    pub async fn analyze(&self, text: &str, language: &str) -> ReviewResult<TextAnalysis> {
        self.source.analyze_text(text, language).await
    }

    /// Rate a review, then refresh the review list.
    pub async fn rate(&self, review_id: &ReviewId, rating: i64) -> ReviewResult<RatingAck> {
        let ack = self.source.submit_rating(review_id, rating).await?;
        self.issue_reviews_fetch();
        Ok(ack)
    }

    /// Add or withdraw a helpful vote, then refresh the review list.
    pub async fn mark_helpful(&self, review_id: &ReviewId, increment: bool) -> ReviewResult<HelpfulAck> {
        let ack = self.source.mark_helpful(review_id, increment).await?;
        self.issue_reviews_fetch();
        Ok(ack)
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<StreamSnapshot<ReviewStats>> {
        self.stats.subscribe()
    }

    pub fn subscribe_reviews(&self) -> watch::Receiver<StreamSnapshot<Arc<[Review]>>> {
        self.reviews.subscribe()
    }

    pub fn stats_snapshot(&self) -> StreamSnapshot<ReviewStats> {
        self.stats.snapshot()
    }

    pub fn reviews_snapshot(&self) -> StreamSnapshot<Arc<[Review]>> {
        self.reviews.snapshot()
    }

    /// Dashboard metrics from the last settled stats and the whole review
    /// corpus, fetched with default criteria.
    ///
    /// Trend and language shares cover every review, whatever filters the
    /// reviews stream is following. `None` until stats have settled at
    /// least once.
    pub async fn dashboard(&self) -> Option<ReviewResult<DashboardMetrics>> {
        let stats = self.stats.snapshot().data?;
        let corpus = match self.source.fetch_reviews(&FilterCriteria::default()).await {
            Ok(reviews) => reviews,
            Err(e) => return Some(Err(e)),
        };
        Some(build_dashboard(&stats.counts(), &corpus, self.config.granularity))
    }

    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            stats: self.stats.metrics(),
            reviews: self.reviews.metrics(),
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn applied(task: Option<JoinHandle<bool>>) -> bool {
    match task {
        Some(task) => task.await.unwrap_or(false),
        None => false,
    }
}

fn spawn_stats_fetch(
    source: Arc<dyn ReviewSource>,
    stream: Arc<RefreshStream<ReviewStats>>,
) -> Option<JoinHandle<bool>> {
    let ticket = stream.begin()?;
    Some(tokio::spawn(async move {
        let result = source.fetch_stats().await;
        stream.complete(ticket, result)
    }))
}

fn spawn_reviews_fetch(
    source: Arc<dyn ReviewSource>,
    stream: Arc<RefreshStream<Arc<[Review]>>>,
    criteria: FilterCriteria,
) -> Option<JoinHandle<bool>> {
    let ticket = stream.begin()?;
    debug!(seq = ticket.seq(), search = criteria.search_text(), "fetching reviews");
    Some(tokio::spawn(async move {
        let result = source.fetch_reviews(&criteria).await.map(Arc::<[Review]>::from);
        stream.complete(ticket, result)
    }))
}
