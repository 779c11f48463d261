//! Live dashboard: polls stats and follows the review list until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use review_core::Review;
use review_data::ReviewStats;
use review_sync::{DashboardSession, SessionConfig, StreamPhase, StreamSnapshot};

use super::WatchArgs;
use crate::context::Context;

/// One line of `--json` watch output.
#[derive(Serialize)]
struct WatchEvent<'a, T: Serialize + ?Sized> {
    stream: &'static str,
    phase: StreamPhase,
    seq: u64,
    loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}

impl<'a, T: Serialize + ?Sized> WatchEvent<'a, T> {
    fn new<S>(stream: &'static str, snap: &StreamSnapshot<S>, data: Option<&'a T>) -> Self {
        Self {
            stream,
            phase: snap.phase,
            seq: snap.seq,
            loading: snap.loading,
            error: snap.last_error.as_ref().map(|e| e.to_string()),
            data,
        }
    }
}

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let criteria = args.filter.criteria()?;
    let interval = args.interval.unwrap_or(ctx.config.refresh.poll_interval_secs).max(1);
    let config = SessionConfig::new(Duration::from_secs(interval)).with_granularity(args.granularity);

    let session = DashboardSession::with_criteria(Arc::new(ctx.source()?), config, criteria);
    let mut stats_rx = session.subscribe_stats();
    let mut reviews_rx = session.subscribe_reviews();

    ctx.output.info(&format!(
        "Watching {} (stats every {}s, Ctrl-C to stop)",
        ctx.config.api.base_url, interval
    ));
    session.attach();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut alerting = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = stats_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = stats_rx.borrow_and_update().clone();
                show_stats(ctx, &session, &snap, &mut alerting).await;
            }
            changed = reviews_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = reviews_rx.borrow_and_update().clone();
                show_reviews(ctx, &snap);
            }
        }
    }

    session.detach();

    let metrics = session.metrics();
    if ctx.output.is_json() {
        ctx.output.json_line(&metrics);
    } else {
        ctx.output.info("");
        ctx.output.info(&metrics.stats.to_summary());
        ctx.output.info(&metrics.reviews.to_summary());
    }
    Ok(())
}

async fn show_stats(
    ctx: &Context,
    session: &DashboardSession,
    snap: &StreamSnapshot<ReviewStats>,
    alerting: &mut bool,
) {
    if ctx.output.is_json() {
        ctx.output.json_line(&WatchEvent::new("stats", snap, snap.data.as_ref()));
        return;
    }

    match snap.phase {
        StreamPhase::Fetching | StreamPhase::Idle => {
            ctx.output.debug(&format!("stats fetch #{} issued", snap.seq));
        }
        StreamPhase::Failed => {
            if let Some(e) = &snap.last_error {
                ctx.output.warn(&format!("[{}] stats refresh failed: {}", now(), e));
            }
        }
        StreamPhase::Settled => match session.dashboard().await {
            Some(Ok(metrics)) => {
                ctx.output.info(&format!(
                    "[{}] {} reviews, {}% positive, {}% negative, avg {:.1}",
                    now(),
                    metrics.total_reviews,
                    metrics.positive_percentage,
                    metrics.negative_percentage,
                    metrics.average_rating
                ));
                let threshold = ctx.config.thresholds.negative_threshold;
                let alert = metrics.negative_alert(threshold);
                if alert && !*alerting {
                    ctx.output.warn(&format!(
                        "Negative reviews above {}% ({}%)",
                        threshold, metrics.negative_percentage
                    ));
                } else if !alert && *alerting {
                    ctx.output.success("Negative reviews back under threshold");
                }
                *alerting = alert;
            }
            Some(Err(e)) => ctx.output.warn(&format!("[{}] dashboard unavailable: {}", now(), e)),
            None => {}
        },
    }
}

fn show_reviews(ctx: &Context, snap: &StreamSnapshot<Arc<[Review]>>) {
    if ctx.output.is_json() {
        ctx.output.json_line(&WatchEvent::new("reviews", snap, snap.data.as_deref()));
        return;
    }

    match snap.phase {
        StreamPhase::Fetching | StreamPhase::Idle => {
            ctx.output.debug(&format!("reviews fetch #{} issued", snap.seq));
        }
        StreamPhase::Failed => {
            if let Some(e) = &snap.last_error {
                ctx.output.warn(&format!("[{}] review list refresh failed: {}", now(), e));
            }
        }
        StreamPhase::Settled => {
            let count = snap.data.as_ref().map_or(0, |reviews| reviews.len());
            ctx.output.info(&format!("[{}] {} reviews match the filters", now(), count));
        }
    }
}

fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
