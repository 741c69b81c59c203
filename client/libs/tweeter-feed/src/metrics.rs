//! Feed metrics for observability

use prometheus::{IntCounterVec, IntGauge, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<FeedMetricsInner> = OnceLock::new();

struct FeedMetricsInner {
    refreshes: IntCounterVec,
    posts: IntCounterVec,
    pending: IntGauge,
}

impl FeedMetricsInner {
    fn new() -> Self {
        Self {
            refreshes: IntCounterVec::new(
                Opts::new("tweeter_feed_refresh_total", "Feed refreshes by mode and outcome"),
                &["mode", "outcome"],
            )
            .expect("valid metric definition"),
            posts: IntCounterVec::new(
                Opts::new("tweeter_feed_post_total", "Post submissions by outcome"),
                &["outcome"],
            )
            .expect("valid metric definition"),
            pending: IntGauge::new(
                "tweeter_feed_pending_posts",
                "Optimistic posts awaiting confirmation",
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.refreshes.clone()))?;
        registry.register(Box::new(self.posts.clone()))?;
        registry.register(Box::new(self.pending.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static FeedMetricsInner {
    METRICS.get_or_init(FeedMetricsInner::new)
}

/// Feed metrics wrapper
#[derive(Clone, Default)]
pub struct FeedMetrics;

impl FeedMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_refresh(&self, silent: bool, ok: bool) {
        let mode = if silent { "silent" } else { "foreground" };
        let outcome = if ok { "success" } else { "failure" };
        get_metrics()
            .refreshes
            .with_label_values(&[mode, outcome])
            .inc();
    }

    pub fn record_post_started(&self) {
        get_metrics().pending.inc();
    }

    pub fn record_post_settled(&self, ok: bool) {
        let outcome = if ok { "confirmed" } else { "rolled_back" };
        get_metrics().posts.with_label_values(&[outcome]).inc();
        get_metrics().pending.dec();
    }
}
