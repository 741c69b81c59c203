//! Tweeter feed store
//!
//! Client-side state for the post feed:
//! - Foreground refresh with loading and error reporting
//! - Optimistic posting with in-place reconciliation or rollback
//! - Silent background polling that never surfaces errors
//! - Prometheus counters for refreshes and writes

mod metrics;
mod state;
mod store;

pub use metrics::FeedMetrics;
pub use state::{FeedSnapshot, LOAD_ERROR_MESSAGE, POST_ERROR_MESSAGE};
pub use store::FeedStore;
