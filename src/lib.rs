//! Tweeter client libraries
//!
//! Umbrella crate re-exporting the workspace libraries for the end-to-end
//! tests under `tests/`.

pub use tweeter_backend as backend;
pub use tweeter_common as common;
pub use tweeter_feed as feed;
pub use tweeter_session as session;
