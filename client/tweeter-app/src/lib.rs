//! Terminal front end for Tweeter
//!
//! Wires the backend, the session holder and the feed store behind a small
//! route table, and renders each view as text.

pub mod app;
pub mod command;
pub mod routes;
pub mod telemetry;
pub mod view;

pub use app::App;
pub use command::Command;
pub use routes::{NavAction, NavItem, Resolution, Route};
