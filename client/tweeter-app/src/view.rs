//! Plain-text rendering of the three views

use std::fmt::Write;
use tweeter_common::Post;
use tweeter_feed::FeedSnapshot;
use tweeter_session::SessionSnapshot;

use crate::routes::{nav_items, NavAction, Route};

pub fn navbar(authenticated: bool) -> String {
    nav_items(authenticated)
        .iter()
        .map(|item| match item.action {
            NavAction::Go(route) => format!("[{}]({})", item.label, route.path()),
            NavAction::Logout => format!("[{}](logout)", item.label),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_post(post: &Post, pending: bool) -> String {
    let when = post.created_at.format("%Y-%m-%d %H:%M");
    let marker = if pending { "  (sending...)" } else { "" };
    format!("@{} · {}{}\n  {}", post.author, when, marker, post.content)
}

pub fn render_feed(feed: &FeedSnapshot) -> String {
    let mut out = String::new();

    if let Some(error) = &feed.error {
        let _ = writeln!(out, "! {} (type `dismiss` to hide)", error);
    }
    if feed.loading {
        let _ = writeln!(out, "Loading...");
    }
    if feed.submitting {
        let _ = writeln!(out, "Posting...");
    }

    if feed.posts.is_empty() && !feed.loading {
        let _ = writeln!(out, "No tweets yet.");
    }
    for post in &feed.posts {
        let _ = writeln!(out, "{}", render_post(post, feed.is_pending(post)));
    }

    out
}

pub fn render_profile(session: &SessionSnapshot) -> String {
    let email = session
        .identity
        .as_ref()
        .and_then(|identity| identity.email.as_deref())
        .unwrap_or("-");
    let name = session.display_name.as_deref().unwrap_or("-");

    format!("Email: {}\nDisplay name: {}\n(type `name <new name>` to change it)\n", email, name)
}

pub fn render_login() -> String {
    "Sign in with `login <email> <password>`\n".to_string()
}

/// Full screen for the current route
pub fn render(route: Route, session: &SessionSnapshot, feed: Option<&FeedSnapshot>) -> String {
    let mut out = navbar(session.is_authenticated());
    out.push_str("\n\n");

    match route {
        Route::Feed => match feed {
            Some(feed) => out.push_str(&render_feed(feed)),
            None => out.push_str("Loading...\n"),
        },
        Route::Profile => out.push_str(&render_profile(session)),
        Route::Login => out.push_str(&render_login()),
    }

    out
}
