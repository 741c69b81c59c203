//! Shared data models for the Tweeter client
//!
//! Field names on the wire follow the hosted `Tweets` table:
//! `id`, `content`, `userName`, `date`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Prefix carried by every client-generated placeholder id
pub const TEMP_ID_PREFIX: &str = "tmp-";

// ============================================================================
// POSTS
// ============================================================================

/// A post as shown in the feed, either confirmed by the backend or pending
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub content: String,
    #[serde(rename = "userName")]
    pub author: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Build a pending post from a draft and a placeholder id
    pub fn pending(draft: &PostDraft, temp_id: String) -> Self {
        Self {
            id: temp_id,
            content: draft.content.clone(),
            author: draft.author.clone(),
            created_at: draft.created_at,
        }
    }
}

/// Body of a create request; the backend assigns the id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub content: String,
    #[serde(rename = "userName")]
    pub author: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

impl PostDraft {
    /// Draft stamped with the current time
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
            created_at: Utc::now(),
        }
    }
}

/// Allocate a unique placeholder id for an optimistic post
pub fn new_temporary_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
}

/// Table ids come back as JSON numbers (int8) or strings (uuid/text)
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

// ============================================================================
// AUTH
// ============================================================================

/// Authenticated user reference as reported by the auth provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    /// Default display name: email local part, or the id when no email
    pub fn default_display_name(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.clone())
    }
}

/// An authenticated session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_post_decodes_numeric_and_text_ids() {
        let numeric: Post = serde_json::from_str(
            r#"{"id":42,"content":"hello","userName":"alice","date":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(numeric.id, "42");
        assert_eq!(numeric.author, "alice");
        assert_eq!(
            numeric.created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );

        let text: Post = serde_json::from_str(
            r#"{"id":"abc","content":"hi","userName":"bob","date":"2024-01-01T00:00:00.000+00:00"}"#,
        )
        .unwrap();
        assert_eq!(text.id, "abc");
    }

    #[test]
    fn test_draft_wire_names() {
        let draft = PostDraft::new("hello", "alice");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["content"], "hello");
        assert_eq!(json["userName"], "alice");
        assert!(json.get("date").is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_temporary_ids_are_distinct() {
        let a = new_temporary_id();
        let b = new_temporary_id();
        assert_ne!(a, b);
        assert!(a.starts_with(TEMP_ID_PREFIX));
    }

    #[test]
    fn test_pending_post_copies_draft() {
        let draft = PostDraft::new("hello", "alice");
        let post = Post::pending(&draft, new_temporary_id());
        assert!(post.id.starts_with(TEMP_ID_PREFIX));
        assert_eq!(post.content, "hello");
        assert_eq!(post.created_at, draft.created_at);
    }

    #[test]
    fn test_default_display_name() {
        let identity = Identity {
            id: "u-1".into(),
            email: Some("alice@example.com".into()),
        };
        assert_eq!(identity.default_display_name(), "alice");

        let no_email = Identity {
            id: "u-2".into(),
            email: None,
        };
        assert_eq!(no_email.default_display_name(), "u-2");
    }
}
