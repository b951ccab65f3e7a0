//! Guide and tag models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GuideStatus {
    Draft,
    Published,
}

impl std::fmt::Display for GuideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideStatus::Draft => write!(f, "draft"),
            GuideStatus::Published => write!(f, "published"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Guide row as stored in `guides`. Tags are attached separately.
#[derive(Debug, Clone, FromRow)]
pub struct GuideRow {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub content: String,
    pub status: GuideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Guide {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub content: String,
    pub status: GuideStatus,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guide {
    pub fn from_row(row: GuideRow, tags: Vec<Tag>) -> Self {
        Self {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            content: row.content,
            status: row.status,
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == GuideStatus::Published
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Full guide representation (`GET /api/guides/:id`)
#[derive(Debug, Serialize)]
pub struct GuideResponse {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub content: String,
    pub status: GuideStatus,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Guide> for GuideResponse {
    fn from(g: Guide) -> Self {
        Self {
            id: g.id,
            creator_id: g.creator_id,
            title: g.title,
            content: g.content,
            status: g.status,
            tags: g.tags,
            created_at: rfc3339(g.created_at),
            updated_at: rfc3339(g.updated_at),
        }
    }
}

/// Listing representation, without the content body
#[derive(Debug, Serialize)]
pub struct GuideSummary {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub status: GuideStatus,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Guide> for GuideSummary {
    fn from(g: Guide) -> Self {
        Self {
            id: g.id,
            creator_id: g.creator_id,
            title: g.title,
            status: g.status,
            tags: g.tags,
            created_at: rfc3339(g.created_at),
            updated_at: rfc3339(g.updated_at),
        }
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[derive(Debug, Deserialize)]
pub struct CreateGuideRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `tags: None` leaves existing tags untouched; `Some(vec![])` clears them.
#[derive(Debug, Deserialize)]
pub struct UpdateGuideRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct GuideListResponse {
    pub items: Vec<GuideSummary>,
    pub limit: i64,
    pub offset: i64,
}
