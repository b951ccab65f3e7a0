//! Guide persistence and tag associations.
//!
//! Every multi-statement write runs in one transaction that is rolled back on
//! drop, so a failure never leaves a guide with a half-replaced tag set.
//! Transactions open with a write to the guide row; SQLite then holds the
//! write lock for the rest of the unit, which serializes a tag replacement
//! against a concurrent delete of the same guide.

use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashSet;
use tracing::debug;

use super::{DbPool, Guide, GuideRow, GuideStatus, Tag};

/// Maximum length of a tag name, in characters
pub const MAX_TAG_LEN: usize = 50;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

fn normalize_tag(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let capped: String = lowered.chars().take(MAX_TAG_LEN).collect();
    capped.trim_end().to_string()
}

/// Lower-case, trim, cap and de-duplicate tag names, keeping first-seen order.
/// Blank entries are dropped.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    let mut out = Vec::with_capacity(tags.len());

    for tag in tags {
        let name = normalize_tag(tag.as_ref());
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }
        out.push(name);
    }
    out
}

/// Escape LIKE wildcards so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Filters for listing published guides. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl ListQuery {
    /// Build a query from raw request values. Blank filters become `None`,
    /// the limit is clamped to 1..=100 (default 20) and the offset to >= 0.
    pub fn new(tag: Option<&str>, search: Option<&str>, limit: Option<i64>, offset: Option<i64>) -> Self {
        let tag = tag.map(normalize_tag).filter(|t| !t.is_empty());
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let limit = match limit {
            Some(l) if l > 0 => l.min(MAX_LIST_LIMIT),
            _ => DEFAULT_LIST_LIMIT,
        };
        let offset = offset.unwrap_or(0).max(0);

        Self {
            tag,
            search,
            limit,
            offset,
        }
    }
}

async fn upsert_tags(conn: &mut SqliteConnection, names: &[String]) -> sqlx::Result<()> {
    for name in names {
        sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(name)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Full replace: drop every association, then link the given (already
/// normalized) names.
async fn replace_guide_tags(
    conn: &mut SqliteConnection,
    guide_id: &str,
    names: &[String],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM guide_tags WHERE guide_id = ?")
        .bind(guide_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        sqlx::query(
            "INSERT OR IGNORE INTO guide_tags (guide_id, tag_id) SELECT ?, id FROM tags WHERE name = ?",
        )
        .bind(guide_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct GuideStore {
    db: DbPool,
}

impl GuideStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Insert a draft guide together with its tags. Returns the new id.
    pub async fn create_guide(
        &self,
        creator_id: &str,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> sqlx::Result<String> {
        let names = normalize_tags(tags);
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO guides (id, creator_id, title, content, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(creator_id)
        .bind(title)
        .bind(content)
        .bind(GuideStatus::Draft)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if !names.is_empty() {
            upsert_tags(&mut tx, &names).await?;
            replace_guide_tags(&mut tx, &id, &names).await?;
        }

        tx.commit().await?;

        debug!(guide_id = %id, tags = names.len(), "Guide created");
        Ok(id)
    }

    /// Update title and content, and replace the tag set when `tags` is
    /// given. Fails with `RowNotFound` if the guide does not exist.
    pub async fn update_guide(
        &self,
        guide_id: &str,
        title: &str,
        content: &str,
        tags: Option<&[String]>,
    ) -> sqlx::Result<()> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "UPDATE guides SET title = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(Utc::now())
        .bind(guide_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        if let Some(tags) = tags {
            let names = normalize_tags(tags);
            upsert_tags(&mut tx, &names).await?;
            replace_guide_tags(&mut tx, guide_id, &names).await?;
        }

        tx.commit().await
    }

    /// Re-applying the current status is allowed and refreshes `updated_at`.
    pub async fn set_status(&self, guide_id: &str, status: GuideStatus) -> sqlx::Result<()> {
        let result = sqlx::query("UPDATE guides SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(guide_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Delete a guide and its tag associations atomically.
    pub async fn delete_guide(&self, guide_id: &str) -> sqlx::Result<()> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query("DELETE FROM guides WHERE id = ?")
            .bind(guide_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        // Covered by ON DELETE CASCADE too; explicit in case foreign keys are off
        sqlx::query("DELETE FROM guide_tags WHERE guide_id = ?")
            .bind(guide_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    pub async fn get_guide(&self, guide_id: &str) -> sqlx::Result<Option<Guide>> {
        let row: Option<GuideRow> = sqlx::query_as(
            "SELECT id, creator_id, title, content, status, created_at, updated_at FROM guides WHERE id = ?",
        )
        .bind(guide_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let tags = self.load_tags(&row.id).await?;
                Ok(Some(Guide::from_row(row, tags)))
            }
            None => Ok(None),
        }
    }

    /// Published guides only, newest first.
    pub async fn list_published(&self, query: &ListQuery) -> sqlx::Result<Vec<Guide>> {
        let search = query.search.as_deref().map(escape_like);

        let rows: Vec<GuideRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.creator_id, g.title, g.content, g.status, g.created_at, g.updated_at
            FROM guides g
            WHERE g.status = 'published'
              AND (? IS NULL OR g.title LIKE '%' || ? || '%' ESCAPE '\')
              AND (
                ? IS NULL
                OR EXISTS (
                  SELECT 1
                  FROM guide_tags gt
                  JOIN tags t ON t.id = gt.tag_id
                  WHERE gt.guide_id = g.id
                    AND t.name = ?
                )
              )
            ORDER BY g.created_at DESC, g.rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&search)
        .bind(&search)
        .bind(&query.tag)
        .bind(&query.tag)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.db)
        .await?;

        let mut guides = Vec::with_capacity(rows.len());
        for row in rows {
            let tags = self.load_tags(&row.id).await?;
            guides.push(Guide::from_row(row, tags));
        }
        Ok(guides)
    }

    async fn load_tags(&self, guide_id: &str) -> sqlx::Result<Vec<Tag>> {
        sqlx::query_as(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN guide_tags gt ON gt.tag_id = t.id
            WHERE gt.guide_id = ?
            ORDER BY t.name ASC
            "#,
        )
        .bind(guide_id)
        .fetch_all(&self.db)
        .await
    }
}
