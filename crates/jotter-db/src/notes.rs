//! Note record store backed by PostgreSQL.
//!
//! Attachments are persisted as a JSONB array in wire shape, so the column
//! can be handed to clients without re-encoding. Every mutation is scoped
//! by `id AND user_id`; zero rows matched surfaces as
//! [`Error::NotFoundOrForbidden`].

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::warn;
use uuid::Uuid;

use jotter_core::{Attachment, Error, NewNote, Note, NoteChange, NoteStore, NoteType, Result};

/// PostgreSQL implementation of [`NoteStore`].
pub struct PgNoteStore {
    pool: Pool<Postgres>,
}

impl PgNoteStore {
    /// Create a new PgNoteStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a [`Note`].
///
/// A row that fails to decode cleanly is repaired rather than rejected:
/// unreadable attachment JSON becomes an empty list and an unknown type
/// string becomes `text`, each with a warning. The next save rewrites both
/// from scratch, so listing stays available even after a bad manual edit.
fn map_note_row(row: PgRow) -> Note {
    let id: i64 = row.get("id");

    let raw: serde_json::Value = row.get("attachments");
    let attachments: Vec<Attachment> = match serde_json::from_value(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(
                subsystem = "database",
                component = "notes",
                note_id = id,
                error = %e,
                "Stored attachments column is not an attachment array; treating as empty"
            );
            Vec::new()
        }
    };

    let stored_type: String = row.get("type");
    let note_type = stored_type.parse().unwrap_or_else(|_| {
        warn!(
            subsystem = "database",
            component = "notes",
            note_id = id,
            stored_type = %stored_type,
            "Stored note type is unknown; treating as text"
        );
        NoteType::Text
    });

    Note {
        id,
        title: row.get("title"),
        content: row.get("content"),
        attachments,
        note_type,
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let attachments = serde_json::to_value(&note.attachments)?;

        let row = sqlx::query(
            "INSERT INTO note (user_id, title, content, attachments, type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, title, content, attachments, type, created_at, updated_at",
        )
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&attachments)
        .bind(note.note_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(map_note_row(row))
    }

    async fn update(&self, id: i64, user_id: Uuid, change: NoteChange) -> Result<Note> {
        let attachments = serde_json::to_value(&change.attachments)?;

        let row = sqlx::query(
            "UPDATE note
             SET title = $1, content = $2, attachments = $3, type = $4, updated_at = now()
             WHERE id = $5 AND user_id = $6
             RETURNING id, user_id, title, content, attachments, type, created_at, updated_at",
        )
        .bind(&change.title)
        .bind(&change.content)
        .bind(&attachments)
        .bind(change.note_type.as_str())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFoundOrForbidden)?;

        Ok(map_note_row(row))
    }

    async fn delete(&self, id: i64, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFoundOrForbidden);
        }
        Ok(())
    }

    async fn get(&self, id: i64, user_id: Uuid) -> Result<Note> {
        let row = sqlx::query(
            "SELECT id, user_id, title, content, attachments, type, created_at, updated_at
             FROM note
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFoundOrForbidden)?;

        Ok(map_note_row(row))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, content, attachments, type, created_at, updated_at
             FROM note
             WHERE user_id = $1
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_note_row).collect())
    }
}
