//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

const ENTRY_COLUMNS: &str = r#"
    id, kind, headword, pronunciation, created_at,
    definition_data, definition_match_data, poem_data,
    enabled_question_types, test_status, passed_after_retries, updated_at
"#;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    // === Entry Repository ===

    /// All entries, newest first
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, DbEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(DbEntry::to_entry).collect()
    }

    pub async fn get_entry(&self, id: Uuid) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, DbEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(DbEntry::to_entry).transpose()
    }

    /// Insert a new entry
    pub async fn insert_entry(&self, entry: &Entry) -> Result<Entry> {
        let row = sqlx::query_as::<_, DbEntry>(&format!(
            r#"
            INSERT INTO entries (
                id, kind, headword, pronunciation, created_at,
                definition_data, definition_match_data, poem_data,
                enabled_question_types, test_status, passed_after_retries
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(entry.kind().as_str())
        .bind(&entry.headword)
        .bind(&entry.pronunciation)
        .bind(entry.created_at)
        .bind(entry.definition_data().map(Json))
        .bind(entry.definition_match_data().map(Json))
        .bind(entry.poem_data().map(Json))
        .bind(question_type_names(entry))
        .bind(entry.test_status.as_str())
        .bind(entry.passed_after_retries)
        .fetch_one(&self.pool)
        .await?;

        row.to_entry()
    }

    /// Insert or replace entries by id, in one transaction
    pub async fn upsert_entries(&self, entries: &[Entry]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO entries (
                    id, kind, headword, pronunciation, created_at,
                    definition_data, definition_match_data, poem_data,
                    enabled_question_types, test_status, passed_after_retries
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (id) DO UPDATE SET
                    kind = EXCLUDED.kind,
                    headword = EXCLUDED.headword,
                    pronunciation = EXCLUDED.pronunciation,
                    created_at = EXCLUDED.created_at,
                    definition_data = EXCLUDED.definition_data,
                    definition_match_data = EXCLUDED.definition_match_data,
                    poem_data = EXCLUDED.poem_data,
                    enabled_question_types = EXCLUDED.enabled_question_types,
                    test_status = EXCLUDED.test_status,
                    passed_after_retries = EXCLUDED.passed_after_retries,
                    updated_at = NOW()
                "#,
            )
            .bind(entry.id)
            .bind(entry.kind().as_str())
            .bind(&entry.headword)
            .bind(&entry.pronunciation)
            .bind(entry.created_at)
            .bind(entry.definition_data().map(Json))
            .bind(entry.definition_match_data().map(Json))
            .bind(entry.poem_data().map(Json))
            .bind(question_type_names(entry))
            .bind(entry.test_status.as_str())
            .bind(entry.passed_after_retries)
            .execute(&mut *tx)
            .await?;

            affected += result.rows_affected();
        }

        tx.commit().await?;
        Ok(affected)
    }

    /// Overwrite every mutable column of an existing entry
    pub async fn update_entry(&self, entry: &Entry) -> Result<Entry> {
        let row = sqlx::query_as::<_, DbEntry>(&format!(
            r#"
            UPDATE entries
            SET headword = $2,
                pronunciation = $3,
                definition_data = $4,
                definition_match_data = $5,
                poem_data = $6,
                enabled_question_types = $7,
                test_status = $8,
                passed_after_retries = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(&entry.headword)
        .bind(&entry.pronunciation)
        .bind(entry.definition_data().map(Json))
        .bind(entry.definition_match_data().map(Json))
        .bind(entry.poem_data().map(Json))
        .bind(question_type_names(entry))
        .bind(entry.test_status.as_str())
        .bind(entry.passed_after_retries)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| ApiError::NotFound(format!("entry {}", entry.id)))?
            .to_entry()
    }

    /// Delete one entry, returning whether it existed
    pub async fn delete_entry(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the test status of many entries at once.
    ///
    /// Moving a failed entry to passed sets `passed_after_retries`, the same
    /// rule as [`Entry::mark`].
    pub async fn update_status_batch(&self, ids: &[Uuid], status: TestStatus) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE entries
            SET passed_after_retries = passed_after_retries
                    OR (test_status = 'FAILED' AND $2 = 'PASSED'),
                test_status = $2,
                updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Remove every entry
    pub async fn delete_all_entries(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
