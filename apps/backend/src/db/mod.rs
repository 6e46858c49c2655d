//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

const HISTORY_COLUMNS: &str =
    "id, user_id, kind, input_text, input_hash, result, score, total, created_at";

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

    /// Create a pool that connects on first use.
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

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the user's token. The old token stops authenticating.
    pub async fn rotate_token(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token = $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        Ok(token)
    }

    // === History Repository ===

    pub async fn insert_history(&self, entry: &NewHistory) -> Result<DbHistory> {
        let (score, total) = entry.score().unzip();
        let sql = format!(
            r#"
            INSERT INTO study_history (user_id, kind, input_text, input_hash, result, score, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {HISTORY_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, DbHistory>(&sql)
            .bind(entry.user_id)
            .bind(entry.kind().as_str())
            .bind(&entry.input_text)
            .bind(&entry.input_hash)
            .bind(Json(&entry.result))
            .bind(score)
            .bind(total)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// List a user's history, newest first, optionally filtered by kind and start time.
    pub async fn list_history(
        &self,
        user_id: Uuid,
        kind: Option<StudyKind>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DbHistory>> {
        let sql = format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM study_history
            WHERE user_id = $1
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, DbHistory>(&sql)
            .bind(user_id)
            .bind(kind.map(|k| k.as_str()))
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_history(&self, user_id: Uuid, history_id: Uuid) -> Result<Option<DbHistory>> {
        let sql = format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM study_history
            WHERE user_id = $1 AND id = $2
            "#
        );

        let row = sqlx::query_as::<_, DbHistory>(&sql)
            .bind(user_id)
            .bind(history_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn delete_history(&self, user_id: Uuid, history_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM study_history
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(history_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of history entries per kind.
    pub async fn history_counts(&self, user_id: Uuid) -> Result<Vec<HistoryCount>> {
        let counts = sqlx::query_as::<_, HistoryCount>(
            r#"
            SELECT kind, COUNT(*) AS count
            FROM study_history
            WHERE user_id = $1
            GROUP BY kind
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Most recently saved quiz result.
    pub async fn latest_quiz(&self, user_id: Uuid) -> Result<Option<DbHistory>> {
        let sql = format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM study_history
            WHERE user_id = $1 AND kind = 'quiz'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, DbHistory>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}
