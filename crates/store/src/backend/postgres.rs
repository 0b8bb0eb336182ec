//! `PostgreSQL` JSONB backend.
//!
//! All collections share the `store.document` table. Queries are built at
//! runtime since document bodies are opaque JSONB.

use sqlx::PgPool;

use crate::document::{ChangeKind, Document};
use crate::error::RepositoryError;

/// Database backend over a connection pool.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

fn decode<D: Document>(body: serde_json::Value) -> Result<D, RepositoryError> {
    serde_json::from_value(body)
        .map_err(|e| RepositoryError::DataCorruption(format!("{}: {e}", D::COLLECTION)))
}

impl PostgresBackend {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn all<D: Document>(&self) -> Result<Vec<D>, RepositoryError> {
        let bodies: Vec<serde_json::Value> = sqlx::query_scalar(
            r"
            SELECT body
            FROM store.document
            WHERE collection = $1
            ORDER BY created_at, id
            ",
        )
        .bind(D::COLLECTION.as_str())
        .fetch_all(&self.pool)
        .await?;

        bodies.into_iter().map(decode).collect()
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, RepositoryError> {
        let body: Option<serde_json::Value> = sqlx::query_scalar(
            r"
            SELECT body
            FROM store.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(decode).transpose()
    }

    pub async fn insert<D: Document>(&self, doc: D) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO store.document (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(doc.id())
        .bind(serde_json::to_value(&doc)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "{} {} already exists",
                D::COLLECTION,
                doc.id()
            )));
        }
        Ok(())
    }

    pub async fn put<D: Document>(&self, doc: D) -> Result<ChangeKind, RepositoryError> {
        // xmax is zero only for freshly inserted rows.
        let inserted: bool = sqlx::query_scalar(
            r"
            INSERT INTO store.document (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = now()
            RETURNING (xmax = 0)
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(doc.id())
        .bind(serde_json::to_value(&doc)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            ChangeKind::Created
        } else {
            ChangeKind::Updated
        })
    }

    pub async fn update<D, F>(&self, id: &str, f: F) -> Result<D, RepositoryError>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<(), RepositoryError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let body: Option<serde_json::Value> = sqlx::query_scalar(
            r"
            SELECT body
            FROM store.document
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut doc: D = decode(body.ok_or(RepositoryError::NotFound)?)?;
        f(&mut doc)?;
        if doc.id() != id {
            return Err(RepositoryError::Validation("document id cannot change".into()));
        }

        sqlx::query(
            r"
            UPDATE store.document
            SET body = $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(id)
        .bind(serde_json::to_value(&doc)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(doc)
    }

    pub async fn delete<D: Document>(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM store.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(D::COLLECTION.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn replace_all<D: Document>(&self, docs: Vec<D>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM store.document WHERE collection = $1")
            .bind(D::COLLECTION.as_str())
            .execute(&mut *tx)
            .await?;

        for doc in &docs {
            sqlx::query(
                r"
                INSERT INTO store.document (collection, id, body)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(D::COLLECTION.as_str())
            .bind(doc.id())
            .bind(serde_json::to_value(doc)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
