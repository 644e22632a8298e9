//! # Business Repository
//!
//! The tenant registry. This is the only repository that is not bound to a
//! business, since businesses are what everything else is bound to.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Business;

/// Repository for business (tenant) records.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    /// Creates a new BusinessRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Registers a new business.
    pub async fn create(&self, name: &str, now: DateTime<Utc>) -> DbResult<Business> {
        let business = Business {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
        };

        debug!(id = %business.id, name = %business.name, "Creating business");

        sqlx::query("INSERT INTO businesses (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&business.id)
            .bind(&business.name)
            .bind(business.created_at)
            .execute(&self.pool)
            .await?;

        Ok(business)
    }

    /// Gets a business by ID.
    pub async fn get(&self, id: &str) -> DbResult<Business> {
        sqlx::query_as::<_, Business>("SELECT id, name, created_at FROM businesses WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("business", id))
    }

    /// Lists all businesses, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Business>> {
        let rows = sqlx::query_as::<_, Business>(
            "SELECT id, name, created_at FROM businesses ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
