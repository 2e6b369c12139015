use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::cosmetics::dtos::CosmeticInput;
use crate::features::cosmetics::models::Cosmetic;

/// Persistence for catalog cosmetics
///
/// Every write is its own unit of work; there is no separate save step.
#[async_trait]
pub trait CosmeticRepository: Send + Sync {
    /// All cosmetics, in the store's default order
    async fn list(&self) -> Result<Vec<Cosmetic>>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Cosmetic>>;

    /// Insert a new cosmetic; the store assigns the id
    async fn insert(&self, input: &CosmeticInput, picture: &str) -> Result<Cosmetic>;

    /// Update the descriptive fields of a cosmetic, leaving its picture alone
    ///
    /// Fails with [`AppError::Concurrency`] when no row was updated.
    async fn update(&self, id: i32, input: &CosmeticInput) -> Result<Cosmetic>;

    async fn delete(&self, id: i32) -> Result<()>;

    async fn exists(&self, id: i32) -> Result<bool>;
}

/// Postgres-backed repository
pub struct PgCosmeticRepository {
    pool: PgPool,
}

impl PgCosmeticRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CosmeticRepository for PgCosmeticRepository {
    async fn list(&self) -> Result<Vec<Cosmetic>> {
        sqlx::query_as::<_, Cosmetic>(
            r#"
            SELECT id, name, brand, price, description, picture, created_at, updated_at
            FROM cosmetics
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list cosmetics: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Cosmetic>> {
        sqlx::query_as::<_, Cosmetic>(
            r#"
            SELECT id, name, brand, price, description, picture, created_at, updated_at
            FROM cosmetics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get cosmetic by id: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn insert(&self, input: &CosmeticInput, picture: &str) -> Result<Cosmetic> {
        sqlx::query_as::<_, Cosmetic>(
            r#"
            INSERT INTO cosmetics (name, brand, price, description, picture)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, brand, price, description, picture, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.brand)
        .bind(input.price)
        .bind(&input.description)
        .bind(picture)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert cosmetic: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn update(&self, id: i32, input: &CosmeticInput) -> Result<Cosmetic> {
        let updated = sqlx::query_as::<_, Cosmetic>(
            r#"
            UPDATE cosmetics
            SET name = $2, brand = $3, price = $4, description = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, brand, price, description, picture, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.brand)
        .bind(input.price)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update cosmetic: {:?}", e);
            AppError::Database(e)
        })?;

        updated.ok_or_else(|| {
            AppError::Concurrency(format!("Update of cosmetic {} affected no rows", id))
        })
    }

    async fn delete(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM cosmetics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete cosmetic: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn exists(&self, id: i32) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cosmetics WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check cosmetic existence: {:?}", e);
                AppError::Database(e)
            })
    }
}
