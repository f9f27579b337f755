//! PostgreSQL storage repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use sono_core::error::{AppError, ErrorKind};
use sono_core::result::AppResult;
use sono_core::types::{FilterField, PageResponse, SortProperty, StorageId, UserId};
use sono_entity::storage::{CreateStorage, Storage, StorageFilter};

use super::{StorageQuery, StorageRepository};

/// Storage repository backed by the `storages` table.
#[derive(Debug, Clone)]
pub struct PgStorageRepository {
    pool: PgPool,
}

impl PgStorageRepository {
    /// Create a new storage repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[StorageFilter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(filter.column());
        qb.push(" = ");
        match filter {
            StorageFilter::Id(id) => qb.push_bind(*id),
            StorageFilter::UserId(user_id) => qb.push_bind(*user_id),
        };
    }
}

#[async_trait]
impl StorageRepository for PgStorageRepository {
    async fn find_by_id(&self, id: &StorageId) -> AppResult<Option<Storage>> {
        sqlx::query_as::<_, Storage>("SELECT * FROM storages WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find storage", e))
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Option<Storage>> {
        sqlx::query_as::<_, Storage>("SELECT * FROM storages WHERE user_id = $1")
            .bind(*user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find storage by user", e)
            })
    }

    async fn find_page(&self, query: &StorageQuery) -> AppResult<PageResponse<Storage>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storages");
        push_filters(&mut count, &query.filters);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count storages", e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM storages");
        push_filters(&mut select, &query.filters);
        select
            .push(" ORDER BY ")
            .push(query.sort.field.column())
            .push(" ")
            .push(query.sort.direction.as_sql())
            .push(", id ASC LIMIT ")
            .push_bind(query.page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(query.page.sql_offset());

        let storages = select
            .build_query_as::<Storage>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list storages", e))?;

        Ok(PageResponse::new(
            storages,
            query.page.page,
            query.page.page_size,
            total as u64,
        ))
    }

    async fn create(&self, data: &CreateStorage) -> AppResult<Storage> {
        sqlx::query_as::<_, Storage>(
            "INSERT INTO storages (id, user_id, path) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("storages_user_id_key") =>
            {
                AppError::conflict(format!(
                    "Storage for user '{}' already exists",
                    data.user_id
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create storage", e),
        })
    }

    async fn delete(&self, id: &StorageId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM storages WHERE id = $1")
            .bind(*id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete storage", e))?;
        Ok(result.rows_affected() > 0)
    }
}
