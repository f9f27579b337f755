//! PostgreSQL resource repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use sono_core::error::{AppError, ErrorKind};
use sono_core::result::AppResult;
use sono_core::types::{FilterField, PageResponse, ParentRef, ResourceId, SortProperty, UserId};
use sono_entity::resource::{CreateResource, Resource, ResourceFilter};

use super::{ResourceQuery, ResourceRepository};

/// Unique index over live `(parent_id, name, is_directory)`.
const LIVE_NAME_CONSTRAINT: &str = "resources_live_name_key";

/// Resource repository backed by the `resources` table.
#[derive(Debug, Clone)]
pub struct PgResourceRepository {
    pool: PgPool,
}

impl PgResourceRepository {
    /// Create a new resource repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[ResourceFilter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(filter.column());
        qb.push(" = ");
        match filter {
            ResourceFilter::Id(id) => qb.push_bind(*id),
            ResourceFilter::ParentId(parent) => qb.push_bind(*parent),
            ResourceFilter::UserId(user_id) => qb.push_bind(*user_id),
            ResourceFilter::ContentHash(value)
            | ResourceFilter::Name(value)
            | ResourceFilter::Extension(value)
            | ResourceFilter::MediaType(value) => qb.push_bind(value.clone()),
            ResourceFilter::IsDirectory(flag) | ResourceFilter::IsTrashed(flag) => {
                qb.push_bind(*flag)
            }
            ResourceFilter::Version(version) => qb.push_bind(*version),
        };
    }
}

fn id_strings(ids: &[ResourceId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Map a write failure, turning a live-name collision into a conflict.
fn map_write_error(e: sqlx::Error, action: &str, name: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(LIVE_NAME_CONSTRAINT) => {
            AppError::conflict(format!("Resource '{name}' already exists in this location"))
        }
        _ => AppError::with_source(ErrorKind::Database, format!("Failed to {action} resource"), e),
    }
}

#[async_trait]
impl ResourceRepository for PgResourceRepository {
    async fn find_by_id(&self, id: &ResourceId) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find resource", e))
    }

    async fn find_by_ids(&self, ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ANY($1)")
            .bind(id_strings(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find resources", e))
    }

    async fn find_children(&self, parent_id: &ParentRef) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE parent_id = $1 ORDER BY name ASC, id ASC",
        )
        .bind(*parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(*user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list resources of user", e)
        })
    }

    async fn find_page(&self, query: &ResourceQuery) -> AppResult<PageResponse<Resource>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM resources");
        push_filters(&mut count, &query.filters);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count resources", e)
            })?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM resources");
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

        let resources = select
            .build_query_as::<Resource>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list resources", e)
            })?;

        Ok(PageResponse::new(
            resources,
            query.page.page,
            query.page.page_size,
            total as u64,
        ))
    }

    async fn create_many(&self, items: &[CreateResource]) -> AppResult<Vec<Resource>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut created = Vec::with_capacity(items.len());
        for data in items {
            let row = sqlx::query_as::<_, Resource>(
                "INSERT INTO resources (id, parent_id, user_id, content_hash, name, extension, \
                 media_type, path, bytes_count, is_directory, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
            )
            .bind(data.id)
            .bind(data.parent_id)
            .bind(data.user_id)
            .bind(&data.content_hash)
            .bind(&data.name)
            .bind(&data.extension)
            .bind(&data.media_type)
            .bind(&data.path)
            .bind(data.bytes_count)
            .bind(data.is_directory)
            .bind(&data.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "create", &data.name))?;
            created.push(row);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit resource batch", e)
        })?;

        debug!(count = created.len(), "Inserted resources");
        Ok(created)
    }

    async fn update_many(&self, items: &[Resource]) -> AppResult<Vec<Resource>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut updated = Vec::with_capacity(items.len());
        for resource in items {
            let row = sqlx::query_as::<_, Resource>(
                "UPDATE resources SET parent_id = $2, content_hash = $3, name = $4, \
                 extension = $5, media_type = $6, path = $7, bytes_count = $8, \
                 is_trashed = $9, description = $10, version = version + 1, \
                 last_updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
            )
            .bind(resource.id)
            .bind(resource.parent_id)
            .bind(&resource.content_hash)
            .bind(&resource.name)
            .bind(&resource.extension)
            .bind(&resource.media_type)
            .bind(&resource.path)
            .bind(resource.bytes_count)
            .bind(resource.is_trashed)
            .bind(&resource.description)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "update", &resource.name))?
            .ok_or_else(|| AppError::not_found(format!("Resource '{}' not found", resource.id)))?;
            updated.push(row);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit resource batch", e)
        })?;

        debug!(count = updated.len(), "Updated resources");
        Ok(updated)
    }

    async fn delete_many(&self, ids: &[ResourceId]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ANY($1)")
            .bind(id_strings(ids))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete resources", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM resources WHERE user_id = $1")
            .bind(*user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete resources of user", e)
            })?;
        Ok(result.rows_affected())
    }
}
