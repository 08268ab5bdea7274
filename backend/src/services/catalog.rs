//! Crop catalog service: find-or-create semantics for groups and varieties
//!
//! Booking intake and aggregation accept free-text group/variety names, so
//! resolution is defensive: a name with no catalog row vivifies one. Each
//! call is stateless; store-level uniqueness on name keeps concurrent
//! vivification from creating duplicate rows.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{CropGroup, CropVariety};
use shared::validation::{validate_group_name, validate_variety_name};

/// Catalog service for crop groups and varieties
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// A group with its varieties, for catalog listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct CropGroupWithVarieties {
    pub id: Uuid,
    pub name: String,
    pub varieties: Vec<CropVariety>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Find a crop group by name, creating it if absent.
    ///
    /// The upsert targets the unique name index, so concurrent calls for
    /// the same name resolve to the same row.
    pub async fn find_or_create_group(&self, name: &str) -> AppResult<CropGroup> {
        let name = name.trim();
        validate_group_name(name).map_err(|msg| AppError::Validation {
            field: "group_name".to_string(),
            message: msg.to_string(),
        })?;

        let group = sqlx::query_as::<_, CropGroupRow>(
            r#"
            INSERT INTO crop_groups (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET updated_at = NOW()
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        Ok(group.into())
    }

    /// Find a variety by name within a group, creating it if absent
    pub async fn find_or_create_variety(
        &self,
        group_id: Uuid,
        name: &str,
    ) -> AppResult<CropVariety> {
        let name = name.trim();
        validate_variety_name(name).map_err(|msg| AppError::Validation {
            field: "variety_name".to_string(),
            message: msg.to_string(),
        })?;

        let variety = sqlx::query_as::<_, CropVarietyRow>(
            r#"
            INSERT INTO crop_varieties (id, group_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, name) DO UPDATE SET updated_at = NOW()
            RETURNING id, group_id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        Ok(variety.into())
    }

    /// Get a group by id
    pub async fn get_group(&self, group_id: Uuid) -> AppResult<CropGroup> {
        let group = sqlx::query_as::<_, CropGroupRow>(
            "SELECT id, name, created_at, updated_at FROM crop_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop group".to_string()))?;

        Ok(group.into())
    }

    /// List all groups with their varieties, for display
    pub async fn list_groups_with_varieties(&self) -> AppResult<Vec<CropGroupWithVarieties>> {
        let groups = sqlx::query_as::<_, CropGroupRow>(
            "SELECT id, name, created_at, updated_at FROM crop_groups ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        let varieties = sqlx::query_as::<_, CropVarietyRow>(
            "SELECT id, group_id, name, created_at, updated_at FROM crop_varieties ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        let mut result: Vec<CropGroupWithVarieties> = groups
            .into_iter()
            .map(|g| CropGroupWithVarieties {
                id: g.id,
                name: g.name,
                varieties: Vec::new(),
            })
            .collect();

        for variety in varieties {
            if let Some(group) = result.iter_mut().find(|g| g.id == variety.group_id) {
                group.varieties.push(variety.into());
            }
        }

        Ok(result)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CropGroupRow {
    id: Uuid,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CropGroupRow> for CropGroup {
    fn from(row: CropGroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CropVarietyRow {
    id: Uuid,
    group_id: Uuid,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CropVarietyRow> for CropVariety {
    fn from(row: CropVarietyRow) -> Self {
        Self {
            id: row.id,
            group_id: row.group_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
