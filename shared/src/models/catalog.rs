//! Crop catalog models
//!
//! Groups and varieties are auto-vivified by name when aggregation or
//! booking intake encounters a free-text entry with no catalog row.
//! Store-level uniqueness on name prevents duplicate rows under
//! concurrent find-or-create calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crop group (e.g. "Vegetables", "Flowers")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropGroup {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A crop variety; belongs to exactly one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropVariety {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
