//! Farmer reference data
//!
//! Farmer CRUD lives in the registration workflow; the scheduling engine
//! only reads these rows to stamp contributions and resolve display names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farmer {
    pub id: Uuid,
    pub name: String,
    /// Unique human-assigned registration code (e.g. "FRM-0042")
    pub registration_code: String,
    pub phone: Option<String>,
    pub village: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
