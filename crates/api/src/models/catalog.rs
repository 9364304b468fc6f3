//! Category and plant domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use succulent_shop_core::{CategoryId, Color, PlantId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    pub category_id: CategoryId,
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub bloom_color: Option<Color>,
    pub care_instructions: Option<String>,
    /// Stored file name, served under `/api/v1/plants/photos/{photo}`.
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
