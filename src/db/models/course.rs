//! Course models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub capacity: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    #[serde(default = "default_capacity")]
    pub capacity: Option<i64>,
}

pub fn default_capacity() -> Option<i64> {
    Some(100)
}
