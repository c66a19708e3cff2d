//! Enrollment, attendance and grade records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Enrolled,
    Completed,
    Dropped,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enrolled => write!(f, "enrolled"),
            Self::Completed => write!(f, "completed"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub status: String,
    pub enrolled_at: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        Self::Present
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            _ => Err(format!("Unknown attendance status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub course_id: String,
    /// Kept as a string so an unknown value is a validation error, not a body rejection
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub grade: f64,
    pub label: Option<String>,
    pub graded_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub course_id: String,
    pub grade: f64,
    pub label: Option<String>,
}
