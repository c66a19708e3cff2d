//! Per-student dashboard aggregate.

use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{Course, DbPool, UserResponse};
use crate::AppState;

use super::auth::CurrentUser;
use super::enrollments::enrolled_courses;
use super::error::ApiError;
use super::extract::Json;

/// Progress in a single enrolled course
#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub course: Course,
    /// Number of attendance records, regardless of status
    pub attendance_records: i64,
    /// Mean of recorded grades, 0 when there are none
    pub avg_grade: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: UserResponse,
    pub courses: Vec<Course>,
    pub progress: Vec<CourseProgress>,
}

/// Arithmetic mean; an empty slice averages to 0
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

async fn course_progress(
    pool: &DbPool,
    student_id: &str,
    course: Course,
) -> Result<CourseProgress, sqlx::Error> {
    let attendance: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM attendance WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(&course.id)
    .fetch_one(pool)
    .await?;

    let grades: Vec<(f64,)> =
        sqlx::query_as("SELECT grade FROM grades WHERE student_id = ? AND course_id = ?")
            .bind(student_id)
            .bind(&course.id)
            .fetch_all(pool)
            .await?;
    let grades: Vec<f64> = grades.into_iter().map(|(g,)| g).collect();

    Ok(CourseProgress {
        course,
        attendance_records: attendance.0,
        avg_grade: average(&grades),
    })
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Dashboard>, ApiError> {
    let courses = enrolled_courses(&state.db, &user.id).await?;

    let mut progress = Vec::with_capacity(courses.len());
    for course in courses.iter().cloned() {
        progress.push(course_progress(&state.db, &user.id, course).await?);
    }

    Ok(Json(Dashboard {
        user: user.0,
        courses,
        progress,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[80.0]), 80.0);
        assert_eq!(average(&[70.0, 90.0, 95.0]), 85.0);
    }
}
