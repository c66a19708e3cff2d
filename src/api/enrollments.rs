//! Enrollment endpoints.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{now_timestamp, Course, DbPool, EnrollRequest, Enrollment, EnrollmentStatus};
use crate::AppState;

use super::auth::CurrentUser;
use super::courses::{find_course, find_enrollment};
use super::error::ApiError;
use super::extract::Json;

/// Courses a student is enrolled in, in enrollment order
pub(super) async fn enrolled_courses(
    pool: &DbPool,
    student_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT c.* FROM courses c
        INNER JOIN enrollments e ON e.course_id = c.id
        WHERE e.student_id = ?
        ORDER BY e.enrolled_at ASC, e.rowid ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Enroll the caller in a course.
///
/// Enrolling twice returns the existing record with 200 instead of 201.
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let course = find_course(&state.db, &req.course_id).await?;

    if let Some(existing) = find_enrollment(&state.db, &user.id, &course.id).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let enrollment = Enrollment {
        id: Uuid::new_v4().to_string(),
        student_id: user.id.clone(),
        course_id: course.id,
        status: EnrollmentStatus::Enrolled.to_string(),
        enrolled_at: now_timestamp(),
    };

    sqlx::query(
        "INSERT INTO enrollments (id, student_id, course_id, status, enrolled_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&enrollment.id)
    .bind(&enrollment.student_id)
    .bind(&enrollment.course_id)
    .bind(&enrollment.status)
    .bind(&enrollment.enrolled_at)
    .execute(&state.db)
    .await?;

    tracing::info!(student_id = %user.id, course_id = %enrollment.course_id, "Enrolled student");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// List the caller's courses
pub async fn my_courses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(enrolled_courses(&state.db, &user.id).await?))
}
