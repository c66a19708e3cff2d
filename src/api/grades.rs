use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{now_timestamp, CreateGradeRequest, Grade};
use crate::AppState;

use super::auth::CurrentUser;
use super::courses::require_enrollment;
use super::error::ApiError;
use super::extract::Json;
use super::validation::{require_uuid, validate_grade};

/// Record a grade for the caller in a course they are enrolled in
pub async fn add_grade(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateGradeRequest>,
) -> Result<(StatusCode, Json<Grade>), ApiError> {
    validate_grade(req.grade).map_err(|e| ApiError::validation_field("grade", e))?;
    let enrollment = require_enrollment(&state.db, &user.id, &req.course_id).await?;

    let grade = Grade {
        id: Uuid::new_v4().to_string(),
        student_id: user.id.clone(),
        course_id: enrollment.course_id,
        grade: req.grade,
        label: req.label,
        graded_at: now_timestamp(),
    };

    sqlx::query(
        "INSERT INTO grades (id, student_id, course_id, grade, label, graded_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&grade.id)
    .bind(&grade.student_id)
    .bind(&grade.course_id)
    .bind(grade.grade)
    .bind(&grade.label)
    .bind(&grade.graded_at)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(grade)))
}

/// The caller's grades for one course, newest first
pub async fn list_grades(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Grade>>, ApiError> {
    let course_id = require_uuid(&course_id, "course_id")?;

    let grades = sqlx::query_as::<_, Grade>(
        "SELECT * FROM grades WHERE student_id = ? AND course_id = ? ORDER BY graded_at DESC, rowid DESC",
    )
    .bind(&user.id)
    .bind(&course_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(grades))
}
