use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{now_timestamp, Attendance, AttendanceStatus, MarkAttendanceRequest};
use crate::AppState;

use super::auth::CurrentUser;
use super::courses::require_enrollment;
use super::error::ApiError;
use super::extract::Json;
use super::validation::require_uuid;

/// Record the caller's attendance for today's session of a course
pub async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<Attendance>), ApiError> {
    let status = match req.status.as_deref() {
        None => AttendanceStatus::default(),
        Some(s) => s
            .parse::<AttendanceStatus>()
            .map_err(|_| ApiError::validation_field("status", "Status must be present or absent"))?,
    };

    let enrollment = require_enrollment(&state.db, &user.id, &req.course_id).await?;

    let record = Attendance {
        id: Uuid::new_v4().to_string(),
        student_id: user.id.clone(),
        course_id: enrollment.course_id,
        date: now_timestamp(),
        status: status.to_string(),
    };

    sqlx::query(
        "INSERT INTO attendance (id, student_id, course_id, date, status) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.student_id)
    .bind(&record.course_id)
    .bind(&record.date)
    .bind(&record.status)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// The caller's attendance for one course, newest first
pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    let course_id = require_uuid(&course_id, "course_id")?;

    let records = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE student_id = ? AND course_id = ? ORDER BY date DESC, rowid DESC",
    )
    .bind(&user.id)
    .bind(&course_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(records))
}
