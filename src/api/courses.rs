//! Course catalogue endpoints.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{now_timestamp, Course, CreateCourseRequest, DbPool, Enrollment, Role};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::Json;
use super::validation::{
    require_uuid, validate_capacity, validate_course_code, validate_required_text,
};

fn validate_create_request(req: &CreateCourseRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("code", validate_course_code(&req.code));
    errors.check("title", validate_required_text(&req.title, "Title", 200));
    errors.check("capacity", validate_capacity(req.capacity));
    errors.finish()
}

/// Load a course by id, validating the id first
pub(super) async fn find_course(pool: &DbPool, course_id: &str) -> Result<Course, ApiError> {
    let course_id = require_uuid(course_id, "course_id")?;

    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(&course_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))
}

pub(super) async fn find_enrollment(
    pool: &DbPool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

/// Ensure the course exists (404) and the caller is enrolled in it (400)
pub(super) async fn require_enrollment(
    pool: &DbPool,
    student_id: &str,
    course_id: &str,
) -> Result<Enrollment, ApiError> {
    let course = find_course(pool, course_id).await?;
    find_enrollment(pool, student_id, &course.id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Not enrolled in the course"))
}

/// Create a course (admin only)
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    user.require_role(Role::Admin)?;
    validate_create_request(&req)?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM courses WHERE code = ?")
        .bind(&req.code)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Course code exists"));
    }

    let now = now_timestamp();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        code: req.code,
        title: req.title,
        description: req.description,
        instructor: req.instructor,
        capacity: req.capacity,
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO courses (id, code, title, description, instructor, capacity, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&course.id)
    .bind(&course.code)
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.instructor)
    .bind(course.capacity)
    .bind(&course.created_at)
    .bind(&course.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!(course_id = %course.id, code = %course.code, created_by = %user.id, "Created course");

    Ok((StatusCode::CREATED, Json(course)))
}

/// List every course, newest first
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses ORDER BY created_at DESC, rowid DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(courses))
}
